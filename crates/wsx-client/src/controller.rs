//! Session controller: binds a session to a view.
//!
//! Attach wires surface input/resize events into the transport and inbound
//! frames back into the surface, and keeps the remote geometry synchronized.
//! Detach removes that wiring and nothing else; the surface and transport
//! stay alive in the registry for the next attach.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use wsx_core::Frame;

use crate::session::Session;
use crate::surface::{DisplaySurface, SurfaceEvent};
use crate::transport::TransportStatus;

/// View-side binding between a session's surface and its transport.
pub struct SessionController {
    session: Arc<Session>,
    pump: Option<JoinHandle<()>>,
}

impl SessionController {
    /// Bind to `session` for the lifetime of a view.
    ///
    /// Connection establishment is triggered only when the transport is
    /// `Idle`; a session that is already connecting, open, or waiting out a
    /// retry is reused as-is. Whenever the transport is (or becomes) open,
    /// the surface's current geometry is sent so the remote shell matches
    /// the viewport.
    pub async fn attach(session: Arc<Session>) -> Self {
        let transport = session.transport();
        let mut status_rx = transport.watch_status();
        let mut frames = transport.subscribe();
        let surface = session.surface();

        let mut events = surface.lock().await.events();

        match transport.status() {
            TransportStatus::Idle => transport.connect(),
            TransportStatus::Open => {
                // Re-homed into a new viewport: resync geometry immediately.
                let (cols, rows) = surface.lock().await.size();
                transport.send(Frame::Resize { cols, rows });
            }
            _ => {}
        }

        let pump_session = session.clone();
        let pump = tokio::spawn(async move {
            let transport = pump_session.transport();
            let surface = pump_session.surface();
            loop {
                tokio::select! {
                    ev = events.recv() => match ev {
                        Some(SurfaceEvent::Input(data)) => {
                            transport.send(Frame::Input { data });
                        }
                        Some(SurfaceEvent::Resize { cols, rows }) => {
                            transport.send(Frame::Resize { cols, rows });
                        }
                        // Surface gone, or a newer attach superseded us.
                        None => break,
                    },
                    frame = frames.recv() => match frame {
                        Ok(Frame::Output { data }) => {
                            surface.lock().await.write(data.as_bytes());
                        }
                        Ok(Frame::Error { data }) => {
                            // Application-level error: inline and visually
                            // distinct, not a transport failure.
                            let text = format!("\r\n\x1b[31mError: {data}\x1b[0m\r\n");
                            surface.lock().await.write(text.as_bytes());
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            trace!(skipped, "dropped inbound frames while lagging");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    changed = status_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = *status_rx.borrow_and_update();
                        if status.is_open() {
                            let (cols, rows) = surface.lock().await.size();
                            transport.send(Frame::Resize { cols, rows });
                        }
                    }
                }
            }
        });

        Self {
            session,
            pump: Some(pump),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Explicit user recovery: restart the connection with a fresh attempt
    /// budget.
    pub fn reconnect(&self) {
        self.session.transport().reconnect();
    }

    /// Remove the input/output wiring. The session, its surface, and its
    /// transport remain owned by the registry.
    pub fn detach(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            debug!(workspace_id = %self.session.workspace_id(), "view detached");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{session_fixture, settle, FakeConnector, RecordingSurface};
    use crate::token::TokenStore;
    use crate::transport::{RetryPolicy, Transport, TransportConfig};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn attach_connects_and_shuttles_bytes() {
        let connector = FakeConnector::new();
        let (session, surface) = session_fixture("ws-1", &connector);
        let session = Arc::new(session);

        let _controller = SessionController::attach(session.clone()).await;
        settle().await;
        assert_eq!(session.transport().status(), TransportStatus::Connecting);

        connector.probe(0).opened().await;
        settle().await;
        assert_eq!(session.transport().status(), TransportStatus::Open);
        // Geometry is announced as soon as the socket opens.
        assert_eq!(
            connector.probe(0).sent(),
            vec![r#"{"type":"resize","cols":80,"rows":24}"#.to_string()]
        );

        surface.input("ls\n");
        settle().await;
        assert_eq!(
            connector.probe(0).sent().last().unwrap(),
            r#"{"type":"input","data":"ls\n"}"#
        );

        connector
            .probe(0)
            .message(r#"{"type":"output","data":"file1\n"}"#)
            .await;
        settle().await;
        assert!(surface.written().contains("file1"));
    }

    #[tokio::test(start_paused = true)]
    async fn detach_preserves_state_and_reattach_reuses_the_socket() {
        let connector = FakeConnector::new();
        let (session, surface) = session_fixture("ws-1", &connector);
        let session = Arc::new(session);

        let mut controller = SessionController::attach(session.clone()).await;
        settle().await;
        connector.probe(0).opened().await;
        settle().await;
        connector
            .probe(0)
            .message(r#"{"type":"output","data":"hello\n"}"#)
            .await;
        settle().await;
        assert!(surface.written().contains("hello"));

        controller.detach();
        settle().await;

        // Output while detached is not written anywhere.
        connector
            .probe(0)
            .message(r#"{"type":"output","data":"missed\n"}"#)
            .await;
        settle().await;
        assert!(!surface.written().contains("missed"));

        let _controller = SessionController::attach(session.clone()).await;
        settle().await;

        // Same socket, no new connection; prior content intact; geometry
        // resynced for the new viewport.
        assert_eq!(connector.open_count(), 1);
        assert!(surface.written().contains("hello"));
        assert_eq!(
            connector.probe(0).sent().last().unwrap(),
            r#"{"type":"resize","cols":80,"rows":24}"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn error_frames_render_inline_and_distinct() {
        let connector = FakeConnector::new();
        let (session, surface) = session_fixture("ws-1", &connector);
        let session = Arc::new(session);

        let _controller = SessionController::attach(session.clone()).await;
        settle().await;
        connector.probe(0).opened().await;
        settle().await;

        connector
            .probe(0)
            .message(r#"{"type":"error","data":"container stopped"}"#)
            .await;
        settle().await;
        assert!(surface
            .written()
            .contains("\x1b[31mError: container stopped\x1b[0m"));
        // Not a transport failure.
        assert_eq!(session.transport().status(), TransportStatus::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn resize_while_connecting_is_dropped() {
        let connector = FakeConnector::new();
        let (session, surface) = session_fixture("ws-1", &connector);
        let session = Arc::new(session);

        let _controller = SessionController::attach(session.clone()).await;
        settle().await;
        assert_eq!(session.transport().status(), TransportStatus::Connecting);

        surface.resize(132, 43);
        settle().await;
        assert!(connector.probe(0).sent().is_empty());

        // The open handshake resends the current geometry, so nothing is
        // lost.
        connector.probe(0).opened().await;
        settle().await;
        assert_eq!(
            connector.probe(0).sent(),
            vec![r#"{"type":"resize","cols":80,"rows":24}"#.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_revives_an_exhausted_transport() {
        let connector = FakeConnector::new();
        let (surface, _probe) = RecordingSurface::new(80, 24);
        let transport = Transport::spawn(
            TransportConfig {
                url: "ws://test/ws/terminal/ws-1".into(),
                tokens: TokenStore::with_token("secret"),
                policy: RetryPolicy {
                    base_delay: Duration::from_millis(10),
                    cap_delay: Duration::from_millis(20),
                    max_attempts: 1,
                },
            },
            Arc::new(connector.clone()),
        );
        let session = Arc::new(Session::new("ws-1", surface, transport));

        let controller = SessionController::attach(session.clone()).await;
        settle().await;
        connector.probe(0).opened().await;
        settle().await;

        connector.probe(0).closed().await;
        settle().await;
        tokio::time::advance(Duration::from_millis(10)).await;
        settle().await;
        connector.probe(1).closed().await;
        settle().await;
        assert_eq!(
            session.transport().status(),
            TransportStatus::Closed { exhausted: true }
        );

        controller.reconnect();
        settle().await;
        assert_eq!(session.transport().status(), TransportStatus::Connecting);
        assert_eq!(connector.open_count(), 3);
    }
}
