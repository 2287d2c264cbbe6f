//! `wsx terminal <id>` — interactive workspace shell.
//!
//! Builds the session through the registry, attaches the local terminal as
//! its display surface, and stays in raw mode until the user detaches with
//! Ctrl+]. Transport status changes are surfaced as `[wsx]` lines; once
//! automatic retries are exhausted, Ctrl+R asks for an explicit reconnect.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use wsx_client::{
    RetryPolicy, Session, SessionController, SessionRegistry, Transport, TransportConfig,
    TransportStatus, WebSocketConnector, WorkspaceApi,
};

use super::list::status_label;
use crate::term::{RawModeGuard, TermSignal, TermSurface};

pub async fn run(api: &WorkspaceApi, id: &str) -> Result<()> {
    if !api.tokens().is_set() {
        bail!("not logged in — run `wsx login` first");
    }

    let ws = api.get(id).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    if !ws.terminal_ready() {
        bail!(
            "workspace '{}' is {} — a terminal needs a running workspace",
            ws.id,
            status_label(ws.status)
        );
    }

    let registry = SessionRegistry::new();
    let (surface, mut signals) = TermSurface::spawn();
    let url = api.terminal_url(id);
    let tokens = api.tokens().clone();
    let session = registry
        .get_or_create(id, move || {
            let transport = Transport::spawn(
                TransportConfig {
                    url,
                    tokens,
                    policy: RetryPolicy::default(),
                },
                Arc::new(WebSocketConnector),
            );
            Session::new(id, surface, transport)
        })
        .await;

    let mut status_rx = session.transport().watch_status();
    let guard = RawModeGuard::enter()?;
    let mut controller = SessionController::attach(session.clone()).await;

    eprint!("\r\n[wsx] attached to {} — Ctrl+] to detach\r\n", ws.name);

    loop {
        tokio::select! {
            sig = signals.recv() => match sig {
                Some(TermSignal::Detach) | None => break,
                Some(TermSignal::Reconnect) => {
                    if matches!(
                        *status_rx.borrow(),
                        TransportStatus::Closed { exhausted: true }
                    ) {
                        info!("manual reconnect");
                        controller.reconnect();
                    }
                }
            },
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                match *status_rx.borrow_and_update() {
                    TransportStatus::Connecting => {
                        eprint!("\r\n[wsx] connecting...\r\n");
                    }
                    TransportStatus::Open => {
                        eprint!("\r\n[wsx] connected\r\n");
                    }
                    TransportStatus::Closed { exhausted: false } => {
                        eprint!("\r\n[wsx] disconnected — retrying\r\n");
                    }
                    TransportStatus::Closed { exhausted: true } => {
                        eprint!(
                            "\r\n[wsx] connection lost — Ctrl+R to reconnect, Ctrl+] to quit\r\n"
                        );
                    }
                    TransportStatus::Idle => {}
                }
            }
        }
    }

    controller.detach();
    // A single-shot process: leaving the view is application shutdown, so
    // the session is torn down rather than cached.
    registry.remove(id).await;

    drop(guard);
    eprintln!("\nConnection to {} closed.", ws.name);
    Ok(())
}
