//! Resilient terminal transport.
//!
//! Each session owns one `Transport`, and the transport owns at most one
//! socket at a time. Socket events drive the state machine
//! `Idle → Connecting → Open → Closed`, with bounded exponential-backoff
//! reconnects out of `Closed`. Every failure is absorbed here and published
//! as a status observation; nothing escapes to the caller as an error.
//!
//! The machine runs as a spawned actor task selecting over commands, socket
//! events, and the retry timer, so all transitions are processed in order on
//! one logical thread. Sockets come from an injected [`Connector`], which
//! lets tests drive the transition table with a fake socket and a paused
//! clock.

mod socket;
mod websocket;

pub use socket::{Connector, SocketEvent, SocketHandle};
pub use websocket::WebSocketConnector;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use wsx_core::Frame;

use crate::token::TokenStore;

/// Connection status observed by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// No connection has been requested, or credentials are missing.
    Idle,
    /// A socket is being established.
    Connecting,
    /// The socket is live; frames may be sent.
    Open,
    /// The socket is gone. `exhausted` is set once automatic retries have
    /// stopped; only an explicit `connect()` revives the session from there.
    Closed { exhausted: bool },
}

impl TransportStatus {
    pub fn is_open(self) -> bool {
        matches!(self, TransportStatus::Open)
    }
}

/// Reconnect delay policy: `min(base * 2^attempt, cap)`, at most
/// `max_attempts` automatic retries between successful opens.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub cap_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            cap_delay: Duration::from_millis(30_000),
            max_attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry for the given attempt number.
    ///
    /// Non-decreasing in `attempt`, never exceeds `cap_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(31))
            .min(self.cap_delay)
    }
}

/// Endpoint and policy for one session's transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Socket endpoint without credentials, e.g.
    /// `ws://host/ws/terminal/ws-1`. The auth token is appended as a query
    /// parameter at connect time, because the upgrade handshake cannot carry
    /// custom headers from a browser context.
    pub url: String,
    pub tokens: TokenStore,
    pub policy: RetryPolicy,
}

enum Command {
    Connect,
    Close,
    Send(Frame),
}

/// Handle to a session's transport actor.
///
/// Cheap operations that enqueue commands; the actor applies them in order.
pub struct Transport {
    cmd_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<TransportStatus>,
    frame_tx: broadcast::Sender<Frame>,
    task: tokio::task::JoinHandle<()>,
}

impl Transport {
    /// Spawn the transport actor for one session. Starts in `Idle`; nothing
    /// is opened until `connect()`.
    pub fn spawn(config: TransportConfig, connector: Arc<dyn Connector>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(TransportStatus::Idle);
        let (frame_tx, _) = broadcast::channel(256);

        let task = TransportTask {
            url: config.url,
            tokens: config.tokens,
            policy: config.policy,
            connector,
            state: TransportStatus::Idle,
            attempt: 0,
            socket: None,
            socket_rx: None,
            retry_at: None,
            status_tx,
            frame_tx: frame_tx.clone(),
        };
        let task = tokio::spawn(task.run(cmd_rx));

        Self {
            cmd_tx,
            status_rx,
            frame_tx,
            task,
        }
    }

    /// Establish a connection. Supersedes any pending retry, closes and
    /// discards any prior socket, and resets the attempt counter. Refused
    /// locally when no auth token is available.
    pub fn connect(&self) {
        let _ = self.cmd_tx.send(Command::Connect);
    }

    /// Tear the connection down. Cancels any pending retry and never
    /// reschedules; the transport stays `Closed` until `connect()`.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close);
    }

    /// Explicit user-triggered recovery: close, then connect from a fresh
    /// attempt budget.
    pub fn reconnect(&self) {
        self.close();
        self.connect();
    }

    /// Queue one outbound frame. Dropped silently unless the transport is
    /// `Open`; callers gate input on observed status, not on send results.
    pub fn send(&self, frame: Frame) {
        let _ = self.cmd_tx.send(Command::Send(frame));
    }

    /// Current status snapshot.
    pub fn status(&self) -> TransportStatus {
        *self.status_rx.borrow()
    }

    /// Watch status transitions.
    pub fn watch_status(&self) -> watch::Receiver<TransportStatus> {
        self.status_rx.clone()
    }

    /// Subscribe to inbound `output`/`error` frames.
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frame_tx.subscribe()
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct TransportTask {
    url: String,
    tokens: TokenStore,
    policy: RetryPolicy,
    connector: Arc<dyn Connector>,
    state: TransportStatus,
    attempt: u32,
    socket: Option<Box<dyn SocketHandle>>,
    socket_rx: Option<mpsc::Receiver<SocketEvent>>,
    retry_at: Option<Instant>,
    status_tx: watch::Sender<TransportStatus>,
    frame_tx: broadcast::Sender<Frame>,
}

/// What woke the actor up. Computed inside the select so the state mutation
/// below it never overlaps a pending borrow.
enum Wake {
    Cmd(Option<Command>),
    Socket(Option<SocketEvent>),
    RetryElapsed,
}

impl TransportTask {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            let retry_at = self.retry_at;
            let wake = tokio::select! {
                cmd = cmd_rx.recv() => Wake::Cmd(cmd),
                event = recv_socket_event(&mut self.socket_rx) => Wake::Socket(event),
                _ = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)),
                    if retry_at.is_some() => Wake::RetryElapsed,
            };

            match wake {
                Wake::Cmd(Some(Command::Connect)) => {
                    self.attempt = 0;
                    self.start_connect();
                }
                Wake::Cmd(Some(Command::Close)) => self.shutdown(),
                Wake::Cmd(Some(Command::Send(frame))) => self.send_frame(frame),
                Wake::Cmd(None) => {
                    // Session dropped; release the socket and stop.
                    self.shutdown();
                    break;
                }
                Wake::Socket(Some(event)) => self.on_socket_event(event),
                // Socket task ended without a close event.
                Wake::Socket(None) => self.on_disconnect(),
                Wake::RetryElapsed => {
                    self.retry_at = None;
                    debug!(attempt = self.attempt, "retry timer elapsed");
                    self.start_connect();
                }
            }
        }
    }

    fn set_status(&mut self, status: TransportStatus) {
        if self.state != status {
            self.state = status;
            let _ = self.status_tx.send(status);
        }
    }

    /// Open a new socket, discarding any prior one first. At most one live
    /// socket exists at any instant.
    fn start_connect(&mut self) {
        self.retry_at = None;
        self.drop_socket();

        let token = match self.tokens.get() {
            Some(t) => t,
            None => {
                // Retrying without credentials cannot succeed; nothing is
                // scheduled.
                warn!("cannot connect: auth token missing");
                self.set_status(TransportStatus::Idle);
                return;
            }
        };

        self.set_status(TransportStatus::Connecting);
        let url = format!("{}?token={}", self.url, token);
        let (handle, rx) = self.connector.open(&url);
        self.socket = Some(handle);
        self.socket_rx = Some(rx);
    }

    fn drop_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
        self.socket_rx = None;
    }

    /// Explicit close: any state → `Closed`, no reschedule.
    fn shutdown(&mut self) {
        self.retry_at = None;
        self.drop_socket();
        self.set_status(TransportStatus::Closed { exhausted: false });
    }

    fn send_frame(&mut self, frame: Frame) {
        if !self.state.is_open() {
            trace!(state = ?self.state, "dropping outbound frame while not open");
            return;
        }
        match frame.encode() {
            Ok(text) => {
                if let Some(socket) = &self.socket {
                    socket.send_text(text);
                }
            }
            Err(e) => warn!("failed to encode outbound frame: {e}"),
        }
    }

    fn on_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => {
                self.attempt = 0;
                self.set_status(TransportStatus::Open);
                info!("terminal socket open");
            }
            SocketEvent::Message(text) => self.on_message(&text),
            SocketEvent::Error(reason) => {
                warn!(%reason, "socket error");
                self.on_disconnect();
            }
            SocketEvent::Closed => self.on_disconnect(),
        }
    }

    /// Unplanned loss of the socket while it was wanted.
    fn on_disconnect(&mut self) {
        self.drop_socket();
        if !matches!(
            self.state,
            TransportStatus::Connecting | TransportStatus::Open
        ) {
            return;
        }

        if self.attempt < self.policy.max_attempts {
            let delay = self.policy.delay(self.attempt);
            // Incremented at schedule time, before the delay elapses.
            self.attempt += 1;
            self.retry_at = Some(Instant::now() + delay);
            self.set_status(TransportStatus::Closed { exhausted: false });
            info!(
                attempt = self.attempt,
                delay_ms = delay.as_millis() as u64,
                "reconnect scheduled"
            );
        } else {
            self.set_status(TransportStatus::Closed { exhausted: true });
            warn!(attempts = self.attempt, "reconnect attempts exhausted");
        }
    }

    fn on_message(&mut self, text: &str) {
        match Frame::decode(text) {
            Ok(frame) => match frame {
                Frame::Output { .. } | Frame::Error { .. } => {
                    // No receiver means no view is attached; the frame is
                    // dropped, matching detached-view semantics.
                    let _ = self.frame_tx.send(frame);
                }
                other => debug!(frame = ?other, "ignoring unexpected inbound frame"),
            },
            // One corrupt frame never tears down the connection.
            Err(e) => warn!("dropping malformed frame: {e}"),
        }
    }
}

async fn recv_socket_event(rx: &mut Option<mpsc::Receiver<SocketEvent>>) -> Option<SocketEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
