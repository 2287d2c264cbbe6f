//! Shared test doubles: a scriptable fake socket and a recording surface.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::session::Session;
use crate::surface::{DisplaySurface, SurfaceEvent};
use crate::token::TokenStore;
use crate::transport::{
    Connector, RetryPolicy, SocketEvent, SocketHandle, Transport, TransportConfig,
};

/// Let spawned actors drain queued commands/events without letting the
/// runtime go idle (which would auto-advance a paused clock).
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

// ── Fake socket ──────────────────────────────────────────────────────

/// A connector whose sockets are driven by the test.
///
/// Every `open()` records a [`SocketProbe`] through which the test fires
/// socket events and inspects what the transport sent.
#[derive(Clone, Default)]
pub struct FakeConnector {
    opened: Arc<Mutex<Vec<SocketProbe>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Probe for the n-th socket this connector opened.
    pub fn probe(&self, index: usize) -> SocketProbe {
        self.opened.lock().unwrap()[index].clone()
    }
}

impl Connector for FakeConnector {
    fn open(&self, url: &str) -> (Box<dyn SocketHandle>, mpsc::Receiver<SocketEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let state = Arc::new(Mutex::new(ProbeState::default()));
        self.opened.lock().unwrap().push(SocketProbe {
            url: url.to_string(),
            events: event_tx,
            state: state.clone(),
        });
        (Box::new(FakeHandle { state }), event_rx)
    }
}

#[derive(Default)]
struct ProbeState {
    sent: Vec<String>,
    closed: bool,
}

struct FakeHandle {
    state: Arc<Mutex<ProbeState>>,
}

impl SocketHandle for FakeHandle {
    fn send_text(&self, text: String) {
        self.state.lock().unwrap().sent.push(text);
    }

    fn close(&self) {
        self.state.lock().unwrap().closed = true;
    }
}

/// Test-side view of one fake socket.
#[derive(Clone)]
pub struct SocketProbe {
    url: String,
    events: mpsc::Sender<SocketEvent>,
    state: Arc<Mutex<ProbeState>>,
}

impl SocketProbe {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn opened(&self) {
        let _ = self.events.send(SocketEvent::Opened).await;
    }

    pub async fn message(&self, text: &str) {
        let _ = self.events.send(SocketEvent::Message(text.into())).await;
    }

    pub async fn error(&self, reason: &str) {
        let _ = self.events.send(SocketEvent::Error(reason.into())).await;
    }

    pub async fn closed(&self) {
        let _ = self.events.send(SocketEvent::Closed).await;
    }

    /// Wire text of every frame the transport sent on this socket.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

// ── Recording surface ────────────────────────────────────────────────

#[derive(Default)]
struct SurfaceState {
    written: Vec<u8>,
    disposed: bool,
}

type SharedEventsTx = Arc<Mutex<Option<mpsc::UnboundedSender<SurfaceEvent>>>>;

/// A display surface that records writes and lets the test inject input.
pub struct RecordingSurface {
    cols: u16,
    rows: u16,
    state: Arc<Mutex<SurfaceState>>,
    events_tx: SharedEventsTx,
}

impl RecordingSurface {
    pub fn new(cols: u16, rows: u16) -> (Box<dyn DisplaySurface>, SurfaceProbe) {
        let state = Arc::new(Mutex::new(SurfaceState::default()));
        let events_tx: SharedEventsTx = Arc::new(Mutex::new(None));
        let surface = Self {
            cols,
            rows,
            state: state.clone(),
            events_tx: events_tx.clone(),
        };
        (Box::new(surface), SurfaceProbe { state, events_tx })
    }
}

impl DisplaySurface for RecordingSurface {
    fn write(&mut self, bytes: &[u8]) {
        self.state.lock().unwrap().written.extend_from_slice(bytes);
    }

    fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn events(&mut self) -> mpsc::UnboundedReceiver<SurfaceEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events_tx.lock().unwrap() = Some(tx);
        rx
    }

    fn dispose(&mut self) {
        self.state.lock().unwrap().disposed = true;
    }
}

/// Test-side view of a [`RecordingSurface`].
#[derive(Clone)]
pub struct SurfaceProbe {
    state: Arc<Mutex<SurfaceState>>,
    events_tx: SharedEventsTx,
}

impl SurfaceProbe {
    /// Everything written to the surface so far, lossily as text.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().unwrap().written).into_owned()
    }

    pub fn disposed(&self) -> bool {
        self.state.lock().unwrap().disposed
    }

    /// Emit keystrokes from the surface, as a user typing would.
    pub fn input(&self, data: &str) {
        if let Some(tx) = &*self.events_tx.lock().unwrap() {
            let _ = tx.send(SurfaceEvent::Input(data.into()));
        }
    }

    /// Emit a viewport geometry change.
    pub fn resize(&self, cols: u16, rows: u16) {
        if let Some(tx) = &*self.events_tx.lock().unwrap() {
            let _ = tx.send(SurfaceEvent::Resize { cols, rows });
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

/// A session over a fake socket and a recording surface, with a token in
/// place so `connect()` is not refused.
pub fn session_fixture(workspace_id: &str, connector: &FakeConnector) -> (Session, SurfaceProbe) {
    let (surface, probe) = RecordingSurface::new(80, 24);
    let transport = Transport::spawn(
        TransportConfig {
            url: format!("ws://test/ws/terminal/{workspace_id}"),
            tokens: TokenStore::with_token("secret"),
            policy: RetryPolicy::default(),
        },
        Arc::new(connector.clone()),
    );
    (Session::new(workspace_id, surface, transport), probe)
}
