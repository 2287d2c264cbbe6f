//! Socket event surface.
//!
//! The transport drives a socket through the same four events a browser
//! WebSocket exposes (open/message/error/close), so the transition table in
//! [`super::Transport`] can be exercised against an injected fake in tests.

use tokio::sync::mpsc;

/// Events emitted by a socket, in the order the connection produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The connection handshake completed.
    Opened,
    /// One complete text message arrived.
    Message(String),
    /// The connection failed. A `Closed` event follows.
    Error(String),
    /// The connection is gone and will produce no further events.
    Closed,
}

/// Outgoing half of a socket.
pub trait SocketHandle: Send {
    /// Queue one text message. Fire-and-forget: failures surface as socket
    /// events, never as return values.
    fn send_text(&self, text: String);

    /// Close the connection. Idempotent.
    fn close(&self);
}

/// Opens sockets for the transport.
///
/// `open` must return immediately; connection progress is reported through
/// the event receiver, starting with either `Opened` or `Error` + `Closed`.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, url: &str) -> (Box<dyn SocketHandle>, mpsc::Receiver<SocketEvent>);
}
