//! WebSocket connector backed by tokio-tungstenite.
//!
//! One spawned task per socket: performs the async connect, then shuttles
//! outgoing text and incoming messages, answering pings along the way. The
//! task reports progress through `SocketEvent`s and stops as soon as the
//! transport discards its handle.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use super::socket::{Connector, SocketEvent, SocketHandle};

/// Opens real WebSocket connections.
#[derive(Debug, Default, Clone)]
pub struct WebSocketConnector;

enum Outgoing {
    Text(String),
    Close,
}

struct WsHandle {
    out_tx: mpsc::UnboundedSender<Outgoing>,
}

impl SocketHandle for WsHandle {
    fn send_text(&self, text: String) {
        let _ = self.out_tx.send(Outgoing::Text(text));
    }

    fn close(&self) {
        let _ = self.out_tx.send(Outgoing::Close);
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, url: &str) -> (Box<dyn SocketHandle>, mpsc::Receiver<SocketEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(url.to_string(), event_tx, out_rx));
        (Box::new(WsHandle { out_tx }), event_rx)
    }
}

async fn run_socket(
    url: String,
    events: mpsc::Sender<SocketEvent>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) {
    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            let _ = events.send(SocketEvent::Error(e.to_string())).await;
            let _ = events.send(SocketEvent::Closed).await;
            return;
        }
    };
    debug!("websocket connected");

    if events.send(SocketEvent::Opened).await.is_err() {
        // The transport already discarded this socket.
        return;
    }

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            msg = outgoing.recv() => match msg {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        let _ = events.send(SocketEvent::Error(format!("write error: {e}"))).await;
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if events.send(SocketEvent::Message(text)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = sink.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(_))) => {
                    debug!("websocket close frame received");
                    break;
                }
                Some(Ok(_)) => {} // binary frames and pongs are ignored
                Some(Err(e)) => {
                    warn!("websocket read error: {e}");
                    let _ = events.send(SocketEvent::Error(e.to_string())).await;
                    break;
                }
                None => break,
            },
        }
    }

    let _ = events.send(SocketEvent::Closed).await;
}
