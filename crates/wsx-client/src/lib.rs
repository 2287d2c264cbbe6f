//! wsx-client: client library for the wsx workspace manager.
//!
//! Keeps a live, byte-accurate shell session logically alive across UI
//! navigation: a process-wide [`SessionRegistry`] decouples session lifetime
//! from view lifetime, and a per-session [`Transport`] owns connection
//! establishment, bounded exponential-backoff reconnection, and message
//! framing over a single WebSocket. A thin [`WorkspaceApi`] covers the
//! management REST surface.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wsx_client::{
//!     Session, SessionController, SessionRegistry, TokenStore, Transport, TransportConfig,
//!     RetryPolicy, WebSocketConnector, WorkspaceApi,
//! };
//!
//! # async fn example(surface: Box<dyn wsx_client::DisplaySurface>) -> wsx_client::WsxResult<()> {
//! let tokens = TokenStore::with_token("secret");
//! let api = WorkspaceApi::new("http://localhost:8080", tokens.clone());
//! let registry = SessionRegistry::new();
//!
//! let workspace = api.get("ws-1").await?;
//! assert!(workspace.terminal_ready());
//!
//! let session = registry
//!     .get_or_create("ws-1", || {
//!         let transport = Transport::spawn(
//!             TransportConfig {
//!                 url: api.terminal_url("ws-1"),
//!                 tokens: tokens.clone(),
//!                 policy: RetryPolicy::default(),
//!             },
//!             Arc::new(WebSocketConnector),
//!         );
//!         Session::new("ws-1", surface, transport)
//!     })
//!     .await;
//!
//! let mut view = SessionController::attach(session).await;
//! // ... user interacts with the terminal ...
//! view.detach(); // session and socket stay alive in the registry
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod controller;
pub mod registry;
pub mod session;
pub mod surface;
pub mod token;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export primary public types.
pub use api::WorkspaceApi;
pub use controller::SessionController;
pub use registry::SessionRegistry;
pub use session::Session;
pub use surface::{DisplaySurface, SurfaceEvent};
pub use token::TokenStore;
pub use transport::{
    Connector, RetryPolicy, SocketEvent, SocketHandle, Transport, TransportConfig,
    TransportStatus, WebSocketConnector,
};

// Re-export wsx-core error types for convenience.
pub use wsx_core::{WsxError, WsxResult};
