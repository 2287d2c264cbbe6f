//! A logical terminal session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::surface::DisplaySurface;
use crate::transport::Transport;

/// One logical shell attached to one workspace.
///
/// A session outlives any single view: it is created on first navigation to a
/// workspace's terminal and torn down only by explicit removal or idle
/// eviction. The display surface object itself, not the view it happens to be
/// shown in, is the carrier of terminal state, so detaching a view loses
/// nothing.
pub struct Session {
    workspace_id: String,
    surface: Arc<Mutex<Box<dyn DisplaySurface>>>,
    transport: Transport,
    created_at: Instant,
}

impl Session {
    pub fn new(
        workspace_id: impl Into<String>,
        surface: Box<dyn DisplaySurface>,
        transport: Transport,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            surface: Arc::new(Mutex::new(surface)),
            transport,
            created_at: Instant::now(),
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) fn surface(&self) -> Arc<Mutex<Box<dyn DisplaySurface>>> {
        self.surface.clone()
    }

    /// Age of this session, used only for idle eviction.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Irreversible teardown: close the transport, dispose the surface.
    /// Only the registry calls this, from `remove` and `sweep`.
    pub(crate) async fn close(&self) {
        self.transport.close();
        self.surface.lock().await.dispose();
    }
}
