//! Display surface capability.
//!
//! The terminal rendering widget is opaque to the rest of the stack: a byte
//! sink for shell output and a source of keystroke/resize events. The session
//! owns the surface object itself, so scrollback and screen state survive
//! attach/detach cycles; only the event wiring is torn down with a view.

use tokio::sync::mpsc;

/// Events produced by a display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Raw keystroke/paste bytes, as text.
    Input(String),
    /// The viewport geometry changed.
    Resize { cols: u16, rows: u16 },
}

/// An opaque terminal-emulation widget.
pub trait DisplaySurface: Send {
    /// Render shell output bytes.
    fn write(&mut self, bytes: &[u8]);

    /// Current geometry as `(cols, rows)`.
    fn size(&self) -> (u16, u16);

    /// Subscribe to input/resize events. A fresh subscription supersedes any
    /// previous one; stale receivers stop getting events.
    fn events(&mut self) -> mpsc::UnboundedReceiver<SurfaceEvent>;

    /// Release the widget's resources. Called once, on session removal.
    fn dispose(&mut self);
}
