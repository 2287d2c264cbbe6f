//! The local terminal as a display surface.
//!
//! Wraps crossterm: a RAII raw-mode guard, a background thread translating
//! key/resize events into surface events, and stdout as the byte sink. Ctrl+]
//! detaches from the session (like ssh's `~.`); Ctrl+R doubles as the
//! reconnect affordance once automatic retries are exhausted.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use tokio::sync::mpsc;
use tracing::warn;

use wsx_client::{DisplaySurface, SurfaceEvent};

/// Out-of-band requests from the user, separate from shell input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// Ctrl+] — leave the terminal view.
    Detach,
    /// Ctrl+R — ask for an explicit reconnect. Only honored while the
    /// transport is down; otherwise the byte goes to the shell as input.
    Reconnect,
}

/// RAII guard that restores the terminal to cooked mode on drop.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw terminal mode")?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort restore; nothing more we can do in a Drop impl.
        let _ = terminal::disable_raw_mode();
    }
}

type SharedEventsTx = Arc<Mutex<Option<mpsc::UnboundedSender<SurfaceEvent>>>>;

/// Display surface backed by the local terminal.
pub struct TermSurface {
    events_tx: SharedEventsTx,
    stop: Arc<AtomicBool>,
}

impl TermSurface {
    /// Start the event-reader thread and hand back the surface plus the
    /// out-of-band signal stream.
    pub fn spawn() -> (Box<dyn DisplaySurface>, mpsc::UnboundedReceiver<TermSignal>) {
        let events_tx: SharedEventsTx = Arc::new(Mutex::new(None));
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        {
            let events_tx = events_tx.clone();
            let stop = stop.clone();
            std::thread::spawn(move || read_loop(&events_tx, &signal_tx, &stop));
        }

        (Box::new(Self { events_tx, stop }), signal_rx)
    }
}

impl DisplaySurface for TermSurface {
    fn write(&mut self, bytes: &[u8]) {
        let mut out = std::io::stdout();
        if out.write_all(bytes).and_then(|_| out.flush()).is_err() {
            warn!("failed to write to stdout");
        }
    }

    fn size(&self) -> (u16, u16) {
        terminal::size().unwrap_or((80, 24))
    }

    fn events(&mut self) -> mpsc::UnboundedReceiver<SurfaceEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events_tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        rx
    }

    fn dispose(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for TermSurface {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn read_loop(
    events: &SharedEventsTx,
    signals: &mpsc::UnboundedSender<TermSignal>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        match event::poll(Duration::from_millis(100)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!("terminal event poll error: {e}");
                break;
            }
        }

        match event::read() {
            Ok(Event::Key(key)) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    if key.code == KeyCode::Char(']') {
                        let _ = signals.send(TermSignal::Detach);
                        continue;
                    }
                    if key.code == KeyCode::Char('r') {
                        // Forwarded to the shell too; the command loop only
                        // acts on it while the transport is down.
                        let _ = signals.send(TermSignal::Reconnect);
                    }
                }

                if let Some(bytes) = key_event_to_bytes(&key) {
                    if let Ok(data) = String::from_utf8(bytes) {
                        send_event(events, SurfaceEvent::Input(data));
                    }
                }
            }
            Ok(Event::Resize(cols, rows)) => {
                send_event(events, SurfaceEvent::Resize { cols, rows });
            }
            Ok(_) => {}
            Err(e) => {
                warn!("terminal event read error: {e}");
                break;
            }
        }
    }
}

fn send_event(events: &SharedEventsTx, event: SurfaceEvent) {
    if let Some(tx) = &*events.lock().unwrap_or_else(|e| e.into_inner()) {
        let _ = tx.send(event);
    }
}

/// Translate a key event into the bytes a PTY expects.
fn key_event_to_bytes(event: &KeyEvent) -> Option<Vec<u8>> {
    match event.code {
        KeyCode::Char(c) => {
            if event.modifiers.contains(KeyModifiers::CONTROL) {
                // Ctrl+A = 0x01 .. Ctrl+Z = 0x1a
                let byte = (c.to_ascii_lowercase() as u8)
                    .wrapping_sub(b'a')
                    .wrapping_add(1);
                if byte <= 26 {
                    return Some(vec![byte]);
                }
            }
            let mut buf = [0u8; 4];
            Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
        }
        KeyCode::Enter => Some(vec![b'\r']),
        KeyCode::Backspace => Some(vec![0x7f]),
        KeyCode::Tab => Some(vec![b'\t']),
        KeyCode::Esc => Some(vec![0x1b]),
        KeyCode::Up => Some(b"\x1b[A".to_vec()),
        KeyCode::Down => Some(b"\x1b[B".to_vec()),
        KeyCode::Right => Some(b"\x1b[C".to_vec()),
        KeyCode::Left => Some(b"\x1b[D".to_vec()),
        KeyCode::Home => Some(b"\x1b[H".to_vec()),
        KeyCode::End => Some(b"\x1b[F".to_vec()),
        KeyCode::PageUp => Some(b"\x1b[5~".to_vec()),
        KeyCode::PageDown => Some(b"\x1b[6~".to_vec()),
        KeyCode::Insert => Some(b"\x1b[2~".to_vec()),
        KeyCode::Delete => Some(b"\x1b[3~".to_vec()),
        _ => None,
    }
}
