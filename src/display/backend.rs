//! The uniform window lifecycle every platform presents to the application.

use crate::display::driver::WindowHandle;
use crate::display::events::Event;
use crate::error::{DisplayError, Result};
use crate::framebuffer::Framebuffer;
use log::warn;
use std::time::Duration;

/// `Uninitialized -> Open -> Running -> Closing -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    /// Window created, no events drained yet.
    Open,
    Running,
    /// Native teardown in progress.
    Closing,
    Closed,
}

impl Lifecycle {
    /// Whether a native window exists.
    pub fn is_live(self) -> bool {
        matches!(self, Lifecycle::Open | Lifecycle::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub handle: WindowHandle,
    /// Client area in pixels.
    pub size: (u32, u32),
    pub is_open: bool,
}

/// One native window showing one framebuffer.
///
/// Any call other than `open` before the window is opened fails with
/// `NotOpen`; any call other than `close` after it closed fails with
/// `AlreadyClosed`. A failed call has no native side effect.
pub trait WindowBackend {
    /// Connects, creates and shows the window.
    fn open(&mut self, title: &str, width: u32, height: u32) -> Result<WindowState>;

    /// Makes `framebuffer` current without repainting.
    ///
    /// On error the previous framebuffer stays current.
    fn set_framebuffer(&mut self, framebuffer: Framebuffer) -> Result<()>;

    /// Drains pending events without blocking and reacts to them.
    ///
    /// Expose repaints, Resize updates the stored size, Close tears the window
    /// down. Events after a Close are discarded.
    fn poll_events(&mut self) -> Result<Vec<Event>>;

    /// Idempotent.
    fn close(&mut self) -> Result<()>;

    fn window_state(&self) -> Result<WindowState>;

    fn lifecycle(&self) -> Lifecycle;

    /// Blocks the calling thread until the window closes.
    ///
    /// Drains repeatedly, sleeping `tick` after an empty drain. Fatal errors
    /// are returned, as are `NotOpen` and `AlreadyClosed` when the loop is
    /// started on a backend that is not live. Other errors are logged and
    /// polling continues.
    fn run_loop(&mut self, tick: Duration) -> Result<()> {
        loop {
            match self.poll_events() {
                Ok(events) => {
                    if self.lifecycle() == Lifecycle::Closed {
                        return Ok(());
                    }
                    if events.is_empty() {
                        std::thread::sleep(tick);
                    }
                }
                Err(e @ (DisplayError::NotOpen | DisplayError::AlreadyClosed)) => return Err(e),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Event poll failed: {}", e);
                    std::thread::sleep(tick);
                }
            }
        }
    }
}
