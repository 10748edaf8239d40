// src/display/driver.rs
//! DisplayDriver trait - minimal interface for platform-specific display primitives.
//!
//! Drivers only wrap the native calls. Lifecycle, event filtering, blit
//! clipping and framebuffer ownership live in [`DisplayManager`](super::DisplayManager).
//!
//! ## Lifecycle
//! 1. `connect()` - reach the native display, no window yet
//! 2. `create_window()` - create, register events, show
//! 3. `drain_events()` / `stage()` / `present()` from the run loop
//! 4. `destroy_window()` - release the window and every staged resource

use crate::config::WindowConfig;
use crate::convert::{ConvertedFrame, PixelLayout};
use crate::display::events::{Event, EventMask};
use crate::error::Result;

/// Opaque native window identifier (XID, `HWND`, `NSWindow*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub u64);

/// The part of the staged frame copied to the window, anchored top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlitRegion {
    pub width: u32,
    pub height: u32,
}

impl BlitRegion {
    /// `min(window, framebuffer)` in each dimension. No scaling.
    pub fn clip(window: (u32, u32), framebuffer: (u32, u32)) -> Self {
        Self {
            width: window.0.min(framebuffer.0),
            height: window.1.min(framebuffer.1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Platform-specific display primitives.
///
/// Every method except `connect` is only called between a successful
/// `create_window` and `destroy_window`.
pub trait DisplayDriver {
    /// Connects to the native display. Fails with `PlatformInit`.
    fn connect(config: &WindowConfig) -> Result<Self>
    where
        Self: Sized;

    /// Byte layout `stage` expects.
    fn layout(&self) -> PixelLayout;

    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        events: EventMask,
    ) -> Result<WindowHandle>;

    /// Appends every pending event without blocking.
    fn drain_events(&mut self, out: &mut Vec<Event>) -> Result<()>;

    /// Builds native resources for `frame`, then releases the previous ones.
    fn stage(&mut self, frame: ConvertedFrame) -> Result<()>;

    /// Copies `region` of the staged frame to the window's top-left corner.
    fn present(&mut self, region: BlitRegion) -> Result<()>;

    /// Best effort. Failures are logged by the driver.
    fn destroy_window(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_takes_the_smaller_side_per_axis() {
        assert_eq!(
            BlitRegion::clip((400, 300), (800, 600)),
            BlitRegion { width: 400, height: 300 }
        );
        assert_eq!(
            BlitRegion::clip((1000, 500), (800, 600)),
            BlitRegion { width: 800, height: 500 }
        );
        assert!(BlitRegion::clip((0, 300), (800, 600)).is_empty());
        assert!(!BlitRegion::clip((1, 1), (1, 1)).is_empty());
    }
}
