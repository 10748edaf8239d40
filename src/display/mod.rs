// src/display/mod.rs
//! Native window display with the Strategy pattern.
//!
//! - DisplayDriver: platform-specific primitives (Cocoa, X11, Win32, headless)
//! - DisplayManager: the shared lifecycle and state machine, a WindowBackend
//! - normalize: pure native-event to [`Event`] mappings

pub mod backend;
pub mod driver;
pub mod drivers;
pub mod events;
pub mod manager;
pub mod normalize;


pub use backend::{Lifecycle, WindowBackend, WindowState};
pub use driver::{BlitRegion, DisplayDriver, WindowHandle};
pub use drivers::{HeadlessDisplayDriver, HeadlessOp};
pub use events::{Event, EventMask};
pub use manager::DisplayManager;

/// The native driver for the build target.
#[cfg(target_os = "macos")]
pub type PlatformDriver = drivers::CocoaDisplayDriver;

#[cfg(all(unix, not(target_os = "macos")))]
pub type PlatformDriver = drivers::X11DisplayDriver;

#[cfg(windows)]
pub type PlatformDriver = drivers::Win32DisplayDriver;

#[cfg(not(any(unix, windows)))]
compile_error!("rgba-view supports macOS (Cocoa), X11 and Windows targets only");

/// The window backend for the build target.
pub type NativeBackend = DisplayManager<PlatformDriver>;
