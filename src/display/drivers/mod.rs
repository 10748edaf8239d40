// src/display/drivers/mod.rs
//! Platform-specific display driver implementations.

pub mod headless;

#[cfg(target_os = "macos")]
pub mod cocoa;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

#[cfg(windows)]
pub mod win32;

pub use headless::{HeadlessDisplayDriver, HeadlessOp};

#[cfg(target_os = "macos")]
pub use cocoa::CocoaDisplayDriver;

#[cfg(all(unix, not(target_os = "macos")))]
pub use x11::X11DisplayDriver;

#[cfg(windows)]
pub use win32::Win32DisplayDriver;
