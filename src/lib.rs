//! Open a native window and blit an RGBA framebuffer into it.
//!
//! A [`source::PixelSource`] produces the image, [`convert`] rewrites it into
//! the byte layout of the host window system, and a
//! [`display::WindowBackend`] owns the window and its event loop. The native
//! backend is picked at build time through [`display::NativeBackend`].

pub mod app;
pub mod config;
pub mod convert;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod source;

pub use error::{DisplayError, Result};
pub use framebuffer::Framebuffer;
