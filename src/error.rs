//! Typed outcomes of display operations.
//!
//! Only [`DisplayError::PlatformInit`] is fatal to the application; the rest
//! are reported to the caller and the run loop carries on.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The native window system could not be reached at startup.
    #[error("platform initialization failed: {0}")]
    PlatformInit(String),

    /// A framebuffer whose pixel buffer does not match its dimensions.
    #[error("invalid framebuffer {width}x{height}: expected {expected} bytes, got {actual}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("window backend is already closed")]
    AlreadyClosed,

    #[error("window backend has not been opened")]
    NotOpen,

    #[error("window backend is already open")]
    AlreadyOpen,

    /// A native call failed while staging or presenting a frame.
    #[error("{call} failed: {detail}")]
    Native { call: &'static str, detail: String },
}

impl DisplayError {
    pub fn native(call: &'static str, detail: impl Into<String>) -> Self {
        Self::Native {
            call,
            detail: detail.into(),
        }
    }

    /// Whether the application must terminate on this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PlatformInit(_))
    }
}

pub type Result<T> = std::result::Result<T, DisplayError>;
