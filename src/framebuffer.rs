//! The in-memory RGBA image handed to a window backend.
//!
//! Pixels are RGBA8, row-major, top row first. A framebuffer is immutable once
//! built; replacing the displayed image means handing over a new one.

use crate::error::{DisplayError, Result};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Box<[u8]>,
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format_args!("<{} bytes>", self.pixels.len()))
            .finish()
    }
}

impl Framebuffer {
    /// Wraps an RGBA buffer without checking it.
    ///
    /// The size invariant is enforced where the buffer is consumed
    /// (`convert`, `set_framebuffer`), so a malformed buffer is reported there
    /// instead of here.
    pub fn from_rgba(width: u32, height: u32, pixels: impl Into<Box<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// A framebuffer filled with one RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self::from_rgba(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Byte length the dimensions call for, or `None` on overflow.
    pub fn expected_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(BYTES_PER_PIXEL)
    }

    /// Checks `len(pixels) == width * height * 4`.
    pub fn validate(&self) -> Result<()> {
        match Self::expected_len(self.width, self.height) {
            Some(expected) if expected == self.pixels.len() => Ok(()),
            expected => Err(DisplayError::InvalidBuffer {
                width: self.width,
                height: self.height,
                expected: expected.unwrap_or(usize::MAX),
                actual: self.pixels.len(),
            }),
        }
    }

    /// RGBA of the pixel at `(x, y)`, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Iterates over the rows, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_len = (self.width as usize * BYTES_PER_PIXEL).max(1);
        self.pixels.chunks_exact(row_len)
    }
}
