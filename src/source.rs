//! Producers of the RGBA image the window shows.

use crate::config::{SourceConfig, SourceKind};
use crate::framebuffer::{Framebuffer, BYTES_PER_PIXEL};
use anyhow::{Context, Result};
use log::debug;
use std::borrow::Cow;
use std::path::PathBuf;

/// The PNG compiled into the binary.
pub const EMBEDDED_PNG: &[u8] = include_bytes!("../assets/image.png");

/// Anything that can hand the application an RGBA framebuffer.
pub trait PixelSource {
    fn initial_framebuffer(&mut self) -> Result<Framebuffer>;
}

impl<S: PixelSource + ?Sized> PixelSource for Box<S> {
    fn initial_framebuffer(&mut self) -> Result<Framebuffer> {
        (**self).initial_framebuffer()
    }
}

/// One color over the whole image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidFill {
    pub width: u32,
    pub height: u32,
    pub rgba: [u8; 4],
}

impl PixelSource for SolidFill {
    fn initial_framebuffer(&mut self) -> Result<Framebuffer> {
        Ok(Framebuffer::solid(self.width, self.height, self.rgba))
    }
}

/// Red ramps left to right and green top to bottom, so a flipped or
/// channel-swapped blit is obvious at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    pub width: u32,
    pub height: u32,
}

impl Gradient {
    fn ramp(position: u32, extent: u32) -> u8 {
        if extent <= 1 {
            return 0;
        }
        (position as u64 * 255 / (extent as u64 - 1)) as u8
    }
}

impl PixelSource for Gradient {
    fn initial_framebuffer(&mut self) -> Result<Framebuffer> {
        let mut pixels =
            Vec::with_capacity(self.width as usize * self.height as usize * BYTES_PER_PIXEL);
        for y in 0..self.height {
            let g = Self::ramp(y, self.height);
            for x in 0..self.width {
                pixels.extend_from_slice(&[Self::ramp(x, self.width), g, 128, 255]);
            }
        }
        Ok(Framebuffer::from_rgba(self.width, self.height, pixels))
    }
}

/// A PNG decoded to RGBA8 at its own size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PngImage {
    /// [`EMBEDDED_PNG`].
    Embedded,
    /// Read from disk when the framebuffer is requested.
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl PngImage {
    fn encoded(&self) -> Result<Cow<'_, [u8]>> {
        Ok(match self {
            PngImage::Embedded => Cow::Borrowed(EMBEDDED_PNG),
            PngImage::File(path) => Cow::Owned(
                std::fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            ),
            PngImage::Bytes(bytes) => Cow::Borrowed(bytes.as_slice()),
        })
    }
}

impl PixelSource for PngImage {
    fn initial_framebuffer(&mut self) -> Result<Framebuffer> {
        let encoded = self.encoded()?;
        let decoded = image::load_from_memory_with_format(&encoded, image::ImageFormat::Png)
            .context("Failed to decode PNG image")?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        debug!("Decoded {}x{} PNG ({} bytes encoded)", width, height, encoded.len());
        Ok(Framebuffer::from_rgba(width, height, decoded.into_raw()))
    }
}

pub fn from_config(config: &SourceConfig) -> Box<dyn PixelSource> {
    match config.kind {
        SourceKind::Solid => Box::new(SolidFill {
            width: config.width,
            height: config.height,
            rgba: config.color,
        }),
        SourceKind::Gradient => Box::new(Gradient {
            width: config.width,
            height: config.height,
        }),
        SourceKind::Image => Box::new(match &config.path {
            Some(path) => PngImage::File(path.clone()),
            None => PngImage::Embedded,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_the_teal_800x600_fill() {
        let mut source = from_config(&SourceConfig::default());
        let fb = source.initial_framebuffer().unwrap();
        assert_eq!(fb.size(), (800, 600));
        assert!(fb.validate().is_ok());
        assert_eq!(fb.pixel(0, 0), Some([50, 200, 200, 255]));
        assert_eq!(fb.pixel(799, 599), Some([50, 200, 200, 255]));
    }

    #[test]
    fn gradient_ramps_across_both_axes() {
        let fb = Gradient {
            width: 256,
            height: 3,
        }
        .initial_framebuffer()
        .unwrap();
        assert!(fb.validate().is_ok());
        assert_eq!(fb.pixel(0, 0), Some([0, 0, 128, 255]));
        assert_eq!(fb.pixel(255, 0), Some([255, 0, 128, 255]));
        assert_eq!(fb.pixel(0, 2), Some([0, 255, 128, 255]));
        assert_eq!(fb.pixel(128, 1), Some([128, 127, 128, 255]));
    }

    #[test]
    fn degenerate_gradient_is_valid() {
        let fb = Gradient {
            width: 1,
            height: 0,
        }
        .initial_framebuffer()
        .unwrap();
        assert!(fb.is_empty());
        assert!(fb.validate().is_ok());
    }

    #[test]
    fn embedded_png_decodes_at_its_own_size() {
        let fb = PngImage::Embedded.initial_framebuffer().unwrap();
        assert_eq!(fb.size(), (64, 64));
        assert!(fb.validate().is_ok());
        assert_eq!(fb.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(fb.pixel(1, 2), Some([4, 8, 255, 255]));
        assert_eq!(fb.pixel(63, 63), Some([252, 252, 255, 255]));
    }

    #[test]
    fn image_kind_without_a_path_uses_the_embedded_png() {
        let config = SourceConfig {
            kind: SourceKind::Image,
            ..Default::default()
        };
        let fb = from_config(&config).initial_framebuffer().unwrap();
        assert_eq!(fb.size(), (64, 64));
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        let err = PngImage::Bytes(b"not a png".to_vec())
            .initial_framebuffer()
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to decode PNG image"));
    }

    #[test]
    fn missing_image_file_names_the_path() {
        let mut source = PngImage::File(PathBuf::from("/nonexistent/rgba-view.png"));
        let err = source.initial_framebuffer().unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/rgba-view.png"));
    }
}
