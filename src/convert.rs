//! RGBA8 to native surface byte layouts.
//!
//! Each window system reads a different memory layout for a 32-bit image:
//! the byte order of the channels, whether color is premultiplied by alpha,
//! the row alignment, and whether the first row in memory is the top or the
//! bottom of the image. `convert` produces exactly one buffer in the layout a
//! driver asks for.

use crate::error::Result;
use crate::framebuffer::{Framebuffer, BYTES_PER_PIXEL};

/// Byte order of the four channels of one pixel in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
    Argb,
    Abgr,
}

impl ChannelOrder {
    /// Destination byte index of R, G, B and A.
    pub fn offsets(self) -> [usize; 4] {
        match self {
            Self::Rgba => [0, 1, 2, 3],
            Self::Bgra => [2, 1, 0, 3],
            Self::Argb => [1, 2, 3, 0],
            Self::Abgr => [3, 2, 1, 0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    Straight,
    Premultiplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub order: ChannelOrder,
    pub alpha: AlphaMode,
    pub rows: RowOrder,
    /// Row stride is rounded up to a multiple of this many bytes.
    pub row_align: usize,
}

impl PixelLayout {
    /// CGImage with `kCGImageAlphaPremultipliedLast`, default byte order.
    pub const COCOA: Self = Self {
        order: ChannelOrder::Rgba,
        alpha: AlphaMode::Premultiplied,
        rows: RowOrder::TopDown,
        row_align: 4,
    };

    /// 32bpp BI_RGB device-independent bitmap, top-down (negative height).
    pub const WIN32_DIB: Self = Self {
        order: ChannelOrder::Bgra,
        alpha: AlphaMode::Straight,
        rows: RowOrder::TopDown,
        row_align: 4,
    };

    /// Layout for a 32bpp ZPixmap XImage on the given visual.
    ///
    /// Pixel values are `0x00RRGGBB` (or `0x00BBGGRR` when the red mask is
    /// the low byte); the server byte order decides how that word lands in
    /// memory. The image is built straight from these bytes, without a flip.
    pub fn for_xlib_visual(red_mask: u64, blue_mask: u64, msb_first: bool) -> Self {
        let red_low = red_mask & 0xff != 0 && blue_mask & 0xff_0000 != 0;
        let order = match (red_low, msb_first) {
            (false, false) => ChannelOrder::Bgra,
            (false, true) => ChannelOrder::Argb,
            (true, false) => ChannelOrder::Rgba,
            (true, true) => ChannelOrder::Abgr,
        };
        Self {
            order,
            alpha: AlphaMode::Straight,
            rows: RowOrder::TopDown,
            row_align: 4,
        }
    }

    /// Bytes per row for an image `width` pixels wide.
    pub fn stride(&self, width: u32) -> usize {
        let raw = width as usize * BYTES_PER_PIXEL;
        let align = self.row_align.max(1);
        raw.div_ceil(align) * align
    }

    /// Total output size for a `width` x `height` image.
    pub fn frame_len(&self, width: u32, height: u32) -> usize {
        self.stride(width) * height as usize
    }

    /// Height as a DIB header expects it: negative for top-down data.
    pub fn signed_height(&self, height: u32) -> i32 {
        let h = height.min(i32::MAX as u32) as i32;
        match self.rows {
            RowOrder::TopDown => -h,
            RowOrder::BottomUp => h,
        }
    }
}

/// A framebuffer rewritten into a native layout.
#[derive(Clone, PartialEq, Eq)]
pub struct ConvertedFrame {
    pub layout: PixelLayout,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ConvertedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertedFrame")
            .field("layout", &self.layout)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

impl ConvertedFrame {
    /// Bytes of row `y` in image space (0 is the top row), padding excluded.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stored = match self.layout.rows {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => self.height - 1 - y,
        } as usize;
        let start = stored * self.stride;
        self.bytes
            .get(start..start + self.width as usize * BYTES_PER_PIXEL)
    }
}

#[inline]
fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}

/// Converts `frame` into `layout`, allocating one output buffer.
pub fn convert(frame: &Framebuffer, layout: PixelLayout) -> Result<ConvertedFrame> {
    frame.validate()?;

    let (width, height) = frame.size();
    let stride = layout.stride(width);
    let mut bytes = vec![0u8; stride * height as usize];
    let [ri, gi, bi, ai] = layout.order.offsets();

    for (y, src_row) in frame.rows().enumerate() {
        let dst_y = match layout.rows {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => height as usize - 1 - y,
        };
        let dst_row = &mut bytes[dst_y * stride..dst_y * stride + src_row.len()];

        for (src, dst) in src_row
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(dst_row.chunks_exact_mut(BYTES_PER_PIXEL))
        {
            let (mut r, mut g, mut b, a) = (src[0], src[1], src[2], src[3]);
            if layout.alpha == AlphaMode::Premultiplied && a != u8::MAX {
                r = premultiply(r, a);
                g = premultiply(g, a);
                b = premultiply(b, a);
            }
            dst[ri] = r;
            dst[gi] = g;
            dst[bi] = b;
            dst[ai] = a;
        }
    }

    Ok(ConvertedFrame {
        layout,
        width,
        height,
        stride,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DisplayError;

    const TEAL: [u8; 4] = [50, 200, 200, 255];

    fn pixels_of(frame: &ConvertedFrame) -> Vec<[u8; 4]> {
        (0..frame.height)
            .filter_map(|y| frame.row(y))
            .flat_map(|row| row.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]]))
            .collect()
    }

    #[test]
    fn solid_color_reads_back_in_each_layout_order() {
        let fb = Framebuffer::solid(2, 2, TEAL);

        let bgra = convert(&fb, PixelLayout::WIN32_DIB).unwrap();
        assert!(pixels_of(&bgra).iter().all(|p| *p == [200, 200, 50, 255]));

        let rgba = convert(&fb, PixelLayout::COCOA).unwrap();
        assert!(pixels_of(&rgba).iter().all(|p| *p == TEAL));

        // TrueColor with a 0xff0000 red mask on a little-endian server.
        let xlib_layout = PixelLayout::for_xlib_visual(0xff0000, 0xff, false);
        assert_eq!(xlib_layout, PixelLayout::WIN32_DIB);
        let xlib = convert(&fb, xlib_layout).unwrap();
        assert_eq!(xlib.bytes, bgra.bytes);
    }

    #[test]
    fn output_length_matches_layout_for_valid_frames() {
        for (w, h) in [(0, 0), (1, 1), (3, 5), (800, 600)] {
            let fb = Framebuffer::solid(w, h, TEAL);
            for layout in [
                PixelLayout::COCOA,
                PixelLayout::WIN32_DIB,
                PixelLayout::for_xlib_visual(0xff0000, 0xff, false),
            ] {
                let out = convert(&fb, layout).unwrap();
                assert_eq!(out.bytes.len(), layout.frame_len(w, h));
                assert_eq!(out.stride, layout.stride(w));
            }
        }
    }

    #[test]
    fn mismatched_buffer_fails_with_invalid_buffer() {
        let fb = Framebuffer::from_rgba(4, 4, vec![0u8; 10]);
        let err = convert(&fb, PixelLayout::WIN32_DIB).unwrap_err();
        assert!(matches!(err, DisplayError::InvalidBuffer { actual: 10, .. }));
    }

    #[test]
    fn premultiplied_layout_scales_color_by_alpha() {
        let fb = Framebuffer::from_rgba(3, 1, vec![200, 100, 50, 128, 255, 255, 255, 0, 7, 8, 9, 255]);
        let out = convert(&fb, PixelLayout::COCOA).unwrap();
        assert_eq!(&out.bytes[0..4], &[100, 50, 25, 128]);
        assert_eq!(&out.bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&out.bytes[8..12], &[7, 8, 9, 255]);
    }

    #[test]
    fn straight_layouts_never_touch_color_under_partial_alpha() {
        let fb = Framebuffer::from_rgba(1, 1, vec![200, 100, 50, 128]);
        let out = convert(&fb, PixelLayout::WIN32_DIB).unwrap();
        assert_eq!(out.bytes, vec![50, 100, 200, 128]);
    }

    #[test]
    fn bottom_up_dib_stores_last_row_first_with_positive_height() {
        let mut pixels = Vec::new();
        pixels.extend_from_slice(&[255, 0, 0, 255]); // top row: red
        pixels.extend_from_slice(&[0, 0, 255, 255]); // bottom row: blue
        let fb = Framebuffer::from_rgba(1, 2, pixels);

        let bottom_up = PixelLayout {
            rows: RowOrder::BottomUp,
            ..PixelLayout::WIN32_DIB
        };
        let out = convert(&fb, bottom_up).unwrap();
        // First bytes in memory are the bottom (blue) row, in BGRA.
        assert_eq!(&out.bytes[0..4], &[255, 0, 0, 255]);
        assert_eq!(&out.bytes[4..8], &[0, 0, 255, 255]);
        assert_eq!(bottom_up.signed_height(2), 2);
        // Reading by image row still yields red on top.
        assert_eq!(out.row(0), Some(&[0, 0, 255, 255][..]));
    }

    #[test]
    fn top_down_dib_keeps_row_order_with_negative_height() {
        let mut pixels = Vec::new();
        pixels.extend_from_slice(&[255, 0, 0, 255]);
        pixels.extend_from_slice(&[0, 0, 255, 255]);
        let fb = Framebuffer::from_rgba(1, 2, pixels);

        let out = convert(&fb, PixelLayout::WIN32_DIB).unwrap();
        assert_eq!(&out.bytes[0..4], &[0, 0, 255, 255]);
        assert_eq!(PixelLayout::WIN32_DIB.signed_height(2), -2);
    }

    #[test]
    fn stride_is_padded_to_row_alignment() {
        let layout = PixelLayout {
            row_align: 16,
            ..PixelLayout::WIN32_DIB
        };
        assert_eq!(layout.stride(3), 16);
        let fb = Framebuffer::solid(3, 2, TEAL);
        let out = convert(&fb, layout).unwrap();
        assert_eq!(out.bytes.len(), 32);
        // Padding after each 12-byte row stays zero.
        assert!(out.bytes[12..16].iter().all(|b| *b == 0));
        assert!(out.bytes[28..32].iter().all(|b| *b == 0));
    }

    #[test]
    fn xlib_visual_masks_pick_channel_order() {
        assert_eq!(
            PixelLayout::for_xlib_visual(0xff0000, 0xff, false).order,
            ChannelOrder::Bgra
        );
        assert_eq!(
            PixelLayout::for_xlib_visual(0xff0000, 0xff, true).order,
            ChannelOrder::Argb
        );
        assert_eq!(
            PixelLayout::for_xlib_visual(0xff, 0xff0000, false).order,
            ChannelOrder::Rgba
        );
        assert_eq!(
            PixelLayout::for_xlib_visual(0xff, 0xff0000, true).order,
            ChannelOrder::Abgr
        );
    }
}
