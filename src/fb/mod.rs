//! Framebuffer primitives.
//!
//! The crash screen draws straight into a 16-bit RGBA5551 framebuffer: five
//! bits each of red, green and blue followed by a one-bit alpha/coverage
//! flag. Exactly two layouts exist, 320 and 640 pixels per row. Callers
//! always work in 320x240 logical coordinates; the high-resolution target
//! doubles everything itself.
//!
//! No clipping is performed. Every caller in this crate draws at fixed
//! coordinates inside the visible area, and an out-of-range rectangle is a
//! bug that trips the slice bounds check instead of being silently clipped.

pub mod target;

pub use target::{FramebufferTarget, HighRes, LowRes};

use crate::errors::{ScreenError, ScreenResult};
use crate::font::Glyph;
use core::ptr::NonNull;

/// Logical screen width in pixels.
pub const SCREEN_WIDTH: u16 = 320;

/// Logical screen height in pixels.
pub const SCREEN_HEIGHT: u16 = 240;

/// Color of lit glyph pixels.
pub const INK: u16 = 0xFFFF;

/// Color of unlit glyph pixels (black, alpha set).
pub const PAPER: u16 = 0x0001;

/// Keeps the top three bits of each color channel.
const DIM_MASK: u16 = 0xE738;

/// Darken one pixel.
///
/// Each channel keeps its top three bits and drops two positions, which
/// divides its intensity by four; the alpha bit is forced on. Repeated
/// application converges on [`PAPER`].
#[inline]
pub const fn dim(color: u16) -> u16 {
    ((color & DIM_MASK) >> 2) | 1
}

/// Supported framebuffer layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 320 pixels per row, one physical pixel per logical pixel
    Low,
    /// 640 pixels per row, 2x2 physical pixels per logical pixel
    High,
}

impl Resolution {
    /// Pick the layout matching a physical row width.
    pub const fn from_width(width: u16) -> Option<Self> {
        match width {
            320 => Some(Resolution::Low),
            640 => Some(Resolution::High),
            _ => None,
        }
    }

    /// Physical pixels per row.
    pub const fn width(self) -> u16 {
        match self {
            Resolution::Low => SCREEN_WIDTH,
            Resolution::High => SCREEN_WIDTH * 2,
        }
    }

    /// Physical rows of a full frame.
    pub const fn height(self) -> u16 {
        match self {
            Resolution::Low => SCREEN_HEIGHT,
            Resolution::High => SCREEN_HEIGHT * 2,
        }
    }

    /// Drawing implementation for this layout.
    pub fn target(self) -> &'static dyn FramebufferTarget {
        match self {
            Resolution::Low => &LowRes,
            Resolution::High => &HighRes,
        }
    }
}

/// A raw pixel region the crash screen draws into.
pub struct Surface {
    base: NonNull<u16>,
    len: usize,
    resolution: Resolution,
    height: u16,
}

// The region is owned by the crash screen once handed over; the pointer is
// only dereferenced through `&mut self`.
unsafe impl Send for Surface {}

impl Surface {
    /// Wrap a raw framebuffer.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `width * height` pixels
    /// for as long as the surface (or any surface re-targeted to it) lives,
    /// and nothing else may access that memory while the surface draws.
    pub unsafe fn from_raw(base: NonNull<u16>, width: u16, height: u16) -> ScreenResult<Self> {
        let resolution = Resolution::from_width(width).ok_or(ScreenError::UnsupportedWidth(width))?;

        Ok(Self {
            base,
            len: width as usize * height as usize,
            resolution,
            height,
        })
    }

    /// Wrap a borrowed-forever pixel buffer.
    ///
    /// `height` is taken from the buffer length and must fit in a `u16`.
    pub fn from_slice(pixels: &'static mut [u16], width: u16) -> ScreenResult<Self> {
        let resolution = Resolution::from_width(width).ok_or(ScreenError::UnsupportedWidth(width))?;
        let rows = pixels.len() / width as usize;
        let height = u16::try_from(rows).map_err(|_| ScreenError::FramebufferTooLarge(rows))?;

        Ok(Self {
            base: NonNull::from(&mut pixels[..]).cast(),
            len: width as usize * height as usize,
            resolution,
            height,
        })
    }

    /// Physical pixels per row.
    pub fn width(&self) -> u16 {
        self.resolution.width()
    }

    /// Physical rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Active layout.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Base address, as handed to the video interface on swap.
    pub fn as_ptr(&self) -> NonNull<u16> {
        self.base
    }

    /// Read-only view of every pixel.
    pub fn pixels(&self) -> &[u16] {
        // SAFETY: `from_raw`/`from_slice` guarantee `len` valid pixels.
        unsafe { core::slice::from_raw_parts(self.base.as_ptr(), self.len) }
    }

    /// Mutable view of every pixel.
    pub fn pixels_mut(&mut self) -> &mut [u16] {
        // SAFETY: as above, and `&mut self` makes the access exclusive.
        unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
    }

    /// Dim a rectangle given in logical coordinates.
    pub fn dim_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let target = self.resolution.target();
        target.dim_rect(self.pixels_mut(), x, y, width, height);
    }

    /// Blit one glyph with its top-left corner at logical (`x`, `y`).
    pub fn draw_glyph(&mut self, x: i32, y: i32, glyph: Glyph) {
        let target = self.resolution.target();
        target.draw_glyph(self.pixels_mut(), x, y, glyph);
    }
}

impl core::fmt::Debug for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Surface")
            .field("base", &self.base)
            .field("resolution", &self.resolution)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;
    use std::vec;

    fn channels(color: u16) -> [u16; 3] {
        [color >> 11, (color >> 6) & 0x1F, (color >> 1) & 0x1F]
    }

    #[test]
    fn test_dim_sequence_from_white() {
        assert_eq!(dim(0xFFFF), 0x39CF);
        assert_eq!(dim(0x39CF), 0x0843);
        assert_eq!(dim(0x0843), PAPER);
        assert_eq!(dim(PAPER), PAPER);
    }

    #[test]
    fn test_dim_darkens_every_channel() {
        for color in [0xFFFFu16, 0xF801, 0x07C1, 0x003F, 0x8421, 0xABCD, 0x5555, 0x1234] {
            let mut current = color;
            for _ in 0..8 {
                let next = dim(current);
                for (before, after) in channels(current).iter().zip(channels(next).iter()) {
                    assert!(after <= before, "{:#06x} -> {:#06x}", current, next);
                    if *before >= 4 {
                        assert!(after < before, "{:#06x} -> {:#06x}", current, next);
                    }
                }
                assert_eq!(next & 1, 1);
                current = next;
            }
            assert_eq!(current, PAPER);
        }
    }

    #[test]
    fn test_resolution_from_width() {
        assert_eq!(Resolution::from_width(320), Some(Resolution::Low));
        assert_eq!(Resolution::from_width(640), Some(Resolution::High));
        assert_eq!(Resolution::from_width(512), None);
        assert_eq!(Resolution::Low.height(), 240);
        assert_eq!(Resolution::High.width(), 640);
    }

    #[test]
    fn test_surface_rejects_unsupported_width() {
        let pixels = Box::leak(vec![0u16; 256 * 4].into_boxed_slice());
        assert_eq!(
            Surface::from_slice(pixels, 256).unwrap_err(),
            ScreenError::UnsupportedWidth(256)
        );
    }

    #[test]
    fn test_surface_rejects_too_many_rows() {
        let rows = u16::MAX as usize + 1;
        let pixels = Box::leak(vec![0u16; 320 * rows].into_boxed_slice());
        assert_eq!(
            Surface::from_slice(pixels, 320).unwrap_err(),
            ScreenError::FramebufferTooLarge(rows)
        );

        let pixels = Box::leak(vec![0u16; 320 * u16::MAX as usize].into_boxed_slice());
        assert_eq!(Surface::from_slice(pixels, 320).unwrap().height(), u16::MAX);
    }

    #[test]
    fn test_surface_dims_through_target() {
        let pixels = Box::leak(vec![0xFFFFu16; 320 * 240].into_boxed_slice());
        let mut surface = Surface::from_slice(pixels, 320).unwrap();
        assert_eq!(surface.height(), 240);

        surface.dim_rect(10, 20, 4, 2);

        let px = surface.pixels();
        assert_eq!(px[20 * 320 + 10], 0x39CF);
        assert_eq!(px[21 * 320 + 13], 0x39CF);
        assert_eq!(px[20 * 320 + 14], 0xFFFF);
        assert_eq!(px[22 * 320 + 10], 0xFFFF);
        assert_eq!(px[19 * 320 + 10], 0xFFFF);
    }
}
