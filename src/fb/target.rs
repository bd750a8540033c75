//! Per-resolution drawing.
//!
//! Each target owns its stride and scaling math so the rest of the crate
//! never branches on the framebuffer width.

use super::{dim, INK, PAPER, SCREEN_WIDTH};
use crate::font::{Glyph, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Drawing operations for one framebuffer layout.
///
/// All coordinates are logical (320x240 space). `pixels` is the whole
/// framebuffer, row-major, `width()` pixels per row.
pub trait FramebufferTarget: Sync {
    /// Physical pixels per row.
    fn width(&self) -> usize;

    /// Dim every pixel of the rectangle.
    ///
    /// A non-positive width or height draws nothing.
    fn dim_rect(&self, pixels: &mut [u16], x: i32, y: i32, width: i32, height: i32);

    /// Blit a glyph, overwriting every pixel of its cell with [`INK`] or
    /// [`PAPER`].
    fn draw_glyph(&self, pixels: &mut [u16], x: i32, y: i32, glyph: Glyph);
}

/// 320-pixel rows, one physical pixel per logical pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowRes;

/// 640-pixel rows, each logical pixel a 2x2 block.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighRes;

const LOW_STRIDE: usize = SCREEN_WIDTH as usize;
const HIGH_STRIDE: usize = SCREEN_WIDTH as usize * 2;

#[inline]
fn glyph_color(lit: bool) -> u16 {
    if lit {
        INK
    } else {
        PAPER
    }
}

fn dim_span(pixels: &mut [u16], stride: usize, x: i32, y: i32, width: i32, height: i32) {
    let width = width.max(0) as usize;
    let height = height.max(0) as usize;
    if width == 0 {
        return;
    }

    let mut start = y as usize * stride + x as usize;
    for _ in 0..height {
        for px in &mut pixels[start..start + width] {
            *px = dim(*px);
        }
        start += stride;
    }
}

impl FramebufferTarget for LowRes {
    fn width(&self) -> usize {
        LOW_STRIDE
    }

    fn dim_rect(&self, pixels: &mut [u16], x: i32, y: i32, width: i32, height: i32) {
        dim_span(pixels, LOW_STRIDE, x, y, width, height);
    }

    fn draw_glyph(&self, pixels: &mut [u16], x: i32, y: i32, glyph: Glyph) {
        let mut start = y as usize * LOW_STRIDE + x as usize;

        for row in 0..GLYPH_HEIGHT {
            let cell = &mut pixels[start..start + GLYPH_WIDTH];
            for (px, lit) in cell.iter_mut().zip(glyph.row(row)) {
                *px = glyph_color(lit);
            }
            start += LOW_STRIDE;
        }
    }
}

impl FramebufferTarget for HighRes {
    fn width(&self) -> usize {
        HIGH_STRIDE
    }

    fn dim_rect(&self, pixels: &mut [u16], x: i32, y: i32, width: i32, height: i32) {
        dim_span(pixels, HIGH_STRIDE, x * 2, y * 2, width * 2, height * 2);
    }

    fn draw_glyph(&self, pixels: &mut [u16], x: i32, y: i32, glyph: Glyph) {
        // Two physical rows per glyph row.
        let mut start = y as usize * 2 * HIGH_STRIDE + x as usize * 2;

        for row in 0..GLYPH_HEIGHT {
            let (upper, lower) = pixels[start..].split_at_mut(HIGH_STRIDE);
            for (col, lit) in glyph.row(row).enumerate() {
                let color = glyph_color(lit);
                upper[col * 2] = color;
                upper[col * 2 + 1] = color;
                lower[col * 2] = color;
                lower[col * 2 + 1] = color;
            }
            start += HIGH_STRIDE * 2;
        }
    }
}
