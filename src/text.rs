//! Text output on the crash surface.
//!
//! Text is formatted into a fixed 256-byte buffer and then drawn one byte at
//! a time with a fixed 6-pixel advance. There is no wrapping, no control
//! character handling and no clipping.

use crate::fb::Surface;
use crate::font::{Glyph, ADVANCE, GLYPH_WIDTH};
use core::fmt::{self, Write};

/// Capacity of the formatting buffer in bytes.
pub const LINE_CAPACITY: usize = 0x100;

/// Height of the box dimmed behind bordered text.
const BACKGROUND_HEIGHT: i32 = 19;

/// Margin between bordered text and its box edge.
const BACKGROUND_MARGIN: i32 = GLYPH_WIDTH as i32;

/// Fixed-capacity formatting target.
///
/// Output past [`LINE_CAPACITY`] bytes is dropped; formatting never fails
/// because of it.
#[derive(Default)]
pub struct LineBuffer {
    bytes: heapless::Vec<u8, LINE_CAPACITY>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            bytes: heapless::Vec::new(),
        }
    }

    /// Format `args` into a fresh buffer.
    pub fn format(args: fmt::Arguments<'_>) -> Self {
        let mut line = Self::new();
        // `write_str` below never reports an error; a failing `Display` impl
        // simply leaves whatever it wrote so far.
        let _ = line.write_fmt(args);
        line
    }

    /// Formatted bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of formatted bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was formatted.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = LINE_CAPACITY - self.bytes.len();
        let take = s.len().min(room);
        // Cannot fail: `take` fits by construction.
        let _ = self.bytes.extend_from_slice(&s.as_bytes()[..take]);
        Ok(())
    }
}

fn draw_line(surface: &mut Surface, mut x: i32, y: i32, line: &[u8]) {
    for &byte in line {
        if let Some(glyph) = Glyph::for_byte(byte) {
            surface.draw_glyph(x, y, glyph);
        }
        x += ADVANCE;
    }
}

/// Draw formatted text with its first cell at (`x`, `y`).
///
/// Returns the number of characters laid out. Characters without a glyph
/// still take up a cell.
pub fn print_at(surface: &mut Surface, x: i32, y: i32, args: fmt::Arguments<'_>) -> usize {
    let line = LineBuffer::format(args);
    if line.is_empty() {
        return 0;
    }

    draw_line(surface, x, y, line.as_bytes());
    line.len()
}

/// Draw formatted text on a dimmed box one cell wider than the text on each
/// side.
///
/// The box is dimmed before any glyph is drawn so the text itself is never
/// darkened.
pub fn print_at_with_background(
    surface: &mut Surface,
    x: i32,
    y: i32,
    args: fmt::Arguments<'_>,
) -> usize {
    let line = LineBuffer::format(args);
    if line.is_empty() {
        return 0;
    }

    let cells = line.len() as i32 + 2;
    surface.dim_rect(
        x - BACKGROUND_MARGIN,
        y - BACKGROUND_MARGIN,
        cells * ADVANCE,
        BACKGROUND_HEIGHT,
    );
    draw_line(surface, x, y, line.as_bytes());
    line.len()
}

/// Print formatted text on a [`Surface`](crate::fb::Surface).
///
/// # Example
///
/// ```ignore
/// crash_print!(surface, 30, 25, "THREAD:{}", id);
/// ```
#[macro_export]
macro_rules! crash_print {
    ($surface:expr, $x:expr, $y:expr, $($arg:tt)*) => {
        $crate::text::print_at($surface, $x, $y, format_args!($($arg)*))
    };
}

/// Print formatted text on a dimmed box.
#[macro_export]
macro_rules! crash_print_bg {
    ($surface:expr, $x:expr, $y:expr, $($arg:tt)*) => {
        $crate::text::print_at_with_background($surface, $x, $y, format_args!($($arg)*))
    };
}
