//! Bitmap font for the crash screen.
//!
//! 45 glyphs, each 6 pixels wide and 7 rows tall. Glyphs are packed five to
//! a group: a group is 7 consecutive 32-bit words, one per row, and glyph `n`
//! of the group occupies bits `31 - 6n` down to `26 - 6n` of every word.
//! The two low bits of each word are unused.
//!
//! Digits, upper-case letters and a handful of punctuation marks are
//! covered. Lower-case letters share the upper-case shapes. Everything else,
//! including space, has no glyph and leaves the framebuffer untouched.

/// Width of a glyph cell in pixels.
pub const GLYPH_WIDTH: usize = 6;

/// Height of a glyph cell in pixels.
pub const GLYPH_HEIGHT: usize = 7;

/// Horizontal cursor advance per character, in logical pixels.
pub const ADVANCE: i32 = GLYPH_WIDTH as i32;

/// Glyphs sharing one group of row words.
pub const GLYPHS_PER_GROUP: usize = 5;

/// Number of glyphs in the atlas.
pub const GLYPH_COUNT: usize = 45;

/// Character table value for characters without a glyph.
pub const NO_GLYPH: u8 = 0xFF;

/// Packed glyph rows, 7 words per group of 5 glyphs.
static FONT: [u32; 64] = [
    0x70871C30, 0x8988A250, 0x88808290, 0x88831C90, 0x888402F8, 0x88882210, 0x71CF9C10, 0xF9CF9C70,
    0x8228A288, 0xF200A288, 0x0BC11C78, 0x0A222208, 0x8A222288, 0x71C21C70, 0x23C738F8, 0x5228A480,
    0x8A282280, 0x8BC822F0, 0xFA282280, 0x8A28A480, 0x8BC738F8, 0xF9C89C08, 0x82288808, 0x82088808,
    0xF2EF8808, 0x82288888, 0x82288888, 0x81C89C70, 0x8A08A270, 0x920DA288, 0xA20AB288, 0xC20AAA88,
    0xA208A688, 0x9208A288, 0x8BE8A270, 0xF1CF1CF8, 0x8A28A220, 0x8A28A020, 0xF22F1C20, 0x82AA0220,
    0x82492220, 0x81A89C20, 0x8A28A288, 0x8A28A288, 0x8A289488, 0x8A2A8850, 0x894A9420, 0x894AA220,
    0x70852220, 0xF8011000, 0x08020800, 0x10840400, 0x20040470, 0x40840400, 0x80020800, 0xF8011000,
    0x70800000, 0x88822200, 0x08820400, 0x108F8800, 0x20821000, 0x00022200, 0x20800020, 0x00000000,
];

/// 7-bit ASCII to glyph index.
///
/// 0-9 -> 0..=9, A-Z and a-z -> 10..=35, then `:` 36, `(` 37, `)` 38,
/// `-` 39, `?` 40, `!` 41, `+` 42, `%` 43, `.` 44.
static CHAR_TO_GLYPH: [u8; 128] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x29, 0xFF, 0xFF, 0xFF, 0x2B, 0xFF, 0xFF, 0x25, 0x26, 0xFF, 0x2A, 0xFF, 0x27, 0x2C, 0xFF,
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x24, 0xFF, 0xFF, 0xFF, 0xFF, 0x28,
    0xFF, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
    0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, 0x20, 0x21, 0x22, 0x23, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
    0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, 0x20, 0x21, 0x22, 0x23, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// One renderable cell of the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Glyph(u8);

impl Glyph {
    /// Look up the glyph for a byte of formatted text.
    ///
    /// Only the low 7 bits take part in the lookup, so bytes with the high
    /// bit set alias their ASCII counterparts.
    #[inline]
    pub fn for_byte(byte: u8) -> Option<Glyph> {
        match CHAR_TO_GLYPH[(byte & 0x7F) as usize] {
            NO_GLYPH => None,
            index => Some(Glyph(index)),
        }
    }

    /// Build a glyph from a raw atlas index.
    pub fn from_index(index: u8) -> Option<Glyph> {
        if (index as usize) < GLYPH_COUNT {
            Some(Glyph(index))
        } else {
            None
        }
    }

    /// Raw atlas index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Packed row word for `row` (0..7), shared with the other glyphs of
    /// the group.
    #[inline]
    pub fn row_word(self, row: usize) -> u32 {
        FONT[self.0 as usize / GLYPHS_PER_GROUP * GLYPH_HEIGHT + row]
    }

    /// First bit of this glyph inside a row word.
    #[inline]
    pub fn lead_bit(self) -> u32 {
        0x8000_0000u32 >> ((self.0 as usize % GLYPHS_PER_GROUP) * GLYPH_WIDTH)
    }

    /// Whether the pixel at (`row`, `col`) is lit.
    #[inline]
    pub fn is_lit(self, row: usize, col: usize) -> bool {
        self.row_word(row) & (self.lead_bit() >> col) != 0
    }

    /// Iterate over the lit state of one row, left to right.
    pub fn row(self, row: usize) -> impl Iterator<Item = bool> {
        let word = self.row_word(row);
        let lead = self.lead_bit();
        (0..GLYPH_WIDTH).map(move |col| word & (lead >> col) != 0)
    }
}
