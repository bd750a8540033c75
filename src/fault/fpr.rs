//! Floating point register readouts.
//!
//! A faulted thread's FPU registers can hold anything, including patterns
//! that are not finite numbers. Only zero and patterns with an unbiased
//! exponent in [-126, 127] are printed as values; everything else becomes a
//! dashed placeholder.

use core::fmt::{self, Write};

/// Placeholder printed instead of an unrepresentable value.
pub const PLACEHOLDER: &str = "---------";

const EXPONENT_MASK: u32 = 0x7F80_0000;
const EXPONENT_SHIFT: u32 = 23;
const EXPONENT_BIAS: i32 = 127;

/// How a single-precision register is shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FprReadout {
    /// Printable value
    Value(f32),
    /// Infinity, NaN, subnormal or negative zero
    Unrepresentable,
}

impl FprReadout {
    /// Classify a raw register pattern.
    ///
    /// Only the all-zero pattern is accepted with a zero exponent field, so
    /// negative zero and subnormals fall through to the placeholder along
    /// with infinities and NaNs.
    pub fn classify(bits: u32) -> Self {
        let exponent = ((bits & EXPONENT_MASK) >> EXPONENT_SHIFT) as i32 - EXPONENT_BIAS;

        if (-126..=127).contains(&exponent) || bits == 0 {
            FprReadout::Value(f32::from_bits(bits))
        } else {
            FprReadout::Unrepresentable
        }
    }

    /// Whether the placeholder will be shown.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, FprReadout::Unrepresentable)
    }
}

impl fmt::Display for FprReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FprReadout::Value(value) => fmt::Display::fmt(&Scientific(*value), f),
            FprReadout::Unrepresentable => f.write_str(PLACEHOLDER),
        }
    }
}

/// Scientific notation with an explicit sign, three fractional digits and a
/// signed exponent of at least two digits (`+1.000e+00`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scientific(pub f32);

impl fmt::Display for Scientific {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0.is_sign_negative() { '-' } else { '+' };

        // Longest f32 output is "3.403e-38"-shaped; 16 bytes is plenty.
        let mut digits = heapless::String::<16>::new();
        write!(digits, "{:.3e}", self.0.abs())?;

        match digits.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;
                let exp_sign = if exponent < 0 { '-' } else { '+' };
                write!(f, "{}{}e{}{:02}", sign, mantissa, exp_sign, exponent.unsigned_abs())
            }
            // inf / NaN
            None => write!(f, "{}{}", sign, digits),
        }
    }
}

/// One formatted register slot, `F02:+1.000e+00` or `F02:---------`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FprSlot {
    /// Even register number
    pub reg: usize,
    /// Classified contents
    pub readout: FprReadout,
}

impl FprSlot {
    /// Classify register `reg` holding `bits`.
    pub fn new(reg: usize, bits: u32) -> Self {
        Self {
            reg,
            readout: FprReadout::classify(bits),
        }
    }
}

impl fmt::Display for FprSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{:02}:{}", self.reg, self.readout)
    }
}
