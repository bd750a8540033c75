//! Cycle counter rate conversion.

use super::Duration;

/// Rate of the CPU count register on the reference console (3/4 of the
/// 62.5 MHz bus clock).
pub const CPU_COUNTER_HZ: u32 = 46_875_000;

/// Tick rate of a free-running counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRate {
    hz: u32,
}

impl CounterRate {
    /// Create a rate from a frequency in Hz.
    pub const fn from_hz(hz: u32) -> Self {
        Self { hz }
    }

    /// Rate of the console CPU counter.
    pub const fn cpu_counter() -> Self {
        Self::from_hz(CPU_COUNTER_HZ)
    }

    /// Get the counter frequency in Hz.
    pub const fn hz(self) -> u32 {
        self.hz
    }

    /// Number of counter cycles covering `duration`.
    ///
    /// Computed in 128 bits; never overflows for any `Duration`.
    pub const fn cycles_for(self, duration: Duration) -> u64 {
        ((duration.as_nanos() as u128 * self.hz as u128) / 1_000_000_000) as u64
    }

    /// Convert a cycle count back to a duration.
    pub const fn duration_of(self, cycles: u64) -> Duration {
        if self.hz == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(((cycles as u128 * 1_000_000_000) / self.hz as u128) as u64)
    }
}

impl Default for CounterRate {
    fn default() -> Self {
        Self::cpu_counter()
    }
}
