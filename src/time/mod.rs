//! Fixed delays measured against the platform's free-running cycle counter.
//!
//! The crash screen never sleeps through the scheduler: once a fault is being
//! handled the rest of the system is considered unreliable, so every hold is a
//! busy-wait on the counter, restarted from zero for each wait.

pub mod counter;

pub use counter::CounterRate;

use crate::platform::Clock;

/// A duration of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Duration = Duration(0);

    /// Create a duration from nanoseconds.
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create a duration from microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros * 1_000)
    }

    /// Create a duration from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000_000)
    }

    /// Get nanoseconds in this duration.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Get microseconds in this duration.
    pub const fn as_micros(self) -> u64 {
        self.0 / 1_000
    }

    /// Get milliseconds in this duration.
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }
}

impl core::ops::Add for Duration {
    type Output = Self;

    fn add(self, other: Duration) -> Self {
        Self(self.0 + other.0)
    }
}

/// Spin until `duration` has elapsed on the platform counter.
///
/// The counter is reset to zero first, so nothing else may rely on its
/// absolute value once the crash screen is active.
pub fn busy_wait<C: Clock + ?Sized>(clock: &C, duration: Duration) {
    let target = clock.rate().cycles_for(duration);

    clock.reset();
    while clock.cycles() < target {
        core::hint::spin_loop();
    }
}
