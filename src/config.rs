//! Crash screen configuration.

use crate::errors::{ScreenError, ScreenResult};
use crate::fb::Resolution;
use crate::platform::{priority, ThreadId};
use crate::time::Duration;
use crate::unlock::UnlockSequence;

/// Default thread id of the watcher.
pub const WATCHER_THREAD_ID: ThreadId = ThreadId::new(2);

/// Size of the watcher's stack in bytes.
pub const WATCHER_STACK_SIZE: usize = 0x800;

/// Tunables for a [`CrashScreen`](crate::screen::CrashScreen).
///
/// Built with `const` setters so it can live in a `static`:
///
/// ```
/// use crash_screen::{CrashScreenConfig, Duration, Resolution};
///
/// const CONFIG: CrashScreenConfig = CrashScreenConfig::new()
///     .resolution(Resolution::High)
///     .summary_hold(Duration::from_millis(500));
///
/// assert!(CONFIG.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashScreenConfig {
    resolution: Resolution,
    watcher_id: ThreadId,
    watcher_priority: i32,
    summary_hold: Duration,
    detail_hold: Duration,
    poll_interval: Duration,
    unlock_sequence: UnlockSequence,
}

impl CrashScreenConfig {
    /// Low resolution, 2 s summary hold, 500 ms detail hold, 10 ms polling
    /// and the standard unlock gesture.
    pub const fn new() -> Self {
        Self {
            resolution: Resolution::Low,
            watcher_id: WATCHER_THREAD_ID,
            watcher_priority: priority::WATCHER,
            summary_hold: Duration::from_millis(2000),
            detail_hold: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
            unlock_sequence: UnlockSequence::standard(),
        }
    }

    /// Layout of the reserved crash framebuffer.
    pub const fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Thread id requested for the watcher.
    pub const fn watcher_id(mut self, id: ThreadId) -> Self {
        self.watcher_id = id;
        self
    }

    /// Priority of the watcher thread. Must be in `1..=MAX`.
    pub const fn watcher_priority(mut self, priority: i32) -> Self {
        self.watcher_priority = priority;
        self
    }

    /// How long the summary line stays up before the full dump.
    pub const fn summary_hold(mut self, hold: Duration) -> Self {
        self.summary_hold = hold;
        self
    }

    /// Delay between the register dump and the instruction word readout.
    pub const fn detail_hold(mut self, hold: Duration) -> Self {
        self.detail_hold = hold;
        self
    }

    /// Controller polling period while waiting for the unlock gesture.
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Gesture that has to be entered before the dump is drawn.
    pub const fn unlock_sequence(mut self, sequence: UnlockSequence) -> Self {
        self.unlock_sequence = sequence;
        self
    }

    /// Configured [`resolution`](Self::resolution).
    pub const fn get_resolution(&self) -> Resolution {
        self.resolution
    }

    /// Configured [`watcher_id`](Self::watcher_id).
    pub const fn get_watcher_id(&self) -> ThreadId {
        self.watcher_id
    }

    /// Configured [`watcher_priority`](Self::watcher_priority).
    pub const fn get_watcher_priority(&self) -> i32 {
        self.watcher_priority
    }

    /// Configured [`summary_hold`](Self::summary_hold).
    pub const fn get_summary_hold(&self) -> Duration {
        self.summary_hold
    }

    /// Configured [`detail_hold`](Self::detail_hold).
    pub const fn get_detail_hold(&self) -> Duration {
        self.detail_hold
    }

    /// Configured [`poll_interval`](Self::poll_interval).
    pub const fn get_poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Configured [`unlock_sequence`](Self::unlock_sequence).
    pub const fn get_unlock_sequence(&self) -> UnlockSequence {
        self.unlock_sequence
    }

    /// Check the settings the host would otherwise reject at thread creation.
    pub fn validate(&self) -> ScreenResult<()> {
        if self.watcher_priority <= priority::IDLE || self.watcher_priority > priority::MAX {
            return Err(ScreenError::InvalidPriority(self.watcher_priority));
        }
        if !self.unlock_sequence.is_completable() {
            return Err(ScreenError::InvalidUnlockSequence);
        }
        Ok(())
    }
}

impl Default for CrashScreenConfig {
    fn default() -> Self {
        Self::new()
    }
}
