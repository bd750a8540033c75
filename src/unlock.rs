//! Button gesture that has to be entered before the dump is shown.
//!
//! The gate keeps a single cursor into the sequence. A press that matches the
//! expected step moves it forward, any other press sends it back to the
//! start, and polls that report no press leave it alone.

use crate::platform::{Buttons, Clock, InputDevice};
use crate::time::{busy_wait, Duration};
use log::trace;

/// D-pad, then C buttons, then B and A.
pub const DEFAULT_SEQUENCE: [Buttons; 10] = [
    Buttons::UP,
    Buttons::DOWN,
    Buttons::LEFT,
    Buttons::RIGHT,
    Buttons::C_UP,
    Buttons::C_DOWN,
    Buttons::C_LEFT,
    Buttons::C_RIGHT,
    Buttons::B,
    Buttons::A,
];

/// Ordered list of button events that unlocks the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockSequence {
    steps: &'static [Buttons],
}

impl UnlockSequence {
    /// Sequence over `steps`, each compared against whole button events.
    pub const fn new(steps: &'static [Buttons]) -> Self {
        Self { steps }
    }

    /// The ten-step default gesture.
    pub const fn standard() -> Self {
        Self::new(&DEFAULT_SEQUENCE)
    }

    /// Button events in the order they have to be entered.
    pub const fn steps(&self) -> &'static [Buttons] {
        self.steps
    }

    /// Number of steps.
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there are no steps at all.
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the sequence can ever be completed.
    ///
    /// Empty button events are ignored by the matcher, so a step with no
    /// buttons could never match.
    pub fn is_completable(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|step| !step.is_empty())
    }
}

impl Default for UnlockSequence {
    fn default() -> Self {
        Self::standard()
    }
}

/// Outcome of feeding one button event to the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// No press; cursor unchanged
    Ignored,
    /// Expected press; cursor now at the given step
    Advanced(usize),
    /// Wrong press; cursor back at zero
    Reset,
    /// Last step matched
    Unlocked,
}

/// Cursor over an [`UnlockSequence`].
#[derive(Debug, Clone)]
pub struct UnlockMatcher {
    sequence: UnlockSequence,
    cursor: usize,
}

impl UnlockMatcher {
    /// Matcher at the first step of `sequence`.
    pub const fn new(sequence: UnlockSequence) -> Self {
        Self { sequence, cursor: 0 }
    }

    /// Steps matched so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether every step has been matched.
    pub fn is_unlocked(&self) -> bool {
        self.cursor >= self.sequence.len()
    }

    /// Feed the latest button event.
    ///
    /// A mismatching press resets the cursor without being compared against
    /// the first step again, so `UP, UP, DOWN` does not count as progress.
    pub fn feed(&mut self, pressed: Buttons) -> Progress {
        if self.is_unlocked() {
            return Progress::Unlocked;
        }
        if pressed.is_empty() {
            return Progress::Ignored;
        }

        if pressed == self.sequence.steps()[self.cursor] {
            self.cursor += 1;
            if self.is_unlocked() {
                Progress::Unlocked
            } else {
                Progress::Advanced(self.cursor)
            }
        } else {
            self.cursor = 0;
            Progress::Reset
        }
    }
}

/// Block until `sequence` has been entered on controller port 0.
///
/// Polls once every `poll_interval`. Never returns for a sequence that is
/// not [completable](UnlockSequence::is_completable).
pub fn wait_for_unlock<P>(platform: &P, sequence: UnlockSequence, poll_interval: Duration)
where
    P: InputDevice + Clock + ?Sized,
{
    let mut matcher = UnlockMatcher::new(sequence);

    loop {
        let pressed = platform.poll_buttons();
        match matcher.feed(pressed) {
            Progress::Unlocked => {
                trace!("unlock sequence complete");
                return;
            }
            Progress::Advanced(step) => trace!("unlock step {}/{}", step, sequence.len()),
            Progress::Reset => trace!("unlock sequence reset by {:?}", pressed),
            Progress::Ignored => {}
        }

        busy_wait(platform, poll_interval);
    }
}
