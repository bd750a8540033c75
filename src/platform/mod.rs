//! Host collaborator interfaces.
//!
//! The crash screen does not own a scheduler, a video interface or a
//! controller driver. Everything it needs from the host runtime is expressed
//! here as a small trait, and a console port implements them once on a
//! single platform type.
//!
//! # Safety
//!
//! None of these traits is `unsafe`, but implementations run while another
//! thread is in a faulted state. They must not take locks that a faulted
//! application thread could be holding.

pub mod input;
pub mod thread;

pub use input::Buttons;
pub use thread::{priority, FaultEvent, Message, ThreadFlags, ThreadId, ThreadInfo, ThreadSpec};

use crate::errors::HostError;
use crate::fault::ExceptionContext;
use crate::time::CounterRate;
use crate::watcher::MessageSlot;
use core::num::NonZeroU32;
use core::ptr::NonNull;

/// Thread, scheduler and event primitives of the host runtime.
pub trait ThreadRuntime {
    /// Iterator over the runtime's thread list.
    type Threads<'a>: Iterator<Item = ThreadInfo>
    where
        Self: 'a;

    /// Create a thread that starts at `spec.entry(spec.arg)` on the given
    /// stack once started.
    fn create_thread(&self, spec: ThreadSpec) -> Result<(), HostError>;

    /// Make a created thread runnable.
    fn start_thread(&self, id: ThreadId) -> Result<(), HostError>;

    /// Remove a thread from scheduling until explicitly restarted.
    ///
    /// Must be atomic with respect to the scheduler.
    fn stop_thread(&self, id: ThreadId);

    /// Deliver `message` to `slot` whenever `event` fires.
    ///
    /// Delivery happens from trap context and must use
    /// [`MessageSlot::try_send`], then wake any thread blocked in
    /// [`wait_for_message`](Self::wait_for_message) on the same slot.
    fn set_event_message(
        &self,
        event: FaultEvent,
        slot: &'static MessageSlot,
        message: Message,
    ) -> Result<(), HostError>;

    /// Take the calling thread off the run queue until a message is posted
    /// to `slot`.
    ///
    /// Only called while `slot` is empty. May return early; the caller
    /// checks the slot again.
    fn wait_for_message(&self, slot: &MessageSlot);

    /// Idle the calling thread for a while. Called in a loop by the
    /// watcher once the dump is on screen.
    fn park(&self);

    /// Walk the global thread list in scheduler order.
    fn threads(&self) -> Self::Threads<'_>;

    /// Snapshot of the saved context of a stopped thread.
    fn context(&self, id: ThreadId) -> Option<ExceptionContext>;
}

/// Video interface controls.
pub trait VideoInterface {
    /// Force the output black, or release it.
    fn set_black(&self, black: bool);

    /// Enable or disable scan line repetition.
    fn set_repeat_line(&self, repeat: bool);

    /// Show `frame` from the next vertical blank on.
    fn swap_buffer(&self, frame: NonNull<u16>);
}

/// Controller port 0.
pub trait InputDevice {
    /// Run one read cycle and return the most recent button event, or
    /// [`Buttons::empty`] if nothing was pressed since the previous poll.
    fn poll_buttons(&self) -> Buttons;
}

/// Address-to-code-fragment lookup.
pub trait FragmentLookup {
    /// Base address of the loaded fragment containing `addr`.
    fn fragment_base(&self, addr: u32) -> Option<NonZeroU32>;
}

/// Free-running cycle counter.
pub trait Clock {
    /// Set the counter back to zero.
    fn reset(&self);

    /// Cycles since the last reset.
    fn cycles(&self) -> u64;

    /// Counter frequency.
    fn rate(&self) -> CounterRate;
}

/// Raw physical memory access.
pub trait PhysicalMemory {
    /// Installed RAM in bytes.
    fn memory_size(&self) -> usize;

    /// Uncached mapping of the 16-bit pixel at physical `offset`.
    fn uncached(&self, offset: usize) -> Option<NonNull<u16>>;

    /// Read the 32-bit word at virtual address `addr`.
    fn read_word(&self, addr: u32) -> u32;

    /// Write the whole data cache back to memory.
    fn writeback_dcache(&self);
}

/// Everything the crash screen needs from its host.
pub trait Platform:
    ThreadRuntime + VideoInterface + InputDevice + FragmentLookup + Clock + PhysicalMemory
{
}

impl<T> Platform for T where
    T: ThreadRuntime + VideoInterface + InputDevice + FragmentLookup + Clock + PhysicalMemory
{
}
