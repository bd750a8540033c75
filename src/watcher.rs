//! Fault detection: the watcher's message slot and faulted-thread selection.

use crate::errors::HostError;
use crate::platform::{FaultEvent, Message, ThreadId, ThreadInfo, ThreadRuntime};
use core::fmt;
use log::debug;
use portable_atomic::{AtomicU64, Ordering};

/// Tag marking the slot as occupied; the message sits in the low 32 bits.
const OCCUPIED: u64 = 1 << 32;

/// Returned by [`MessageSlot::try_send`] when a message is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull(pub Message);

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message slot full, dropped message {}", (self.0).0)
    }
}

/// Single-entry mailbox the host's trap handler posts fault events to.
///
/// The receiving side sleeps in the host's
/// [`wait_for_message`](ThreadRuntime::wait_for_message). Sending never blocks. While a message is pending further sends fail,
/// which loses nothing: the pending message already wakes the watcher and
/// the watcher rescans the whole thread list anyway.
#[derive(Debug)]
pub struct MessageSlot {
    state: AtomicU64,
}

impl MessageSlot {
    /// An empty slot.
    pub const fn new() -> Self {
        Self {
            state: AtomicU64::new(0),
        }
    }

    /// Post `message` if the slot is empty. Safe to call from trap context.
    pub fn try_send(&self, message: Message) -> Result<(), QueueFull> {
        self.state
            .compare_exchange(
                0,
                OCCUPIED | message.0 as u64,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| QueueFull(message))
    }

    /// Take the pending message, if any.
    pub fn try_recv(&self) -> Option<Message> {
        let state = self.state.swap(0, Ordering::AcqRel);
        if state & OCCUPIED != 0 {
            Some(Message(state as u32))
        } else {
            None
        }
    }

    /// Block the calling thread until a message arrives and take it.
    pub fn recv<R: ThreadRuntime + ?Sized>(&self, runtime: &R) -> Message {
        loop {
            if let Some(message) = self.try_recv() {
                return message;
            }
            runtime.wait_for_message(self);
        }
    }

    /// Whether no message is pending.
    pub fn is_empty(&self) -> bool {
        self.state.load(Ordering::Acquire) & OCCUPIED == 0
    }
}

impl Default for MessageSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscribe `slot` to break and fault events.
pub fn register_events<R: ThreadRuntime + ?Sized>(
    runtime: &R,
    slot: &'static MessageSlot,
) -> Result<(), HostError> {
    for event in [FaultEvent::CpuBreak, FaultEvent::Fault] {
        runtime.set_event_message(event, slot, event.message())?;
    }
    Ok(())
}

/// First application thread in the runtime's list that has trapped.
///
/// `watcher` is never selected, whatever its priority and flags.
pub fn find_faulted_thread<R: ThreadRuntime + ?Sized>(
    runtime: &R,
    watcher: ThreadId,
) -> Option<ThreadInfo> {
    runtime
        .threads()
        .find(|thread| thread.id != watcher && thread.is_fault_candidate())
}

/// Block until a fault event names a faulted application thread.
///
/// Wakeups that find no candidate are spurious and go back to waiting.
pub fn wait_for_fault<R: ThreadRuntime + ?Sized>(
    runtime: &R,
    slot: &MessageSlot,
    watcher: ThreadId,
) -> ThreadInfo {
    loop {
        let message = slot.recv(runtime);
        debug!("watcher woken by message {}", message.0);

        match find_faulted_thread(runtime, watcher) {
            Some(thread) => return thread,
            None => debug!("spurious wakeup, no faulted thread"),
        }
    }
}
