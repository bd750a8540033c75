//! Thread descriptors exchanged with the host runtime.

use bitflags::bitflags;
use core::fmt;

/// Runtime thread identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(i32);

impl ThreadId {
    /// Wrap a raw runtime id.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority levels of the host runtime.
pub mod priority {
    /// Idle thread priority; never an application thread
    pub const IDLE: i32 = 0;

    /// Highest priority available to application threads
    pub const APP_MAX: i32 = 0x7F;

    /// Highest priority the runtime accepts at all
    pub const MAX: i32 = 0xFF;

    /// Default watcher priority: above idle, below application threads
    pub const WATCHER: i32 = 1;
}

bitflags! {
    /// Thread status flags set by the runtime's exception handler.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ThreadFlags: u16 {
        /// Thread stopped on a break instruction
        const CPU_BREAK = 0x0001;
        /// Thread stopped on a CPU or FPU exception
        const FAULT = 0x0002;
    }
}

/// One entry of the runtime's thread list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: ThreadId,
    /// Scheduling priority, higher runs first
    pub priority: i32,
    /// Trap state left by the exception handler
    pub flags: ThreadFlags,
}

impl ThreadInfo {
    /// Whether this looks like an application thread that trapped.
    ///
    /// Idle and system threads sit at priority 0 or at and above
    /// [`priority::APP_MAX`] and are never candidates.
    pub fn is_fault_candidate(&self) -> bool {
        self.priority > priority::IDLE
            && self.priority < priority::APP_MAX
            && self.flags.intersects(ThreadFlags::CPU_BREAK | ThreadFlags::FAULT)
    }
}

/// Events the watcher subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultEvent {
    /// A thread executed a break instruction
    CpuBreak,
    /// A thread raised a CPU exception
    Fault,
}

impl FaultEvent {
    /// Message the watcher registers for this event.
    pub const fn message(self) -> Message {
        match self {
            FaultEvent::CpuBreak => Message(1),
            FaultEvent::Fault => Message(2),
        }
    }
}

/// Opaque message word carried by a [`MessageSlot`](crate::watcher::MessageSlot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message(pub u32);

/// Everything the runtime needs to create the watcher thread.
#[derive(Clone, Copy)]
pub struct ThreadSpec {
    pub id: ThreadId,
    /// Initial scheduling priority
    pub priority: i32,
    /// One past the highest usable stack byte, 16-byte aligned
    pub stack_top: *mut u8,
    /// Thread body; never returns
    pub entry: fn(usize) -> !,
    /// Passed to `entry` unchanged
    pub arg: usize,
}

impl fmt::Debug for ThreadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadSpec")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("stack_top", &self.stack_top)
            .field("entry", &(self.entry as usize as *const ()))
            .field("arg", &format_args!("{:#x}", self.arg))
            .finish()
    }
}
