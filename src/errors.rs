//! Error types for crash screen configuration and lifecycle.
//!
//! Only setup can fail. Everything that happens after a fault has been
//! detected is infallible by construction: the screen either draws or the
//! caller broke a documented invariant.

use core::fmt;

/// Result type for crash screen operations.
pub type ScreenResult<T> = Result<T, ScreenError>;

/// Top-level error type for the crash screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenError {
    /// Initialization errors
    Init(InitError),
    /// Errors reported by the host runtime
    Host(HostError),
    /// Framebuffer width other than the two supported resolutions
    UnsupportedWidth(u16),
    /// Pixel buffer with more rows than a surface can address
    FramebufferTooLarge(usize),
    /// Watcher priority outside the range the host accepts
    InvalidPriority(i32),
    /// Unlock sequence with no steps, or with a step no button can match
    InvalidUnlockSequence,
}

/// Errors that can occur while bringing the crash screen up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// `init` was already called once
    AlreadyInitialized,
    /// Physical memory is too small to carve out the crash framebuffer
    MemoryTooSmall {
        /// Bytes of physical memory reported by the platform
        available: usize,
        /// Bytes the framebuffer needs
        required: usize,
    },
    /// The platform returned a null uncached mapping
    FramebufferUnmapped(usize),
}

/// Failures reported by the host runtime's thread primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostError {
    /// The runtime refused to create the watcher thread
    ThreadCreate,
    /// The runtime refused to start the watcher thread
    ThreadStart,
    /// Event registration against the message slot failed
    EventRegistration,
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenError::Init(e) => write!(f, "Crash screen init error: {}", e),
            ScreenError::Host(e) => write!(f, "Host runtime error: {}", e),
            ScreenError::UnsupportedWidth(width) => {
                write!(f, "Unsupported framebuffer width: {} (expected 320 or 640)", width)
            }
            ScreenError::FramebufferTooLarge(rows) => {
                write!(f, "Framebuffer too large: {} rows (at most {})", rows, u16::MAX)
            }
            ScreenError::InvalidPriority(prio) => write!(f, "Invalid watcher priority: {}", prio),
            ScreenError::InvalidUnlockSequence => write!(f, "Unlock sequence cannot be completed"),
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::AlreadyInitialized => write!(f, "Crash screen already initialized"),
            InitError::MemoryTooSmall { available, required } => write!(
                f,
                "Physical memory too small: {:#x} bytes available, {:#x} required",
                available, required
            ),
            InitError::FramebufferUnmapped(offset) => {
                write!(f, "No uncached mapping for framebuffer at {:#x}", offset)
            }
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::ThreadCreate => write!(f, "Failed to create watcher thread"),
            HostError::ThreadStart => write!(f, "Failed to start watcher thread"),
            HostError::EventRegistration => write!(f, "Failed to register fault events"),
        }
    }
}

impl From<InitError> for ScreenError {
    fn from(error: InitError) -> Self {
        ScreenError::Init(error)
    }
}

impl From<HostError> for ScreenError {
    fn from(error: HostError) -> Self {
        ScreenError::Host(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn test_display_messages() {
        let mut buf = heapless::String::<128>::new();
        write!(buf, "{}", ScreenError::UnsupportedWidth(512)).unwrap();
        assert_eq!(buf.as_str(), "Unsupported framebuffer width: 512 (expected 320 or 640)");

        buf.clear();
        write!(buf, "{}", ScreenError::FramebufferTooLarge(70_000)).unwrap();
        assert_eq!(buf.as_str(), "Framebuffer too large: 70000 rows (at most 65535)");

        buf.clear();
        let err: ScreenError = InitError::MemoryTooSmall { available: 0x100, required: 0x25800 }.into();
        write!(buf, "{}", err).unwrap();
        assert_eq!(
            buf.as_str(),
            "Crash screen init error: Physical memory too small: 0x100 bytes available, 0x25800 required"
        );
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(
            ScreenError::from(HostError::ThreadCreate),
            ScreenError::Host(HostError::ThreadCreate)
        );
        assert_eq!(
            ScreenError::from(InitError::AlreadyInitialized),
            ScreenError::Init(InitError::AlreadyInitialized)
        );
    }
}
