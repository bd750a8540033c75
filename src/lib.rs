#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![forbid(unreachable_pub)]

//! On-device crash screen for a console runtime.
//!
//! When an application thread traps on a break instruction or a CPU
//! exception, a dedicated watcher thread suspends it and, once the operator
//! enters an unlock gesture on the controller, draws the thread's registers
//! straight into a reserved framebuffer.
//!
//! # Target Platform
//!
//! - **CPU**: 64-bit MIPS with a 32-bit-mode FPU and a free-running counter
//! - **Video**: 16-bit RGBA5551 framebuffer, 320 or 640 pixels wide
//! - **Environment**: bare-metal, hosted by an external thread runtime
//!
//! The runtime, video interface and controller are reached through the
//! traits in [`platform`]; a port implements them once.
//!
//! # Features
//!
//! - `panic-park`: install a panic handler that logs and parks the CPU
//!
//! # Quick Start
//!
//! ```ignore
//! use crash_screen::{CrashScreen, CrashScreenConfig};
//!
//! static SCREEN: CrashScreen<Console> = CrashScreen::new(Console::new(), CrashScreenConfig::new());
//!
//! fn boot() {
//!     SCREEN.init().expect("crash screen");
//! }
//! ```
//!
//! # Architecture
//!
//! - [`fb`] and [`font`]: dimming and glyph blits for both resolutions
//! - [`text`]: formatted text on top of the glyph blitter
//! - [`fault`]: exception context model and the dump renderer
//! - [`watcher`] and [`unlock`]: fault detection and the unlock gesture
//! - [`screen`]: the context object tying it all together

// Core modules
pub mod config;
pub mod errors;
pub mod fault;
pub mod fb;
pub mod font;
pub mod logging;
pub mod platform;
pub mod screen;
pub mod text;
pub mod time;
pub mod unlock;
pub mod watcher;

#[cfg(test)]
extern crate std;

#[cfg(test)]
pub mod tests;

// Parks the CPU on panic; only for final firmware images
#[cfg(all(feature = "panic-park", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo<'_>) -> ! {
    log::error!("{}", info);
    loop {
        core::hint::spin_loop();
    }
}

// ============================================================================
// Public API
// ============================================================================

// Lifecycle
pub use screen::CrashScreen;

// Configuration
pub use config::CrashScreenConfig;

// Fault decoding
pub use fault::{CrashDump, DumpStage, ExceptionContext, FaultReport};

// Drawing
pub use fb::{Resolution, Surface};

// Host interfaces
pub use platform::{Buttons, Platform, ThreadFlags, ThreadId, ThreadInfo};

// Time
pub use time::{CounterRate, Duration};

// Errors
pub use errors::{HostError, InitError, ScreenError, ScreenResult};
