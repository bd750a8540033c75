//! `log` backend that writes to any `core::fmt::Write` sink.
//!
//! A port typically wraps its debug UART or an emulator's console port:
//!
//! ```ignore
//! static LOGGER: WriterLogger<DebugPort> = WriterLogger::new(DebugPort, LevelFilter::Debug);
//!
//! crash_screen::logging::init(&LOGGER).ok();
//! ```

use core::fmt::Write;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Logger emitting `[LEVEL] target: message` lines.
pub struct WriterLogger<W> {
    sink: Mutex<W>,
    level: LevelFilter,
}

impl<W: Write + Send> WriterLogger<W> {
    /// Logger writing records up to `level` to `sink`.
    pub const fn new(sink: W, level: LevelFilter) -> Self {
        Self {
            sink: Mutex::new(sink),
            level,
        }
    }

    /// Most verbose level this logger emits.
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl<W: Write + Send> Log for WriterLogger<W> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // A thread that faulted mid-log still holds the sink; drop the
        // record rather than spin on it forever.
        if let Some(mut sink) = self.sink.try_lock() {
            let _ = writeln!(sink, "[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install `logger` as the global logger and apply its level.
pub fn init<W: Write + Send>(logger: &'static WriterLogger<W>) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(logger.level());
    Ok(())
}
