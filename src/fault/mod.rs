//! Decoding and drawing of a faulted thread's state.

pub mod cause;
pub mod context;
pub mod dump;
pub mod fpr;

pub use cause::{cause_index, cause_label, fpcsr_cause, FAULT_CAUSES, FPCSR_CAUSES};
pub use context::{ExceptionContext, FpRegisterPair, GPR_COUNT};
pub use dump::{CrashDump, DumpStage, FaultReport};
pub use fpr::{FprReadout, FprSlot, Scientific, PLACEHOLDER};
