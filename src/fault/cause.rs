//! Exception cause decoding.

/// Labels for the CPU exception codes, indexed by [`cause_index`].
pub static FAULT_CAUSES: [&str; 18] = [
    "Interrupt",
    "TLB modification",
    "TLB exception on load",
    "TLB exception on store",
    "Address error on load",
    "Address error on store",
    "Bus error on inst.",
    "Bus error on data",
    "System call exception",
    "Breakpoint exception",
    "Reserved instruction",
    "Coprocessor unusable",
    "Arithmetic overflow",
    "Trap exception",
    "Virtual coherency on inst.",
    "Floating point exception",
    "Watchpoint exception",
    "Virtual coherency on data",
];

/// Labels for the FPCSR cause bits, most significant first.
pub static FPCSR_CAUSES: [&str; 6] = [
    "Unimplemented operation",
    "Invalid operation",
    "Division by zero",
    "Overflow",
    "Underflow",
    "Inexact operation",
];

/// Exception code of a watchpoint hit.
const EXC_WATCH: u32 = 23;
/// Exception code of a data virtual-coherency exception.
const EXC_VCED: u32 = 31;

/// Highest FPCSR cause bit ("unimplemented operation").
const FPCSR_CAUSE_TOP: u32 = 17;

/// Table slot for the exception code held in a cause register.
///
/// The code is bits 6..2 of the register. Codes 23 (watchpoint) and 31
/// (virtual coherency on data) are folded into slots 16 and 17 because the
/// table is dense while the hardware encoding is not. This folding is part
/// of the encoding and must stay as is.
pub const fn cause_index(cause: u32) -> usize {
    match (cause >> 2) & 0x1F {
        EXC_WATCH => 16,
        EXC_VCED => 17,
        code => code as usize,
    }
}

/// Label for a cause register value.
///
/// Codes 18..=30 other than 23 are reserved by the hardware and have no
/// label.
pub fn cause_label(cause: u32) -> Option<&'static str> {
    FAULT_CAUSES.get(cause_index(cause)).copied()
}

/// First FPU exception cause set in `fpcsr`, scanning bit 17 down to 12.
pub fn fpcsr_cause(fpcsr: u32) -> Option<&'static str> {
    FPCSR_CAUSES
        .iter()
        .enumerate()
        .find(|(i, _)| fpcsr & (1 << (FPCSR_CAUSE_TOP - *i as u32)) != 0)
        .map(|(_, label)| *label)
}
