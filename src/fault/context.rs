//! Register state captured by the host's exception handler.

/// One 64-bit floating point register pair as the runtime saves it.
///
/// The console's FPU runs in 32-bit register mode: each even register holds
/// a single-precision value and its odd partner is saved alongside it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FpRegisterPair {
    /// Odd register of the pair
    pub odd: u32,
    /// Even register of the pair, the one the dump shows
    pub even: u32,
}

impl FpRegisterPair {
    /// Single-precision pattern of the even register.
    pub const fn bits(&self) -> u32 {
        self.even
    }
}

/// Saved thread context of the faulted thread.
///
/// Laid out like the runtime's own thread context so a platform can hand out
/// a reference to it directly. Valid only while the thread stays suspended.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExceptionContext {
    // General registers, named after their ABI roles
    pub at: u64,
    pub v0: u64,
    pub v1: u64,
    pub a0: u64,
    pub a1: u64,
    pub a2: u64,
    pub a3: u64,
    pub t0: u64,
    pub t1: u64,
    pub t2: u64,
    pub t3: u64,
    pub t4: u64,
    pub t5: u64,
    pub t6: u64,
    pub t7: u64,
    pub s0: u64,
    pub s1: u64,
    pub s2: u64,
    pub s3: u64,
    pub s4: u64,
    pub s5: u64,
    pub s6: u64,
    pub s7: u64,
    pub t8: u64,
    pub t9: u64,
    pub gp: u64,
    pub sp: u64,
    pub s8: u64,
    pub ra: u64,
    pub lo: u64,
    pub hi: u64,
    /// Status register
    pub sr: u32,
    /// Program counter at the fault
    pub pc: u32,
    /// Cause register
    pub cause: u32,
    /// Faulting virtual address for address and TLB errors
    pub badvaddr: u32,
    /// RCP interrupt mask
    pub rcp: u32,
    /// FPU control/status register
    pub fpcsr: u32,
    /// Floating point registers f0/f1 through f30/f31
    pub fp: [FpRegisterPair; 16],
}

/// Number of general registers shown in the dump.
pub const GPR_COUNT: usize = 29;

impl ExceptionContext {
    /// General registers in dump order, each with its two-letter label.
    pub fn gprs(&self) -> [(&'static str, u64); GPR_COUNT] {
        [
            ("AT", self.at),
            ("V0", self.v0),
            ("V1", self.v1),
            ("A0", self.a0),
            ("A1", self.a1),
            ("A2", self.a2),
            ("A3", self.a3),
            ("T0", self.t0),
            ("T1", self.t1),
            ("T2", self.t2),
            ("T3", self.t3),
            ("T4", self.t4),
            ("T5", self.t5),
            ("T6", self.t6),
            ("T7", self.t7),
            ("S0", self.s0),
            ("S1", self.s1),
            ("S2", self.s2),
            ("S3", self.s3),
            ("S4", self.s4),
            ("S5", self.s5),
            ("S6", self.s6),
            ("S7", self.s7),
            ("T8", self.t8),
            ("T9", self.t9),
            ("GP", self.gp),
            ("SP", self.sp),
            ("S8", self.s8),
            ("RA", self.ra),
        ]
    }

    /// Single-precision bit pattern of even register `fN`.
    ///
    /// # Panics
    ///
    /// Panics if `reg` is odd or above 30.
    pub fn fpr_bits(&self, reg: usize) -> u32 {
        assert!(reg % 2 == 0, "odd FPU register f{}", reg);
        self.fp[reg / 2].bits()
    }
}
