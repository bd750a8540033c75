//! The on-screen register dump.
//!
//! A dump goes through three stages. From `Idle` it draws a one-box summary
//! on the crash framebuffer while the old picture is still on screen. After
//! the summary hold it switches the display over to the crash framebuffer
//! and fills in the full register dump, reaching `Detail`, which is final.

use super::cause::{cause_label, fpcsr_cause};
use super::context::ExceptionContext;
use super::fpr::FprSlot;
use crate::config::CrashScreenConfig;
use crate::fb::Surface;
use crate::platform::{Platform, ThreadId};
use crate::text::print_at;
use crate::time::busy_wait;
use core::fmt;
use log::debug;

/// Text origin for the left column.
const LEFT: i32 = 30;
/// Distance between register columns.
const COLUMN: i32 = 90;
/// Line pitch.
const LINE: i32 = 10;

const SUMMARY_BOX: (i32, i32, i32, i32) = (25, 20, 270, 25);
const DETAIL_BOX: (i32, i32, i32, i32) = (25, 45, 270, 185);

const GPR_TOP: i32 = 50;
const GPRS_PER_ROW: usize = 3;
const FPCSR_Y: i32 = 155;
const FPCSR_CAUSE_X: i32 = 132;
const FPR_TOP: i32 = 170;
const FPR_SLOTS: usize = 16;
const FRAGMENT_Y: i32 = 220;
const INSTRUCTION_POS: (i32, i32) = (210, 140);

/// Offset between a fragment's reported base and the address shown.
const FRAGMENT_HEADER: u32 = 0x20;

/// Placeholder label for cause codes the table does not cover.
const UNKNOWN_CAUSE: &str = "?";

/// Where a [`CrashDump`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpStage {
    /// Nothing drawn yet
    Idle,
    /// Summary box drawn, display not switched yet
    Summary,
    /// Full dump on screen
    Detail,
}

/// What the watcher found and showed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultReport {
    /// The faulted thread
    pub thread: ThreadId,
    /// Raw cause register
    pub cause: u32,
    /// Decoded cause, `None` for reserved codes
    pub cause_label: Option<&'static str>,
    /// Faulting program counter
    pub pc: u32,
    /// Bad virtual address register
    pub badvaddr: u32,
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "thread {} faulted ({}) at pc {:#010x}, va {:#010x}",
            self.thread,
            self.cause_label.unwrap_or(UNKNOWN_CAUSE),
            self.pc,
            self.badvaddr
        )
    }
}

/// Renders one faulted thread's state onto a surface.
pub struct CrashDump<'a, P: Platform + ?Sized> {
    platform: &'a P,
    config: &'a CrashScreenConfig,
    thread: ThreadId,
    context: ExceptionContext,
    stage: DumpStage,
}

impl<'a, P: Platform + ?Sized> CrashDump<'a, P> {
    /// Dump of `thread`'s saved `context`, nothing drawn yet.
    pub fn new(
        platform: &'a P,
        config: &'a CrashScreenConfig,
        thread: ThreadId,
        context: ExceptionContext,
    ) -> Self {
        Self {
            platform,
            config,
            thread,
            context,
            stage: DumpStage::Idle,
        }
    }

    /// Stage reached so far.
    pub fn stage(&self) -> DumpStage {
        self.stage
    }

    /// Registers being shown.
    pub fn context(&self) -> &ExceptionContext {
        &self.context
    }

    /// Summary of the fault, available before anything is drawn.
    pub fn report(&self) -> FaultReport {
        FaultReport {
            thread: self.thread,
            cause: self.context.cause,
            cause_label: cause_label(self.context.cause),
            pc: self.context.pc,
            badvaddr: self.context.badvaddr,
        }
    }

    /// Run the next stage. Does nothing once `Detail` is reached.
    pub fn advance(&mut self, surface: &mut Surface) -> DumpStage {
        let next = match self.stage {
            DumpStage::Idle => {
                self.platform.writeback_dcache();
                draw_summary(surface, self.thread, &self.context);
                DumpStage::Summary
            }
            DumpStage::Summary => {
                busy_wait(self.platform, self.config.get_summary_hold());

                self.platform.set_black(false);
                self.platform.set_repeat_line(false);
                self.platform.swap_buffer(surface.as_ptr());

                draw_detail(surface, self.platform, &self.context);

                busy_wait(self.platform, self.config.get_detail_hold());
                let word = self.platform.read_word(self.context.pc);
                draw_instruction_word(surface, word);
                DumpStage::Detail
            }
            DumpStage::Detail => DumpStage::Detail,
        };

        if next != self.stage {
            debug!("crash dump {:?} -> {:?}", self.stage, next);
        }
        self.stage = next;
        next
    }

    /// Advance until the full dump is on screen.
    pub fn run(&mut self, surface: &mut Surface) -> FaultReport {
        while self.advance(surface) != DumpStage::Detail {}
        self.report()
    }
}

/// Registers of one dump row, `AT:00000000H   V0:...`.
struct GprRow<'a>(&'a [(&'static str, u64)]);

impl fmt::Display for GprRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("   ")?;
            }
            write!(f, "{}:{:08X}H", name, *value as u32)?;
        }
        Ok(())
    }
}

/// Summary box with the thread id, cause and the three fault addresses.
pub fn draw_summary(surface: &mut Surface, thread: ThreadId, ctx: &ExceptionContext) {
    let (x, y, w, h) = SUMMARY_BOX;
    surface.dim_rect(x, y, w, h);

    let label = cause_label(ctx.cause).unwrap_or(UNKNOWN_CAUSE);
    crate::crash_print!(surface, LEFT, 25, "THREAD:{}  ({})", thread, label);
    crate::crash_print!(
        surface,
        LEFT,
        35,
        "PC:{:08X}H   SR:{:08X}H   VA:{:08X}H",
        ctx.pc,
        ctx.sr,
        ctx.badvaddr
    );
}

/// Everything below the summary except the instruction word.
pub fn draw_detail<P: Platform + ?Sized>(surface: &mut Surface, platform: &P, ctx: &ExceptionContext) {
    let (x, y, w, h) = DETAIL_BOX;
    surface.dim_rect(x, y, w, h);

    draw_gprs(surface, ctx);
    draw_fpcsr(surface, ctx.fpcsr);
    draw_fprs(surface, ctx);
    draw_fragments(surface, platform, ctx);
}

fn draw_gprs(surface: &mut Surface, ctx: &ExceptionContext) {
    let gprs = ctx.gprs();
    let mut y = GPR_TOP;
    for row in gprs.chunks(GPRS_PER_ROW) {
        print_at(surface, LEFT, y, format_args!("{}", GprRow(row)));
        y += LINE;
    }
}

fn draw_fpcsr(surface: &mut Surface, fpcsr: u32) {
    crate::crash_print!(surface, LEFT, FPCSR_Y, "FPCSR:{:08X}H", fpcsr);
    if let Some(label) = fpcsr_cause(fpcsr) {
        crate::crash_print!(surface, FPCSR_CAUSE_X, FPCSR_Y, "({})", label);
    }
}

fn draw_fprs(surface: &mut Surface, ctx: &ExceptionContext) {
    for slot in 0..FPR_SLOTS {
        let reg = slot * 2;
        let x = LEFT + COLUMN * (slot % 3) as i32;
        let y = FPR_TOP + LINE * (slot / 3) as i32;
        crate::crash_print!(surface, x, y, "{}", FprSlot::new(reg, ctx.fpr_bits(reg)));
    }
}

fn draw_fragments<P: Platform + ?Sized>(surface: &mut Surface, platform: &P, ctx: &ExceptionContext) {
    if let Some(base) = platform.fragment_base(ctx.pc) {
        let shown = base.get().wrapping_sub(FRAGMENT_HEADER);
        crate::crash_print!(surface, LEFT + COLUMN, FRAGMENT_Y, "F-PC:{:08X}H", shown);
    }
    if let Some(base) = platform.fragment_base(ctx.ra as u32) {
        let shown = base.get().wrapping_sub(FRAGMENT_HEADER);
        crate::crash_print!(surface, LEFT + 2 * COLUMN, FRAGMENT_Y, "F-RA:{:08X}H", shown);
    }
}

fn draw_instruction_word(surface: &mut Surface, word: u32) {
    let (x, y) = INSTRUCTION_POS;
    crate::crash_print!(surface, x, y, "MM:{:08X}H", word);
}
