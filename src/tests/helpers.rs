//! Simulated host platform and framebuffer readback for tests.

#[cfg(test)]
use crate::errors::HostError;
#[cfg(test)]
use crate::fault::ExceptionContext;
#[cfg(test)]
use crate::fb::{Surface, INK, PAPER};
#[cfg(test)]
use crate::font::{Glyph, ADVANCE, GLYPH_COUNT, GLYPH_HEIGHT, GLYPH_WIDTH};
#[cfg(test)]
use crate::platform::{
    Buttons, Clock, FaultEvent, FragmentLookup, InputDevice, Message, PhysicalMemory, ThreadId,
    ThreadFlags, ThreadInfo, ThreadRuntime, ThreadSpec, VideoInterface,
};
#[cfg(test)]
use crate::time::CounterRate;
#[cfg(test)]
use crate::watcher::MessageSlot;
#[cfg(test)]
use core::num::NonZeroU32;
#[cfg(test)]
use core::ptr::NonNull;
#[cfg(test)]
use portable_atomic::{AtomicU64, AtomicUsize, Ordering};
#[cfg(test)]
use spin::Mutex;
#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::string::String;
#[cfg(test)]
use std::vec::Vec;

/// Counter frequency of the simulated clock: one cycle per millisecond.
#[cfg(test)]
pub const SIM_COUNTER_HZ: u32 = 1_000;

/// Polls of an exhausted input script before a test is declared hung.
#[cfg(test)]
const MAX_IDLE_POLLS: usize = 10_000;

/// Waits with no scripted event before a test is declared hung.
#[cfg(test)]
const MAX_IDLE_WAITS: usize = 10_000;

#[cfg(test)]
/// Initial framebuffer color; neither ink, paper nor a dimmed shade of either.
pub const BACKDROP: u16 = 0x7BDE;

#[cfg(test)]
/// Video interface call, in the order they were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCall {
    Black(bool),
    RepeatLine(bool),
    Swap(usize),
}

#[cfg(test)]
/// Host call that takes time or has a visible effect, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Controller poll and the event it returned
    Poll(Buttons),
    /// Counter reset followed by a busy-wait; the last cycle count read
    Hold(u64),
    Writeback,
    Video(VideoCall),
    ReadWord(u32),
}

#[cfg(test)]
/// In-memory stand-in for the console runtime.
///
/// Fault events queued with [`SimPlatform::raise`] or [`SimPlatform::trap`]
/// are delivered one per `wait_for_message`, which is where a real runtime
/// would switch to the trapping thread.
pub struct SimPlatform {
    threads: Mutex<Vec<ThreadInfo>>,
    contexts: Mutex<Vec<(ThreadId, ExceptionContext)>>,
    pub created: Mutex<Vec<(ThreadId, i32)>>,
    pub started: Mutex<Vec<ThreadId>>,
    pub stopped: Mutex<Vec<ThreadId>>,
    registrations: Mutex<Vec<(FaultEvent, &'static MessageSlot, Message)>>,
    events: Mutex<VecDeque<(FaultEvent, Option<(ThreadId, ThreadFlags)>)>>,
    pub dropped_events: AtomicUsize,
    pub waits: AtomicUsize,
    idle_waits: AtomicUsize,
    input: Mutex<VecDeque<Buttons>>,
    pub polls: AtomicUsize,
    timeline: Mutex<Vec<SimEvent>>,
    fragments: Mutex<Vec<(u32, u32, u32)>>,
    words: Mutex<Vec<(u32, u32)>>,
    cycles: AtomicU64,
    memory_size: usize,
    framebuffer: usize,
    framebuffer_bytes: usize,
}

#[cfg(test)]
impl SimPlatform {
    /// Platform with `memory_size` bytes of RAM whose top `framebuffer_bytes`
    /// are backed by a real buffer.
    pub fn new(memory_size: usize, framebuffer_bytes: usize) -> Self {
        let pixels = std::vec![BACKDROP; framebuffer_bytes / 2].into_boxed_slice();
        let framebuffer = std::boxed::Box::leak(pixels).as_mut_ptr() as usize;

        Self {
            threads: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
            events: Mutex::new(VecDeque::new()),
            dropped_events: AtomicUsize::new(0),
            waits: AtomicUsize::new(0),
            idle_waits: AtomicUsize::new(0),
            input: Mutex::new(VecDeque::new()),
            polls: AtomicUsize::new(0),
            timeline: Mutex::new(Vec::new()),
            fragments: Mutex::new(Vec::new()),
            words: Mutex::new(Vec::new()),
            cycles: AtomicU64::new(0),
            memory_size,
            framebuffer,
            framebuffer_bytes,
        }
    }

    /// 4 MiB of RAM with a low-resolution crash framebuffer on top.
    pub fn low_res() -> Self {
        Self::new(0x40_0000, 320 * 240 * 2)
    }

    pub fn add_thread(&self, id: i32, priority: i32, flags: ThreadFlags) {
        self.threads.lock().push(ThreadInfo {
            id: ThreadId::new(id),
            priority,
            flags,
        });
    }

    pub fn set_context(&self, id: i32, context: ExceptionContext) {
        self.contexts.lock().push((ThreadId::new(id), context));
    }

    /// Queue an event that finds no newly trapped thread.
    pub fn raise(&self, event: FaultEvent) {
        self.events.lock().push_back((event, None));
    }

    /// Queue an event raised by thread `id` trapping with `flags`.
    pub fn trap(&self, id: i32, flags: ThreadFlags, event: FaultEvent) {
        self.events
            .lock()
            .push_back((event, Some((ThreadId::new(id), flags))));
    }

    pub fn script_input(&self, presses: &[Buttons]) {
        self.input.lock().extend(presses.iter().copied());
    }

    pub fn add_fragment(&self, start: u32, end: u32, base: u32) {
        self.fragments.lock().push((start, end, base));
    }

    pub fn poke_word(&self, addr: u32, word: u32) {
        self.words.lock().push((addr, word));
    }

    pub fn registrations(&self) -> Vec<(FaultEvent, Message)> {
        self.registrations
            .lock()
            .iter()
            .map(|(event, _, message)| (*event, *message))
            .collect()
    }

    pub fn framebuffer_addr(&self) -> usize {
        self.framebuffer
    }

    /// Address the crash screen is expected to reserve.
    pub fn framebuffer_offset(&self) -> usize {
        self.memory_size - self.framebuffer_bytes
    }

    fn record(&self, event: SimEvent) {
        self.timeline.lock().push(event);
    }

    /// Host calls recorded so far.
    pub fn timeline(&self) -> Vec<SimEvent> {
        self.timeline.lock().clone()
    }

    /// Post `event` to every registered slot right away, as the trap
    /// handler would.
    pub fn deliver(&self, event: FaultEvent) {
        let registrations = self.registrations.lock();
        for (registered, slot, message) in registrations.iter() {
            if *registered == event && slot.try_send(*message).is_err() {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
impl ThreadRuntime for SimPlatform {
    type Threads<'a> = std::vec::IntoIter<ThreadInfo>;

    fn create_thread(&self, spec: ThreadSpec) -> Result<(), HostError> {
        if spec.stack_top.is_null() || spec.stack_top as usize % 16 != 0 {
            return Err(HostError::ThreadCreate);
        }
        self.created.lock().push((spec.id, spec.priority));
        Ok(())
    }

    fn start_thread(&self, id: ThreadId) -> Result<(), HostError> {
        if !self.created.lock().iter().any(|(created, _)| *created == id) {
            return Err(HostError::ThreadStart);
        }
        self.started.lock().push(id);
        Ok(())
    }

    fn stop_thread(&self, id: ThreadId) {
        self.stopped.lock().push(id);
    }

    fn set_event_message(
        &self,
        event: FaultEvent,
        slot: &'static MessageSlot,
        message: Message,
    ) -> Result<(), HostError> {
        self.registrations.lock().push((event, slot, message));
        Ok(())
    }

    fn wait_for_message(&self, slot: &MessageSlot) {
        assert!(slot.is_empty(), "watcher blocked with a message pending");
        self.waits.fetch_add(1, Ordering::Relaxed);

        let next = self.events.lock().pop_front();
        match next {
            Some((event, trapped)) => {
                if let Some((id, flags)) = trapped {
                    for thread in self.threads.lock().iter_mut().filter(|t| t.id == id) {
                        thread.flags |= flags;
                    }
                }
                self.deliver(event);
            }
            None => {
                let idle = self.idle_waits.fetch_add(1, Ordering::Relaxed);
                assert!(idle < MAX_IDLE_WAITS, "watcher waiting for an event that never comes");
            }
        }
    }

    fn park(&self) {
        std::thread::yield_now();
    }

    fn threads(&self) -> Self::Threads<'_> {
        self.threads.lock().clone().into_iter()
    }

    fn context(&self, id: ThreadId) -> Option<ExceptionContext> {
        self.contexts
            .lock()
            .iter()
            .find(|(thread, _)| *thread == id)
            .map(|(_, context)| *context)
    }
}

#[cfg(test)]
impl VideoInterface for SimPlatform {
    fn set_black(&self, black: bool) {
        self.record(SimEvent::Video(VideoCall::Black(black)));
    }

    fn set_repeat_line(&self, repeat: bool) {
        self.record(SimEvent::Video(VideoCall::RepeatLine(repeat)));
    }

    fn swap_buffer(&self, frame: NonNull<u16>) {
        self.record(SimEvent::Video(VideoCall::Swap(frame.as_ptr() as usize)));
    }
}

#[cfg(test)]
impl InputDevice for SimPlatform {
    fn poll_buttons(&self) -> Buttons {
        let polls = self.polls.fetch_add(1, Ordering::Relaxed);
        let pressed = self.input.lock().pop_front().unwrap_or_else(|| {
            assert!(polls < MAX_IDLE_POLLS, "unlock sequence never completed");
            Buttons::empty()
        });
        self.record(SimEvent::Poll(pressed));
        pressed
    }
}

#[cfg(test)]
impl FragmentLookup for SimPlatform {
    fn fragment_base(&self, addr: u32) -> Option<NonZeroU32> {
        self.fragments
            .lock()
            .iter()
            .find(|(start, end, _)| (*start..*end).contains(&addr))
            .and_then(|(_, _, base)| NonZeroU32::new(*base))
    }
}

#[cfg(test)]
impl Clock for SimPlatform {
    fn reset(&self) {
        self.cycles.store(0, Ordering::Relaxed);
        self.record(SimEvent::Hold(0));
    }

    // Every read moves time forward by one cycle.
    fn cycles(&self) -> u64 {
        let now = self.cycles.fetch_add(1, Ordering::Relaxed);
        if let Some(SimEvent::Hold(last)) = self.timeline.lock().last_mut() {
            *last = now;
        }
        now
    }

    fn rate(&self) -> CounterRate {
        CounterRate::from_hz(SIM_COUNTER_HZ)
    }
}

#[cfg(test)]
impl PhysicalMemory for SimPlatform {
    fn memory_size(&self) -> usize {
        self.memory_size
    }

    fn uncached(&self, offset: usize) -> Option<NonNull<u16>> {
        if offset == self.framebuffer_offset() {
            NonNull::new(self.framebuffer as *mut u16)
        } else {
            None
        }
    }

    fn read_word(&self, addr: u32) -> u32 {
        self.record(SimEvent::ReadWord(addr));
        self.words
            .lock()
            .iter()
            .find(|(at, _)| *at == addr)
            .map_or(0, |(_, word)| *word)
    }

    fn writeback_dcache(&self) {
        self.record(SimEvent::Writeback);
    }
}

#[cfg(test)]
/// Leaked full-frame surface of the given width filled with `color`.
pub fn test_surface(width: u16, color: u16) -> Surface {
    let height = width as usize * 3 / 4;
    let pixels = std::boxed::Box::leak(std::vec![color; width as usize * height].into_boxed_slice());
    Surface::from_slice(pixels, width).unwrap()
}

#[cfg(test)]
/// Read the glyph drawn in the cell at logical (`x`, `y`).
///
/// High-resolution surfaces are sampled at the top-left pixel of each 2x2
/// block. Cells that are not purely ink and paper, or have no ink at all,
/// read as a space. `O` and `0` share a shape and both read as `0`; letters
/// read as upper case.
pub fn read_cell(surface: &Surface, x: usize, y: usize) -> char {
    let pixels = surface.pixels();
    let stride = surface.width() as usize;
    let scale = stride / 320;
    let lit = |row: usize, col: usize| pixels[(y + row) * scale * stride + (x + col) * scale];

    let cell = || (0..GLYPH_HEIGHT).flat_map(|row| (0..GLYPH_WIDTH).map(move |col| (row, col)));
    let drawn = cell().all(|(row, col)| matches!(lit(row, col), INK | PAPER));
    let inked = cell().any(|(row, col)| lit(row, col) == INK);
    if !drawn || !inked {
        return ' ';
    }

    (0..GLYPH_COUNT as u8)
        .filter_map(Glyph::from_index)
        .find(|glyph| {
            (0..GLYPH_HEIGHT).all(|row| {
                glyph
                    .row(row)
                    .enumerate()
                    .all(|(col, on)| (lit(row, col) == INK) == on)
            })
        })
        .and_then(glyph_char)
        .unwrap_or('#')
}

#[cfg(test)]
fn glyph_char(glyph: Glyph) -> Option<char> {
    (0u8..0x80)
        .find(|&byte| Glyph::for_byte(byte) == Some(glyph))
        .map(char::from)
}

#[cfg(test)]
/// Read `len` cells starting at logical (`x`, `y`).
pub fn read_text(surface: &Surface, x: usize, y: usize, len: usize) -> String {
    (0..len)
        .map(|i| read_cell(surface, x + i * ADVANCE as usize, y))
        .collect()
}

#[cfg(test)]
/// What [`read_text`] is expected to return for `text`.
pub fn as_read(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_ascii_uppercase() {
            'O' => '0',
            c if Glyph::for_byte(c as u8).is_none() => ' ',
            c => c,
        })
        .collect()
}
