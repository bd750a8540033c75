//! The crash screen context object and its watcher thread.
//!
//! One [`CrashScreen`] lives in a `static` for the whole program:
//!
//! ```ignore
//! static SCREEN: CrashScreen<Console> = CrashScreen::new(Console, CrashScreenConfig::new());
//!
//! fn boot() {
//!     SCREEN.init().ok();
//! }
//! ```
//!
//! `init` reserves a framebuffer at the top of physical memory and starts the
//! watcher. The watcher sleeps until the host reports a break or fault,
//! suspends the faulted thread, waits for the unlock gesture and draws the
//! dump. It then parks for good; there is no way back.

use crate::config::{CrashScreenConfig, WATCHER_STACK_SIZE};
use crate::errors::{HostError, InitError, ScreenError, ScreenResult};
use crate::fault::{CrashDump, ExceptionContext, FaultReport};
use crate::fb::Surface;
use crate::platform::{Platform, ThreadId, ThreadSpec};
use crate::text;
use crate::unlock::wait_for_unlock;
use crate::watcher::{self, MessageSlot};
use core::cell::UnsafeCell;
use core::fmt;
use core::ptr::NonNull;
use log::{error, info, warn};
use portable_atomic::{AtomicBool, AtomicPtr, AtomicU32, Ordering};
use spin::{Mutex, Once};

/// Stack memory handed to the host for the watcher thread.
#[repr(C, align(16))]
struct WatcherStack(UnsafeCell<[u8; WATCHER_STACK_SIZE]>);

// Only the watcher thread touches the stack, and only after `init` handed
// it over exactly once.
unsafe impl Sync for WatcherStack {}

impl WatcherStack {
    const fn new() -> Self {
        Self(UnsafeCell::new([0; WATCHER_STACK_SIZE]))
    }

    fn top(&self) -> *mut u8 {
        self.0.get().cast::<u8>().wrapping_add(WATCHER_STACK_SIZE)
    }
}

/// Lock-free copy of the current framebuffer for the watcher.
///
/// Application threads draw through the `surface` mutex and may be stopped
/// while holding it. The watcher never takes that lock; it rebuilds its own
/// [`Surface`] from this copy.
struct FrameSnapshot {
    base: AtomicPtr<u16>,
    /// Width in the high half, height in the low half
    dims: AtomicU32,
}

impl FrameSnapshot {
    const fn new() -> Self {
        Self {
            base: AtomicPtr::new(core::ptr::null_mut()),
            dims: AtomicU32::new(0),
        }
    }

    fn publish(&self, surface: &Surface) {
        let dims = ((surface.width() as u32) << 16) | surface.height() as u32;
        self.base.store(core::ptr::null_mut(), Ordering::Release);
        self.dims.store(dims, Ordering::Release);
        self.base.store(surface.as_ptr().as_ptr(), Ordering::Release);
    }

    fn load(&self) -> Option<Surface> {
        let base = NonNull::new(self.base.load(Ordering::Acquire))?;
        let dims = self.dims.load(Ordering::Acquire);

        // SAFETY: `base` and `dims` were taken from a surface built under
        // the same contract, and the faulted thread that could still be
        // drawing through it is stopped by now.
        unsafe { Surface::from_raw(base, (dims >> 16) as u16, dims as u16) }.ok()
    }
}

/// Crash screen state for one program.
pub struct CrashScreen<P> {
    platform: P,
    config: CrashScreenConfig,
    surface: Mutex<Option<Surface>>,
    frame: FrameSnapshot,
    started: AtomicBool,
    watcher: Once<ThreadId>,
    slot: MessageSlot,
    stack: WatcherStack,
}

impl<P> CrashScreen<P> {
    /// An uninitialized screen; nothing happens until [`init`](Self::init).
    pub const fn new(platform: P, config: CrashScreenConfig) -> Self {
        Self {
            platform,
            config,
            surface: Mutex::new(None),
            frame: FrameSnapshot::new(),
            started: AtomicBool::new(false),
            watcher: Once::new(),
            slot: MessageSlot::new(),
            stack: WatcherStack::new(),
        }
    }

    /// The host this screen was built for.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Settings fixed at construction.
    pub fn config(&self) -> &CrashScreenConfig {
        &self.config
    }

    /// Id of the watcher thread once it has been started.
    pub fn watcher_id(&self) -> Option<ThreadId> {
        self.watcher.get().copied()
    }

    /// Run `f` on the crash framebuffer, if one is set up.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> Option<R> {
        self.surface.lock().as_mut().map(f)
    }

    /// Draw text on a dimmed box over the crash framebuffer.
    ///
    /// Returns the number of characters laid out, 0 before `init`.
    pub fn print_at_with_background(&self, x: i32, y: i32, args: fmt::Arguments<'_>) -> usize {
        self.with_surface(|surface| text::print_at_with_background(surface, x, y, args))
            .unwrap_or(0)
    }

    /// Point the crash screen at a different framebuffer.
    ///
    /// # Safety
    ///
    /// `frame` must be an uncached mapping valid for `width * height` pixels
    /// for the rest of the program, and nothing else may draw into it once
    /// a fault is being shown.
    pub unsafe fn set_draw_info(&self, frame: NonNull<u16>, width: u16, height: u16) -> ScreenResult<()> {
        // SAFETY: forwarded from the caller.
        let surface = unsafe { Surface::from_raw(frame, width, height)? };
        self.install(surface);
        Ok(())
    }

    fn install(&self, surface: Surface) {
        let mut current = self.surface.lock();
        self.frame.publish(&surface);
        *current = Some(surface);
    }
}

impl<P: Platform + Sync + 'static> CrashScreen<P> {
    /// Reserve the framebuffer and start the watcher thread.
    ///
    /// Only the first successful call does anything; later calls fail with
    /// [`InitError::AlreadyInitialized`].
    pub fn init(&'static self) -> ScreenResult<()> {
        self.config.validate()?;

        if self.started.swap(true, Ordering::AcqRel) {
            return Err(InitError::AlreadyInitialized.into());
        }

        let result = self.reserve_framebuffer().and_then(|()| self.spawn_watcher());
        if result.is_err() {
            self.started.store(false, Ordering::Release);
        }
        result
    }

    fn reserve_framebuffer(&self) -> ScreenResult<()> {
        let resolution = self.config.get_resolution();
        let (width, height) = (resolution.width(), resolution.height());
        let required = width as usize * height as usize * core::mem::size_of::<u16>();

        let available = self.platform.memory_size();
        let offset = available
            .checked_sub(required)
            .ok_or(InitError::MemoryTooSmall { available, required })?;
        let frame = self
            .platform
            .uncached(offset)
            .ok_or(InitError::FramebufferUnmapped(offset))?;

        // SAFETY: the top of physical memory is set aside for the crash
        // screen and the platform maps it uncached for the program's lifetime.
        let surface = unsafe { Surface::from_raw(frame, width, height)? };
        self.install(surface);

        info!("crash framebuffer at {:#x} ({}x{})", offset, width, height);
        Ok(())
    }

    fn spawn_watcher(&'static self) -> ScreenResult<()> {
        let id = self.config.get_watcher_id();
        let spec = ThreadSpec {
            id,
            priority: self.config.get_watcher_priority(),
            stack_top: self.stack.top(),
            entry: watcher_entry::<P>,
            arg: self as *const Self as usize,
        };

        self.platform.create_thread(spec)?;
        self.platform.start_thread(id)?;
        self.watcher.call_once(|| id);

        info!("crash screen watcher started as thread {}", id);
        Ok(())
    }

    /// Subscribe the watcher's message slot to break and fault events.
    pub fn register_events(&'static self) -> Result<(), HostError> {
        watcher::register_events(&self.platform, &self.slot)
    }

    /// Wait for a faulted thread, stop it, wait for the unlock gesture and
    /// draw its dump.
    ///
    /// Takes no lock an application thread can hold, so a thread that
    /// faulted in the middle of [`with_surface`](Self::with_surface) does not
    /// keep its own dump off the screen.
    pub fn handle_fault(&self) -> FaultReport {
        let own = self.watcher_id().unwrap_or(self.config.get_watcher_id());
        let thread = watcher::wait_for_fault(&self.platform, &self.slot, own);

        self.platform.stop_thread(thread.id);

        let context = self.platform.context(thread.id).unwrap_or_else(|| {
            warn!("no saved context for thread {}, showing zeroes", thread.id);
            ExceptionContext::default()
        });

        let mut dump = CrashDump::new(&self.platform, &self.config, thread.id, context);
        error!("{}", dump.report());

        wait_for_unlock(
            &self.platform,
            self.config.get_unlock_sequence(),
            self.config.get_poll_interval(),
        );

        match self.frame.load() {
            Some(mut surface) => dump.run(&mut surface),
            None => {
                warn!("no crash framebuffer, dump not drawn");
                dump.report()
            }
        }
    }

    fn watch(&'static self) -> ! {
        if let Err(e) = self.register_events() {
            error!("crash screen disabled: {}", ScreenError::from(e));
            self.park_forever();
        }

        self.handle_fault();
        self.park_forever()
    }

    fn park_forever(&self) -> ! {
        loop {
            self.platform.park();
        }
    }
}

impl<P> fmt::Debug for CrashScreen<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrashScreen")
            .field("config", &self.config)
            .field("started", &self.started.load(Ordering::Relaxed))
            .field("watcher", &self.watcher.get())
            .finish_non_exhaustive()
    }
}

/// Entry point of the watcher thread.
fn watcher_entry<P: Platform + Sync + 'static>(arg: usize) -> ! {
    // SAFETY: `spawn_watcher` passes the address of a `&'static CrashScreen<P>`.
    let screen = unsafe { &*(arg as *const CrashScreen<P>) };
    screen.watch()
}
