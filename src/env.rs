//! The `Env` trait: every bare-metal service this crate borrows from its host.
//!
//! Everything the design calls "out of scope" — exception vectors, the MMU,
//! the IRQ controller, the millisecond timer, the property-tag mailbox, the
//! dynamic allocator — is reached through this one trait. The host controller
//! driver and every class driver are generic over `E: Env` and never touch
//! bare-metal registers directly except through `read_reg`/`write_reg`.

use core::fmt;

/// Opaque handle returned by [`Env::start_kernel_timer`], used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(pub u32);

/// A one-shot kernel timer callback: `(handle, param, context)`, mirroring the
/// environment's `TKernelTimerHandler`.
pub type TimerHandler = fn(handle: TimerHandle, param: *mut u8, context: *mut u8);

/// An IRQ handler: `(param)`, mirroring the environment's `TInterruptHandler`.
pub type InterruptHandler = fn(param: *mut u8);

/// Log severities, matching the environment's `LogWrite` levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Unrecoverable condition for the calling operation.
    Error,
    /// Recoverable but noteworthy condition.
    Warning,
    /// Normal but significant event (device found, link up, ...).
    Notice,
    /// Verbose diagnostic detail.
    Debug,
}

/// Every bare-metal service the host application supplies.
///
/// Implementors provide the allocator, MMIO mapping, timer, IRQ, critical
/// section, logging and board-identification primitives this crate needs.
/// `Send + Sync` because controller state guarded by `spin::Mutex` is shared
/// between foreground code and interrupt context.
pub trait Env: Send + Sync {
    /// Allocates a `size` byte region of physically contiguous, ≥4-byte-aligned
    /// memory suitable for DMA. Returns the virtual address, or `None` on failure.
    ///
    /// # Safety
    /// Returns uninitialized memory; the region must be physically contiguous
    /// and mapped into the caller's address space.
    unsafe fn alloc(&self, size: usize, align: usize) -> Option<usize>;

    /// Deallocates a region previously returned by [`Env::alloc`].
    ///
    /// # Safety
    /// `addr`, `size` and `align` must match the original allocation exactly,
    /// and the region must not already have been freed.
    unsafe fn free(&self, addr: usize, size: usize, align: usize);

    /// Maps an MMIO region into virtual address space as uncached device memory.
    ///
    /// # Safety
    /// `phys` must be a valid MMIO physical base for `size` bytes.
    unsafe fn map_mmio(&self, phys: usize, size: usize) -> Option<usize>;

    /// Unmaps a region previously returned by [`Env::map_mmio`].
    ///
    /// # Safety
    /// `virt` must have been returned by `map_mmio` for `size` bytes.
    unsafe fn unmap_mmio(&self, virt: usize, size: usize);

    /// Translates a virtual address obtained from `alloc` to its physical address.
    fn virt_to_phys(&self, va: usize) -> usize;

    /// Returns the system page size in bytes.
    fn page_size(&self) -> usize {
        4096
    }

    /// Busy-waits for (at least) `ms` milliseconds.
    fn ms_delay(&self, ms: u32);

    /// Busy-waits for (at least) `us` microseconds.
    fn us_delay(&self, us: u32);

    /// Arms a one-shot timer that fires after `ticks` (host-defined tick unit,
    /// typically milliseconds) and invokes `handler(handle, param, context)`
    /// from timer-interrupt context.
    fn start_kernel_timer(
        &self,
        ticks: u32,
        handler: TimerHandler,
        param: *mut u8,
        context: *mut u8,
    ) -> TimerHandle;

    /// Cancels a timer armed by [`Env::start_kernel_timer`]; a no-op if it
    /// already fired.
    fn cancel_kernel_timer(&self, handle: TimerHandle);

    /// Registers `handler` for IRQ line `irq_number`, invoked with `param`.
    fn connect_interrupt(&self, irq_number: u32, handler: InterruptHandler, param: *mut u8);

    /// Disables IRQs and increments the nesting depth; returns whether
    /// interrupts were enabled at entry (recorded by the host for the
    /// matching [`Env::leave_critical`]).
    fn enter_critical(&self) -> bool;

    /// Decrements the nesting depth; re-enables IRQs only once it reaches
    /// zero and `were_enabled` (from the matching `enter_critical`) was true.
    fn leave_critical(&self, were_enabled: bool);

    /// Writes one log line tagged with `source` and `severity`.
    fn log_write(&self, source: &str, severity: Severity, args: fmt::Arguments<'_>);

    /// Turns on power to a SoC-defined device (property-tag mailbox `SET_POWER_STATE`).
    fn set_power_state_on(&self, device_id: u32) -> bool;

    /// Reads the board's Ethernet MAC address (property-tag mailbox `GET_MAC_ADDRESS`).
    fn get_mac_address(&self) -> Option<[u8; 6]>;

    /// True on a Raspberry Pi Model A-class board (no built-in Ethernet), used
    /// to skip SMSC95xx enumeration up front.
    fn is_model_a(&self) -> bool {
        false
    }
}

/// Writes a log line through `$env`, in the style of `log::info!` but routed
/// to [`Env::log_write`]. `$sev` is a [`Severity`] variant, `$src` the source tag.
#[macro_export]
macro_rules! log_write {
    ($env:expr, $src:expr, $sev:expr, $($arg:tt)*) => {
        $env.log_write($src, $sev, format_args!($($arg)*))
    };
}

/// RAII guard around [`Env::enter_critical`]/[`Env::leave_critical`].
///
/// Construction disables IRQs (or increments the nesting depth if already
/// inside a critical section); `Drop` restores the prior state. Mirrors
/// `synchronize.c`'s `uspi_EnterCritical`/`uspi_LeaveCritical` pair, turned
/// into a scope-bound guard instead of a manual call pair.
pub struct CriticalSection<'e, E: Env> {
    env: &'e E,
    were_enabled: bool,
}

impl<'e, E: Env> CriticalSection<'e, E> {
    /// Enters a critical section, disabling interrupts if this is the
    /// outermost nesting level.
    pub fn enter(env: &'e E) -> Self {
        let were_enabled = env.enter_critical();
        Self { env, were_enabled }
    }
}

impl<E: Env> Drop for CriticalSection<'_, E> {
    fn drop(&mut self) {
        self.env.leave_critical(self.were_enabled);
    }
}
