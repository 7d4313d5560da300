//! DWC-OTG host controller driver: core bring-up, channel pool, and the
//! per-channel transaction engine (§4.1).
//!
//! Every USB transfer, from the first 8-byte device descriptor fetch through
//! steady-state bulk/interrupt traffic, funnels through [`Hcd::transfer`] or
//! its async counterpart [`Hcd::submit_async_request`]. Both ultimately drive
//! one hardware channel through [`Hcd::run_transaction`], which reprograms
//! `HCCHAR`/`HCSPLT`/`HCTSIZ`/`HCDMA` and spins on `HCINT` until the channel
//! halts.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::hint::spin_loop;

use spin::Mutex;

use crate::channel::{Channel, SplitInfo};
use crate::desc::SetupPacket;
use crate::endpoint::{Direction, Endpoint, EndpointType, Pid};
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::reg;
use crate::timer::DeferredQueue;
use crate::urb::Urb;

/// Number of hardware channels this driver manages, unless the core reports
/// fewer via `GHWCFG2`.
pub const DEFAULT_NUM_CHANNELS: u8 = 8;

/// Bound on CSPLIT retries per transaction before giving up on a split
/// transfer (translates the original's unbounded busy-poll into an explicit
/// counter).
pub const MAX_CSPLIT_RETRIES: u32 = 10_000;

/// Bound on NAK retries for a non-interrupt transaction before failing it
/// with [`UsbError::Timeout`].
const MAX_NAK_RETRIES: u32 = 10_000;

const MMIO_SIZE: usize = 0x1000;

/// Power-domain id for the USB core in the SoC's property-tag mailbox.
const POWER_DEVICE_USB: u32 = 3;

/// A URB parked for interrupt-endpoint polling: submitted once, then either
/// completed or re-armed after `bInterval` ms on NAK.
struct PendingAsync {
    urb: Box<Urb>,
    split: Option<SplitInfo>,
}

/// The DWC-OTG host controller.
///
/// Generic over the board's [`Env`] so it never touches anything outside its
/// own MMIO window except through that trait.
pub struct Hcd<E: Env> {
    mmio: usize,
    env: Arc<E>,
    channels: Mutex<Vec<Channel>>,
    pending: Mutex<Vec<Option<PendingAsync>>>,
    deferred: Mutex<DeferredQueue<usize>>,
    now_ms: core::sync::atomic::AtomicU64,
}

impl<E: Env> Hcd<E> {
    /// Powers on, resets and brings up the core in host mode, then powers the
    /// root port and waits for a device to be detected.
    pub fn new(env: Arc<E>, mmio_phys: usize) -> Result<Self> {
        if !env.set_power_state_on(POWER_DEVICE_USB) {
            return Err(UsbError::MapFail);
        }

        let mmio = unsafe { env.map_mmio(mmio_phys, MMIO_SIZE) }.ok_or(UsbError::MapFail)?;

        let hcd = Self {
            mmio,
            env,
            channels: Mutex::new((0..DEFAULT_NUM_CHANNELS).map(Channel::new).collect()),
            pending: Mutex::new(Vec::new()),
            deferred: Mutex::new(DeferredQueue::new()),
            now_ms: core::sync::atomic::AtomicU64::new(0),
        };

        hcd.reset_core()?;
        hcd.configure_host_mode();
        hcd.power_root_port();

        Ok(hcd)
    }

    fn reset_core(&self) -> Result<()> {
        self.write_reg(reg::GRSTCTL, reg::GRSTCTL_CSFTRST);
        let mut tries = 0u32;
        while self.read_reg::<u32>(reg::GRSTCTL) & reg::GRSTCTL_CSFTRST != 0 {
            if tries > MAX_NAK_RETRIES {
                return Err(UsbError::Timeout);
            }
            tries += 1;
            spin_loop();
        }
        let mut tries = 0u32;
        while self.read_reg::<u32>(reg::GRSTCTL) & reg::GRSTCTL_AHBIDLE == 0 {
            if tries > MAX_NAK_RETRIES {
                return Err(UsbError::Timeout);
            }
            tries += 1;
            spin_loop();
        }
        self.env.us_delay(20_000);
        Ok(())
    }

    fn configure_host_mode(&self) {
        let usbcfg = self.read_reg::<u32>(reg::GUSBCFG);
        self.write_reg(reg::GUSBCFG, usbcfg | reg::GUSBCFG_FORCE_HOST_MODE);
        self.env.ms_delay(50);

        let ahbcfg = self.read_reg::<u32>(reg::GAHBCFG);
        self.write_reg(
            reg::GAHBCFG,
            ahbcfg | reg::GAHBCFG_DMA_EN | reg::GAHBCFG_GLBL_INTR_EN,
        );
    }

    fn power_root_port(&self) {
        let hprt = self.read_reg::<u32>(reg::HPRT);
        let preserved = hprt & !reg::HPRT_WC_BITS;
        self.write_reg(reg::HPRT, preserved | reg::HPRT_PRT_PWR);
        self.env.ms_delay(crate::hub::PORT_POWER_STABLE_MS);
    }

    fn read_reg<T: Copy>(&self, offset: usize) -> T {
        unsafe { ((self.mmio + offset) as *const T).read_volatile() }
    }

    fn write_reg<T: Copy>(&self, offset: usize, val: T) {
        unsafe { ((self.mmio + offset) as *mut T).write_volatile(val) }
    }

    // ---- root port, used directly by the root-hub special case in hub.rs ----

    /// True if a device is currently attached to the root port.
    pub fn root_port_connected(&self) -> bool {
        self.read_reg::<u32>(reg::HPRT) & reg::HPRT_PRT_CONN_STS != 0
    }

    /// True if `C_PORT_CONNECTION`-equivalent (connect detected) is pending.
    pub fn root_port_connect_change(&self) -> bool {
        self.read_reg::<u32>(reg::HPRT) & reg::HPRT_PRT_CONN_DET != 0
    }

    /// Clears the root port's write-one-to-clear change bits without
    /// disturbing `PRT_PWR`.
    pub fn root_port_clear_changes(&self) {
        let hprt = self.read_reg::<u32>(reg::HPRT);
        let keep = hprt & !reg::HPRT_WC_BITS & !reg::HPRT_PRT_RST;
        self.write_reg(reg::HPRT, keep | (hprt & reg::HPRT_WC_BITS));
    }

    /// Drives a reset pulse on the root port and waits for it to clear,
    /// matching the hub-class `SET_FEATURE(PORT_RESET)` / `C_PORT_RESET` pair
    /// a real hub would expose over the wire.
    pub fn root_port_reset(&self) -> Result<()> {
        let hprt = self.read_reg::<u32>(reg::HPRT);
        let preserved = hprt & !reg::HPRT_WC_BITS;
        self.write_reg(reg::HPRT, preserved | reg::HPRT_PRT_RST);
        self.env.ms_delay(60);
        let hprt = self.read_reg::<u32>(reg::HPRT);
        let preserved = hprt & !reg::HPRT_WC_BITS;
        self.write_reg(reg::HPRT, preserved & !reg::HPRT_PRT_RST);
        self.env.ms_delay(20);

        let mut tries = 0u32;
        while self.read_reg::<u32>(reg::HPRT) & reg::HPRT_PRT_ENA == 0 {
            if tries > MAX_NAK_RETRIES {
                return Err(UsbError::Timeout);
            }
            tries += 1;
            self.env.us_delay(100);
            tries += 1;
        }
        Ok(())
    }

    /// Speed of the device on the root port: [`reg::port_speed`].
    pub fn root_port_speed(&self) -> u8 {
        reg::hprt_speed(self.read_reg::<u32>(reg::HPRT))
    }

    /// The board environment this controller was built with, for class
    /// drivers and enumeration code that need `ms_delay`/logging/MAC lookup
    /// without threading a second reference alongside `Arc<Hcd<E>>`.
    pub fn env(&self) -> &E {
        &self.env
    }

    // ---- channel pool ----

    fn alloc_channel(&self) -> Option<u8> {
        let mut channels = self.channels.lock();
        channels.iter_mut().find(|c| c.is_idle()).map(|c| {
            c.reserve();
            c.index()
        })
    }

    fn free_channel(&self, idx: u8) {
        let mut channels = self.channels.lock();
        if let Some(c) = channels.iter_mut().find(|c| c.index() == idx) {
            c.release();
        }
    }

    // ---- blocking transfer API (§4.1) ----

    /// Issues a SETUP/DATA/STATUS control transfer over `ep` (endpoint 0),
    /// returning bytes moved during the DATA stage.
    pub fn control_transfer(
        &self,
        ep: &mut Endpoint,
        setup: &SetupPacket,
        buffer: &mut [u8],
        split: Option<SplitInfo>,
    ) -> Result<usize> {
        debug_assert_eq!(ep.ep_type(), EndpointType::Control);

        let idx = self.alloc_channel().ok_or(UsbError::NoChannel)?;
        let result = (|| {
            // SETUP stage.
            ep.set_setup_pid();
            let mut setup_bytes = setup_to_bytes(setup);
            self.run_transaction(idx, ep, &mut setup_bytes, Pid::Setup, Direction::Out, split)?;

            // DATA stage.
            ep.reset_pid(); // first data packet is DATA1
            let data_dir = if setup.length == 0 {
                Direction::Out
            } else if (setup.request_type & 0x80) != 0 {
                Direction::In
            } else {
                Direction::Out
            };
            let transferred = if setup.length > 0 {
                self.transfer_packets(idx, ep, buffer, data_dir, split)?
            } else {
                0
            };

            // STATUS stage: opposite direction of DATA (or IN if no data).
            let status_dir = if setup.length == 0 || data_dir == Direction::Out {
                Direction::In
            } else {
                Direction::Out
            };
            ep.reset_pid();
            let mut empty = [0u8; 0];
            self.run_transaction(
                idx,
                ep,
                &mut empty,
                Pid::Data1,
                status_dir,
                split,
            )?;

            Ok(transferred)
        })();
        self.free_channel(idx);
        result
    }

    /// Issues a blocking bulk or interrupt transfer over `ep`.
    pub fn transfer(
        &self,
        ep: &mut Endpoint,
        buffer: &mut [u8],
        split: Option<SplitInfo>,
    ) -> Result<usize> {
        let idx = self.alloc_channel().ok_or(UsbError::NoChannel)?;
        let dir = ep.direction();
        let result = self.transfer_packets(idx, ep, buffer, dir, split);
        self.free_channel(idx);
        result
    }

    /// Splits `buffer` into max-packet-size chunks and runs each as one
    /// transaction, advancing the endpoint's data toggle between packets.
    fn transfer_packets(
        &self,
        idx: u8,
        ep: &mut Endpoint,
        buffer: &mut [u8],
        dir: Direction,
        split: Option<SplitInfo>,
    ) -> Result<usize> {
        if buffer.is_empty() {
            let pid = ep.current_pid();
            return self.run_transaction(idx, ep, buffer, pid, dir, split);
        }

        let mps = ep.max_packet_size().max(1) as usize;
        let mut done = 0usize;
        while done < buffer.len() {
            let end = (done + mps).min(buffer.len());
            let requested = end - done;
            let pid = ep.current_pid();
            let n = self.run_transaction(idx, ep, &mut buffer[done..end], pid, dir, split)?;
            ep.toggle_pid();
            done += n;
            if n < requested {
                break; // short packet ends the transfer
            }
        }
        Ok(done)
    }

    /// Runs exactly one packet-sized transaction on channel `idx`, wrapping
    /// it in SSPLIT/CSPLIT if `split` is given, and returns bytes moved.
    fn run_transaction(
        &self,
        idx: u8,
        ep: &Endpoint,
        buffer: &mut [u8],
        pid: Pid,
        dir: Direction,
        split: Option<SplitInfo>,
    ) -> Result<usize> {
        if let Some(split) = split {
            self.run_split_transaction(idx, ep, buffer, pid, dir, split)
        } else {
            self.run_direct_transaction(idx, ep, buffer, pid, dir)
        }
    }

    fn program_channel(&self, idx: u8, ep: &Endpoint, pid: Pid, dir: Direction, size: usize, buffer: &mut [u8]) {
        let base = reg::channel_base(idx);
        let ep_type = match ep.ep_type() {
            EndpointType::Control => reg::ep_type::CONTROL,
            EndpointType::Bulk => reg::ep_type::BULK,
            EndpointType::Interrupt => reg::ep_type::INTERRUPT,
        };
        let mut hcchar = (ep.max_packet_size() as u32 & reg::HCCHAR_MPS_MASK)
            | ((ep.number() as u32) << reg::HCCHAR_EPNUM_SHIFT)
            | (ep_type << reg::HCCHAR_EPTYPE_SHIFT)
            | (1 << reg::HCCHAR_MC_SHIFT)
            | ((ep.device_address() as u32) << reg::HCCHAR_DEVADDR_SHIFT);
        if dir == Direction::In {
            hcchar |= reg::HCCHAR_EPDIR_IN;
        }
        self.write_reg(base + reg::HCCHAR, hcchar);

        let hw_pid = match pid {
            Pid::Data0 => reg::pid::DATA0,
            Pid::Data1 => reg::pid::DATA1,
            Pid::Setup => reg::pid::SETUP,
        };
        let pkt_count = if size == 0 { 1 } else { size.div_ceil(ep.max_packet_size().max(1) as usize) as u32 };
        let hctsiz = (size as u32 & reg::HCTSIZ_XFERSIZE_MASK)
            | (pkt_count << reg::HCTSIZ_PKTCNT_SHIFT)
            | (hw_pid << reg::HCTSIZ_PID_SHIFT);
        self.write_reg(base + reg::HCTSIZ, hctsiz);

        let phys = self.env.virt_to_phys(buffer_addr(buffer));
        self.write_reg(base + reg::HCDMA, phys as u32);
    }

    fn program_split(&self, idx: u8, split: &SplitInfo, complete: bool) {
        let base = reg::channel_base(idx);
        let mut hcsplt = (split.port as u32 & reg::HCSPLT_PRTADDR_MASK)
            | ((split.hub_address as u32) << reg::HCSPLT_HUBADDR_SHIFT)
            | reg::HCSPLT_XACTPOS_ALL
            | reg::HCSPLT_SPLTENA;
        if complete {
            hcsplt |= reg::HCSPLT_COMPSPLT;
        }
        self.write_reg(base + reg::HCSPLT, hcsplt);
    }

    fn clear_split(&self, idx: u8) {
        self.write_reg(reg::channel_base(idx) + reg::HCSPLT, 0u32);
    }

    fn enable_channel(&self, idx: u8) {
        let base = reg::channel_base(idx);
        let hcchar = self.read_reg::<u32>(base + reg::HCCHAR);
        self.write_reg(base + reg::HCCHAR, hcchar | reg::HCCHAR_CHENA);
    }

    /// Spins on `HCINT` until the channel halts, returning the accumulated
    /// interrupt bits. A NAK on an interrupt endpoint returns
    /// [`UsbError::Timeout`] immediately instead of retrying, since the
    /// whole point of interrupt-endpoint polling is to release the channel
    /// back to the pool and let [`Hcd::submit_async_request`]/
    /// [`Hcd::on_timer_tick`] reschedule the next attempt after `bInterval`
    /// rather than busy-hold the channel for up to `MAX_NAK_RETRIES`
    /// iterations on the common "nothing to report yet" case. Control and
    /// bulk NAKs still retry in place, since those transfers are expected to
    /// complete synchronously.
    fn wait_channel(&self, idx: u8, ep_type: EndpointType) -> Result<u32> {
        let base = reg::channel_base(idx);
        let mut nak_tries = 0u32;
        loop {
            let hcint = self.read_reg::<u32>(base + reg::HCINT);
            if hcint == 0 {
                spin_loop();
                continue;
            }
            self.write_reg(base + reg::HCINT, hcint);

            if hcint & reg::HCINT_ERROR_MASK != 0 {
                return Err(UsbError::XferFail((hcint & 0xFF) as u8));
            }
            if hcint & reg::HCINT_NAK != 0 {
                if ep_type == EndpointType::Interrupt {
                    return Err(UsbError::Timeout);
                }
                nak_tries += 1;
                if nak_tries > MAX_NAK_RETRIES {
                    return Err(UsbError::Timeout);
                }
                self.enable_channel(idx);
                continue;
            }
            if hcint & (reg::HCINT_XFERCOMPL | reg::HCINT_CHHLTD) != 0 {
                return Ok(hcint);
            }
        }
    }

    fn run_direct_transaction(
        &self,
        idx: u8,
        ep: &Endpoint,
        buffer: &mut [u8],
        pid: Pid,
        dir: Direction,
    ) -> Result<usize> {
        self.clear_split(idx);
        self.program_channel(idx, ep, pid, dir, buffer.len(), buffer);
        self.enable_channel(idx);
        self.wait_channel(idx, ep.ep_type())?;
        Ok(buffer.len())
    }

    fn run_split_transaction(
        &self,
        idx: u8,
        ep: &Endpoint,
        buffer: &mut [u8],
        pid: Pid,
        dir: Direction,
        split: SplitInfo,
    ) -> Result<usize> {
        // Start-split.
        self.program_channel(idx, ep, pid, dir, buffer.len(), buffer);
        self.program_split(idx, &split, false);
        self.enable_channel(idx);
        self.wait_channel(idx, ep.ep_type())?;

        // Complete-split, retried while the hub reports "not ready" (NAK).
        let mut tries = 0u32;
        loop {
            self.program_channel(idx, ep, pid, dir, buffer.len(), buffer);
            self.program_split(idx, &split, true);
            self.enable_channel(idx);
            match self.wait_channel(idx, ep.ep_type()) {
                Ok(_) => return Ok(buffer.len()),
                Err(UsbError::Timeout) => {
                    tries += 1;
                    if tries > MAX_CSPLIT_RETRIES {
                        return Err(UsbError::Timeout);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ---- async submission for continuously-polled interrupt endpoints ----

    /// Queues `urb` for asynchronous completion. The first attempt runs
    /// immediately from the caller's context; a NAK reschedules it via
    /// [`Hcd::on_timer_tick`] after the endpoint's polling interval.
    pub fn submit_async_request(&self, mut urb: Urb, split: Option<SplitInfo>) -> Result<()> {
        let dir = urb.endpoint().direction();
        let (ep, buf) = urb.endpoint_and_buffer_mut();
        match self.transfer(ep, buf, split) {
            Ok(n) => {
                urb.complete(n);
                Ok(())
            }
            Err(UsbError::Timeout) if urb.endpoint().ep_type() == EndpointType::Interrupt => {
                let interval = urb.endpoint().interval_ms().max(1) as u64;
                let due = self.now_ms.load(core::sync::atomic::Ordering::Relaxed) + interval;
                let mut pending = self.pending.lock();
                let slot = pending.len();
                pending.push(Some(PendingAsync { urb: Box::new(urb), split }));
                drop(pending);
                self.deferred.lock().push(due, slot);
                let _ = dir;
                Ok(())
            }
            Err(e) => {
                urb.fail(e);
                Err(e)
            }
        }
    }

    /// Drains repolls due at or before `now_ms`, retrying each and either
    /// completing it or re-arming it for another `bInterval` later.
    pub fn on_timer_tick(&self, now_ms: u64) {
        self.now_ms.store(now_ms, core::sync::atomic::Ordering::Relaxed);
        let due = self.deferred.lock().pop_due(now_ms);
        for slot in due {
            let taken = {
                let mut pending = self.pending.lock();
                pending[slot].take()
            };
            let Some(PendingAsync { mut urb, split }) = taken else {
                continue;
            };
            let (ep, buf) = urb.endpoint_and_buffer_mut();
        match self.transfer(ep, buf, split) {
                Ok(n) => urb.complete(n),
                Err(UsbError::Timeout) => {
                    let interval = urb.endpoint().interval_ms().max(1) as u64;
                    let due = now_ms + interval;
                    let mut pending = self.pending.lock();
                    pending[slot] = Some(PendingAsync { urb, split });
                    drop(pending);
                    self.deferred.lock().push(due, slot);
                }
                Err(e) => urb.fail(e),
            }
        }
    }
}

impl<E: Env> Drop for Hcd<E> {
    fn drop(&mut self) {
        self.write_reg(reg::GAHBCFG, 0u32);
        unsafe { self.env.unmap_mmio(self.mmio, MMIO_SIZE) };
    }
}

fn setup_to_bytes(setup: &SetupPacket) -> [u8; 8] {
    let mut b = [0u8; 8];
    b[0] = setup.request_type;
    b[1] = setup.request;
    b[2..4].copy_from_slice(&setup.value.to_le_bytes());
    b[4..6].copy_from_slice(&setup.index.to_le_bytes());
    b[6..8].copy_from_slice(&setup.length.to_le_bytes());
    b
}

fn buffer_addr(buffer: &mut [u8]) -> usize {
    buffer.as_mut_ptr() as usize
}
