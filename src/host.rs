//! The `UsbHost` singleton: the stable host-application API (§6).
//!
//! Everything below this layer — [`crate::hcd`], [`crate::hub`],
//! [`crate::device`], [`crate::factory`] and the individual class drivers —
//! is reached only through here. `UsbHost` owns the shared [`AddressAllocator`]
//! and [`NameRegistry`] the whole device tree draws from, the root [`Hub`],
//! and a `poll` that walks it once per tick.

use alloc::sync::Arc;

use crate::device::AddressAllocator;
use crate::env::Env;
use crate::err::Result;
#[cfg(feature = "ethernet")]
use crate::eth::{self, EthernetDevice};
use crate::function::FunctionDriver;
#[cfg(feature = "hid-gamepad")]
use crate::gamepad::{GamepadState, StatusHandler as GamepadStatusHandler};
use crate::hcd::Hcd;
#[cfg(feature = "hid-boot")]
use crate::hid::{KeyPressedHandler, KeyReportHandler, MouseReportHandler, ShutdownHandler};
use crate::hub::Hub;
#[cfg(feature = "midi")]
use crate::midi::PacketHandler as MidiPacketHandler;
use crate::names::NameRegistry;

/// Physical base of the DWC-OTG core's MMIO window (BCM2835-class SoC, the
/// board this driver targets).
const DWC_OTG_MMIO_BASE: usize = 0x2098_0000;

/// Storage block size mass-storage reads/writes must be aligned to.
#[cfg(feature = "mass-storage")]
const BLOCK_SIZE: u64 = 512;

/// The single USB host instance a board brings up at boot.
pub struct UsbHost<E: Env> {
    hcd: Arc<Hcd<E>>,
    root: Hub<E>,
}

impl<E: Env> UsbHost<E> {
    /// Powers on and resets the controller, then enumerates whatever is
    /// already attached to the root port (and, recursively, any hub behind
    /// it). A device failing enumeration simply doesn't appear; this call
    /// itself only fails if the controller never comes up.
    pub fn initialize(env: Arc<E>) -> Result<Self> {
        let hcd = Arc::new(Hcd::new(env, DWC_OTG_MMIO_BASE)?);
        let mut addresses = AddressAllocator::new();
        let mut registry = NameRegistry::new();
        let root = Hub::root(Arc::clone(&hcd), &mut addresses, &mut registry)?;
        Ok(Self { hcd, root })
    }

    /// Services every attached device's bound function drivers. Call this
    /// regularly (e.g. from the board's main loop) to drive interrupt-endpoint
    /// polling, keyboard/mouse/gamepad/MIDI callbacks, and Ethernet receive.
    pub fn poll(&mut self) {
        self.root.poll();
    }

    #[cfg(feature = "hid-boot")]
    fn first_keyboard(&mut self) -> Option<&mut crate::hid::KeyboardDevice<E>> {
        match self.root.find_function_mut(&|f| matches!(f, FunctionDriver::Keyboard(_))) {
            Some(FunctionDriver::Keyboard(d)) => Some(d),
            _ => None,
        }
    }

    #[cfg(feature = "hid-boot")]
    fn first_mouse(&mut self) -> Option<&mut crate::hid::MouseDevice<E>> {
        match self.root.find_function_mut(&|f| matches!(f, FunctionDriver::Mouse(_))) {
            Some(FunctionDriver::Mouse(d)) => Some(d),
            _ => None,
        }
    }

    #[cfg(feature = "hid-gamepad")]
    fn first_gamepad(&mut self) -> Option<&mut crate::gamepad::GamepadDevice<E>> {
        match self.root.find_function_mut(&|f| matches!(f, FunctionDriver::Gamepad(_))) {
            Some(FunctionDriver::Gamepad(d)) => Some(d),
            _ => None,
        }
    }

    #[cfg(feature = "midi")]
    fn first_midi(&mut self) -> Option<&mut crate::midi::MidiDevice<E>> {
        match self.root.find_function_mut(&|f| matches!(f, FunctionDriver::Midi(_))) {
            Some(FunctionDriver::Midi(d)) => Some(d),
            _ => None,
        }
    }

    #[cfg(feature = "mass-storage")]
    fn first_mass_storage(&mut self) -> Option<&mut crate::msc::MassStorageDevice<E>> {
        match self.root.find_function_mut(&|f| matches!(f, FunctionDriver::MassStorage(_))) {
            Some(FunctionDriver::MassStorage(d)) => Some(d),
            _ => None,
        }
    }

    #[cfg(feature = "ethernet")]
    fn first_ethernet(&mut self) -> Option<&mut EthernetDevice<E>> {
        match self.root.find_function_mut(&|f| matches!(f, FunctionDriver::Ethernet(_))) {
            Some(FunctionDriver::Ethernet(d)) => Some(d),
            _ => None,
        }
    }

    /// True if a boot-protocol keyboard is attached.
    #[cfg(feature = "hid-boot")]
    pub fn keyboard_available(&self) -> bool {
        self.root.find_function(&|f| matches!(f, FunctionDriver::Keyboard(_))).is_some()
    }

    /// Registers the cooked per-keypress callback: fires once per newly
    /// pressed, printable key, mapped to ASCII through
    /// [`crate::hid::scancode_to_ascii`].
    #[cfg(feature = "hid-boot")]
    pub fn register_key_pressed_handler(&mut self, handler: KeyPressedHandler, context: *mut u8) {
        if let Some(kbd) = self.first_keyboard() {
            kbd.register_pressed_handler(handler, context);
        }
    }

    /// Registers the Ctrl+Alt+Del shutdown callback.
    #[cfg(feature = "hid-boot")]
    pub fn register_shutdown_handler(&mut self, handler: ShutdownHandler, context: *mut u8) {
        if let Some(kbd) = self.first_keyboard() {
            kbd.register_shutdown_handler(handler, context);
        }
    }

    /// Registers the raw per-report callback (modifiers + up to 6 scancodes),
    /// for callers that want the unprocessed boot report instead of the
    /// cooked per-character stream.
    #[cfg(feature = "hid-boot")]
    pub fn register_key_status_handler_raw(&mut self, handler: KeyReportHandler, context: *mut u8) {
        if let Some(kbd) = self.first_keyboard() {
            kbd.register_key_handler(handler, context);
        }
    }

    /// True if a boot-protocol mouse is attached.
    #[cfg(feature = "hid-boot")]
    pub fn mouse_available(&self) -> bool {
        self.root.find_function(&|f| matches!(f, FunctionDriver::Mouse(_))).is_some()
    }

    /// Registers the per-report mouse callback.
    #[cfg(feature = "hid-boot")]
    pub fn register_mouse_status_handler(&mut self, handler: MouseReportHandler, context: *mut u8) {
        if let Some(mouse) = self.first_mouse() {
            mouse.register_handler(handler, context);
        }
    }

    /// True if a HID gamepad is attached.
    #[cfg(feature = "hid-gamepad")]
    pub fn gamepad_available(&self) -> bool {
        self.root.find_function(&|f| matches!(f, FunctionDriver::Gamepad(_))).is_some()
    }

    /// Registers the per-report gamepad callback.
    #[cfg(feature = "hid-gamepad")]
    pub fn register_gamepad_status_handler(&mut self, handler: GamepadStatusHandler, context: *mut u8) {
        if let Some(pad) = self.first_gamepad() {
            pad.register_handler(handler, context);
        }
    }

    /// The most recently decoded gamepad state, if a gamepad is attached.
    #[cfg(feature = "hid-gamepad")]
    pub fn gamepad_state(&mut self) -> Option<GamepadState> {
        self.first_gamepad().map(|p| p.state().clone())
    }

    /// True if a USB-MIDI streaming interface is attached.
    #[cfg(feature = "midi")]
    pub fn midi_available(&self) -> bool {
        self.root.find_function(&|f| matches!(f, FunctionDriver::Midi(_))).is_some()
    }

    /// Registers the per-packet MIDI callback.
    #[cfg(feature = "midi")]
    pub fn register_midi_packet_handler(&mut self, handler: MidiPacketHandler, context: *mut u8) {
        if let Some(midi) = self.first_midi() {
            midi.register_handler(handler, context);
        }
    }

    /// True if a bulk-only mass-storage device is attached.
    #[cfg(feature = "mass-storage")]
    pub fn mass_storage_device_available(&self) -> bool {
        self.root.find_function(&|f| matches!(f, FunctionDriver::MassStorage(_))).is_some()
    }

    /// Reads `buf.len()` bytes starting at `offset`. Both must be multiples
    /// of 512; no CBW is issued otherwise.
    #[cfg(feature = "mass-storage")]
    pub fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset % BLOCK_SIZE != 0 || buf.len() as u64 % BLOCK_SIZE != 0 {
            return Err(crate::err::UsbError::InvalidArgument);
        }
        let msd = self.first_mass_storage().ok_or(crate::err::UsbError::DeviceNotFound)?;
        let lba = (offset / BLOCK_SIZE) as u32;
        let count = (buf.len() as u64 / BLOCK_SIZE) as u16;
        msd.read_blocks(0, lba, count, buf)
    }

    /// Writes `buf.len()` bytes starting at `offset`. Both must be multiples
    /// of 512; no CBW is issued otherwise.
    #[cfg(feature = "mass-storage")]
    pub fn write(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset % BLOCK_SIZE != 0 || buf.len() as u64 % BLOCK_SIZE != 0 {
            return Err(crate::err::UsbError::InvalidArgument);
        }
        let msd = self.first_mass_storage().ok_or(crate::err::UsbError::DeviceNotFound)?;
        let lba = (offset / BLOCK_SIZE) as u32;
        let count = (buf.len() as u64 / BLOCK_SIZE) as u16;
        msd.write_blocks(0, lba, count, buf, false)
    }

    /// True if a SMSC95xx USB-Ethernet adapter is attached.
    #[cfg(feature = "ethernet")]
    pub fn ethernet_available(&self) -> bool {
        self.root.find_function(&|f| matches!(f, FunctionDriver::Ethernet(_))).is_some()
    }

    /// The attached Ethernet adapter's MAC address.
    #[cfg(feature = "ethernet")]
    pub fn get_mac_address(&mut self) -> Option<[u8; 6]> {
        self.first_ethernet().map(|e| e.mac_address())
    }

    /// Sends one Ethernet frame. Rejects frames at or above
    /// [`crate::eth::MAX_FRAME_LEN`] bytes without touching the wire.
    #[cfg(feature = "ethernet")]
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<usize> {
        if frame.len() >= eth::MAX_FRAME_LEN {
            return Err(crate::err::UsbError::InvalidArgument);
        }
        let e = self.first_ethernet().ok_or(crate::err::UsbError::DeviceNotFound)?;
        e.send_frame(frame)?;
        Ok(frame.len())
    }

    /// Reads one pending Ethernet frame into `buf`, if any is queued.
    /// `buf` should be at least 1600 bytes, the adapter's receive size.
    #[cfg(feature = "ethernet")]
    pub fn receive_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let e = self.first_ethernet().ok_or(crate::err::UsbError::DeviceNotFound)?;
        match e.receive_frame()? {
            Some(frame) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}
