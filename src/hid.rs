//! Boot-protocol HID keyboard and mouse support (§4.8).
//!
//! Both classes skip the HID report-descriptor parser entirely: a device
//! that advertises `bInterfaceSubClass == BOOT` speaks the fixed 8-byte
//! keyboard report or 3-byte mouse report defined by the USB HID spec
//! appendix, so there's nothing to parse. [`crate::gamepad`] is the sibling
//! driver for HID devices that don't support the boot protocol.

use alloc::string::String;
use alloc::sync::Arc;

use spin::Mutex;

use crate::channel::SplitInfo;
use crate::desc::SetupPacket;
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::hcd::Hcd;

/// Top-level HID usage pages.
pub mod usage_page {
    /// Generic Desktop Controls
    pub const GENERIC_DESKTOP: u16 = 0x01;
    /// Simulation Controls
    pub const SIMULATION: u16 = 0x02;
    /// VR Controls
    pub const VR: u16 = 0x03;
    /// Sport Controls
    pub const SPORT: u16 = 0x04;
    /// Game Controls
    pub const GAME: u16 = 0x05;
    /// Generic Device Controls
    pub const GENERIC_DEVICE: u16 = 0x06;
    /// Keyboard/Keypad
    pub const KEYBOARD: u16 = 0x07;
    /// LED
    pub const LED: u16 = 0x08;
    /// Button
    pub const BUTTON: u16 = 0x09;
    /// Ordinal
    pub const ORDINAL: u16 = 0x0A;
    /// Telephony
    pub const TELEPHONY: u16 = 0x0B;
    /// Consumer
    pub const CONSUMER: u16 = 0x0C;
    /// Digitizer
    pub const DIGITIZER: u16 = 0x0D;
    /// PID Page
    pub const PID: u16 = 0x0F;
    /// Unicode
    pub const UNICODE: u16 = 0x10;
    /// Alphanumeric Display
    pub const ALPHANUMERIC_DISPLAY: u16 = 0x14;
    /// Medical Instruments
    pub const MEDICAL: u16 = 0x40;
    /// Monitor page start
    pub const MONITOR_CONTROL: u16 = 0x80;
    /// Monitor Enumerated Values
    pub const MONITOR_ENUM: u16 = 0x81;
    /// VESA Virtual Controls
    pub const VESA_VIRTUAL: u16 = 0x82;
    /// Power Device page start
    pub const POWER_DEVICE: u16 = 0x84;
    /// Battery System
    pub const BATTERY: u16 = 0x85;
    /// Bar Code Scanner
    pub const BARCODE: u16 = 0x8C;
    /// Scale
    pub const SCALE: u16 = 0x8D;
    /// Magnetic Stripe Reader
    pub const MSR: u16 = 0x8E;
    /// Camera Control
    pub const CAMERA: u16 = 0x90;
    /// Arcade
    pub const ARCADE: u16 = 0x91;
    /// Start of the vendor-defined range
    pub const VENDOR_DEFINED_START: u16 = 0xFF00;
}

/// Generic Desktop usages.
pub mod usage_desktop {
    /// Pointer
    pub const POINTER: u8 = 0x01;
    /// Mouse
    pub const MOUSE: u8 = 0x02;
    /// Joystick
    pub const JOYSTICK: u8 = 0x04;
    /// Gamepad
    pub const GAMEPAD: u8 = 0x05;
    /// Keyboard
    pub const KEYBOARD: u8 = 0x06;
    /// Keypad
    pub const KEYPAD: u8 = 0x07;
    /// Multi-axis Controller
    pub const MULTI_AXIS: u8 = 0x08;
    /// Tablet PC System
    pub const TABLET_PC: u8 = 0x09;
    /// X
    pub const X: u8 = 0x30;
    /// Y
    pub const Y: u8 = 0x31;
    /// Z
    pub const Z: u8 = 0x32;
    /// Rx
    pub const RX: u8 = 0x33;
    /// Ry
    pub const RY: u8 = 0x34;
    /// Rz
    pub const RZ: u8 = 0x35;
    /// Slider
    pub const SLIDER: u8 = 0x36;
    /// Dial
    pub const DIAL: u8 = 0x37;
    /// Wheel
    pub const WHEEL: u8 = 0x38;
    /// Hat switch
    pub const HAT_SWITCH: u8 = 0x39;
}

/// Keyboard report modifier-byte bits.
pub mod modifier {
    /// Left Control
    pub const LEFT_CTRL: u8 = 0x01;
    /// Left Shift
    pub const LEFT_SHIFT: u8 = 0x02;
    /// Left Alt
    pub const LEFT_ALT: u8 = 0x04;
    /// Left GUI (Windows/Command)
    pub const LEFT_GUI: u8 = 0x08;
    /// Right Control
    pub const RIGHT_CTRL: u8 = 0x10;
    /// Right Shift
    pub const RIGHT_SHIFT: u8 = 0x20;
    /// Right Alt (AltGr)
    pub const RIGHT_ALT: u8 = 0x40;
    /// Right GUI
    pub const RIGHT_GUI: u8 = 0x80;

    /// Either Control key
    pub const CTRL: u8 = LEFT_CTRL | RIGHT_CTRL;
    /// Either Shift key
    pub const SHIFT: u8 = LEFT_SHIFT | RIGHT_SHIFT;
    /// Either Alt key
    pub const ALT: u8 = LEFT_ALT | RIGHT_ALT;
    /// Either GUI key
    pub const GUI: u8 = LEFT_GUI | RIGHT_GUI;
}

/// Keyboard LED output-report bits.
pub mod led {
    /// Num Lock
    pub const NUM_LOCK: u8 = 0x01;
    /// Caps Lock
    pub const CAPS_LOCK: u8 = 0x02;
    /// Scroll Lock
    pub const SCROLL_LOCK: u8 = 0x04;
    /// Compose
    pub const COMPOSE: u8 = 0x08;
    /// Kana
    pub const KANA: u8 = 0x10;
}

/// USB HID keyboard usage IDs (a selection; the full table covers 0x00-0xE7).
pub mod scancode {
    /// No key pressed
    pub const NONE: u8 = 0x00;
    /// 'A'
    pub const A: u8 = 0x04;
    /// 'Z'
    pub const Z: u8 = 0x1D;
    /// '1'
    pub const N1: u8 = 0x1E;
    /// '0'
    pub const N0: u8 = 0x27;
    /// Enter
    pub const ENTER: u8 = 0x28;
    /// Escape
    pub const ESCAPE: u8 = 0x29;
    /// Backspace
    pub const BACKSPACE: u8 = 0x2A;
    /// Tab
    pub const TAB: u8 = 0x2B;
    /// Space
    pub const SPACE: u8 = 0x2C;
    /// Delete (forward)
    pub const DELETE: u8 = 0x4C;
}

/// `bRequest`/report-type selectors used by the SET_REPORT/GET_REPORT pair.
pub mod report_type {
    /// Input report
    pub const INPUT: u8 = 1;
    /// Output report
    pub const OUTPUT: u8 = 2;
    /// Feature report
    pub const FEATURE: u8 = 3;
}

/// HID Boot Protocol Keyboard Report (8 bytes).
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    /// Modifier keys bitmap (§`modifier`)
    pub modifiers: u8,
    /// Reserved byte (always 0)
    pub reserved: u8,
    /// Up to 6 simultaneous key scancodes
    pub keys: [u8; 6],
}

impl KeyboardReport {
    /// True if either Ctrl key is down.
    pub fn ctrl(&self) -> bool {
        (self.modifiers & modifier::CTRL) != 0
    }

    /// True if either Shift key is down.
    pub fn shift(&self) -> bool {
        (self.modifiers & modifier::SHIFT) != 0
    }

    /// True if either Alt key is down.
    pub fn alt(&self) -> bool {
        (self.modifiers & modifier::ALT) != 0
    }

    /// True if this report is the Ctrl+Alt+Del chord.
    pub fn is_ctrl_alt_del(&self) -> bool {
        self.ctrl() && self.alt() && self.keys.contains(&scancode::DELETE)
    }
}

/// HID Boot Protocol Mouse Report (3 bytes).
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseReport {
    /// Button state bitmap
    pub buttons: u8,
    /// X-axis relative movement
    pub x: i8,
    /// Y-axis relative movement
    pub y: i8,
}

impl MouseReport {
    /// Left button down.
    pub fn left(&self) -> bool {
        (self.buttons & 0x01) != 0
    }

    /// Right button down.
    pub fn right(&self) -> bool {
        (self.buttons & 0x02) != 0
    }

    /// Middle button down.
    pub fn middle(&self) -> bool {
        (self.buttons & 0x04) != 0
    }
}

/// Converts a US-layout keyboard scancode to ASCII, or `None` for keys
/// without a printable representation.
pub fn scancode_to_ascii(scancode: u8, shift: bool) -> Option<char> {
    const NORMAL: &[u8] = b"\0\0\0\0abcdefghijklmnopqrstuvwxyz1234567890\n\x1b\x08\t -=[]\\#;'`,./";
    const SHIFTED: &[u8] =
        b"\0\0\0\0ABCDEFGHIJKLMNOPQRSTUVWXYZ!@#$%^&*()\n\x1b\x08\t _+{}|~:\"~<>?";

    let table = if shift { SHIFTED } else { NORMAL };
    match table.get(scancode as usize) {
        Some(0) | None => None,
        Some(&c) => Some(c as char),
    }
}

/// Invoked once per newly received keyboard report.
pub type KeyReportHandler = fn(report: &KeyboardReport, context: *mut u8);
/// Invoked once per newly received mouse report.
pub type MouseReportHandler = fn(report: &MouseReport, context: *mut u8);
/// Invoked when [`KeyboardReport::is_ctrl_alt_del`] fires.
pub type ShutdownHandler = fn(context: *mut u8);
/// Invoked once per newly pressed, printable key (edge-detected against the
/// previous report), with its US-layout ASCII mapping.
pub type KeyPressedHandler = fn(key: &str, context: *mut u8);

/// A bound boot-protocol keyboard interface.
pub struct KeyboardDevice<E: Env> {
    hcd: Arc<Hcd<E>>,
    name: String,
    interface: u8,
    ep_in: Endpoint,
    split: Option<SplitInfo>,
    last_report: Mutex<KeyboardReport>,
    handler: Option<KeyReportHandler>,
    pressed_handler: Option<KeyPressedHandler>,
    shutdown: Option<ShutdownHandler>,
    context: *mut u8,
}

// SAFETY: `context` is an opaque caller-owned pointer, only ever handed back
// to the caller's own handler on the same core that registered it.
unsafe impl<E: Env> Send for KeyboardDevice<E> {}
unsafe impl<E: Env> Sync for KeyboardDevice<E> {}

impl<E: Env> KeyboardDevice<E> {
    /// Binds to the boot-keyboard interrupt IN endpoint and issues
    /// SET_PROTOCOL(boot) + SET_IDLE(0) so the device free-runs without
    /// needing polling-interval bookkeeping on the host side.
    pub fn new(
        hcd: Arc<Hcd<E>>,
        name: String,
        interface: u8,
        ep_in: Endpoint,
        split: Option<SplitInfo>,
    ) -> Result<Self> {
        let mut dev = Self {
            hcd,
            name,
            interface,
            ep_in,
            split,
            last_report: Mutex::new(KeyboardReport::default()),
            handler: None,
            pressed_handler: None,
            shutdown: None,
            context: core::ptr::null_mut(),
        };
        dev.set_protocol(0)?;
        dev.set_idle(0, 0)?;
        Ok(dev)
    }

    /// The name this device was registered under (`"ukbd1"`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the per-report callback and the Ctrl+Alt+Del callback,
    /// both invoked with the same `context` pointer.
    pub fn register_handlers(
        &mut self,
        handler: KeyReportHandler,
        shutdown: ShutdownHandler,
        context: *mut u8,
    ) {
        self.handler = Some(handler);
        self.shutdown = Some(shutdown);
        self.context = context;
    }

    /// Registers just the per-report callback, leaving any previously
    /// registered shutdown handler in place.
    pub fn register_key_handler(&mut self, handler: KeyReportHandler, context: *mut u8) {
        self.handler = Some(handler);
        self.context = context;
    }

    /// Registers just the Ctrl+Alt+Del callback, leaving any previously
    /// registered key handler in place.
    pub fn register_shutdown_handler(&mut self, handler: ShutdownHandler, context: *mut u8) {
        self.shutdown = Some(handler);
        self.context = context;
    }

    /// Registers the cooked per-keypress callback: fires once per key newly
    /// present in a report that wasn't in the previous one, translated to
    /// ASCII through [`scancode_to_ascii`]. Non-printable keys don't fire.
    pub fn register_pressed_handler(&mut self, handler: KeyPressedHandler, context: *mut u8) {
        self.pressed_handler = Some(handler);
        self.context = context;
    }

    fn control_out(&mut self, setup: &SetupPacket) -> Result<()> {
        let mut ep0 = Endpoint::new_control(self.ep_in.device_address(), 8);
        let mut empty = [0u8; 0];
        self.hcd.control_transfer(&mut ep0, setup, &mut empty, self.split).map(|_| ())
    }

    /// SET_PROTOCOL(boot = 0 / report = 1).
    pub fn set_protocol(&mut self, protocol: u8) -> Result<()> {
        let setup = SetupPacket::set_protocol(self.interface, protocol);
        self.control_out(&setup)
    }

    /// SET_IDLE.
    pub fn set_idle(&mut self, duration: u8, report_id: u8) -> Result<()> {
        let setup = SetupPacket::set_idle(self.interface, duration, report_id);
        self.control_out(&setup)
    }

    /// SET_REPORT(output) to update the keyboard's LEDs (§`led`).
    pub fn set_leds(&mut self, leds: u8) -> Result<()> {
        let setup = SetupPacket::hid_set_report(self.interface, report_type::OUTPUT, 0, 1);
        let mut ep0 = Endpoint::new_control(self.ep_in.device_address(), 8);
        let mut buf = [leds];
        self.hcd.control_transfer(&mut ep0, &setup, &mut buf, self.split)?;
        Ok(())
    }

    /// Polls the interrupt endpoint once. Returns the new report if one
    /// arrived (a NAK — no new report yet — is not an error).
    pub fn poll_report(&mut self) -> Result<Option<KeyboardReport>> {
        let mut buf = [0u8; 8];
        match self.hcd.transfer(&mut self.ep_in, &mut buf, self.split) {
            Ok(n) if n >= 8 => {
                let report = unsafe { core::ptr::read_unaligned(buf.as_ptr() as *const KeyboardReport) };
                *self.last_report.lock() = report;
                Ok(Some(report))
            }
            Ok(_) => Ok(None),
            Err(UsbError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Called once per host tick: polls for a new report and dispatches the
    /// registered handlers.
    pub fn poll(&mut self) {
        let prev = *self.last_report.lock();
        if let Ok(Some(report)) = self.poll_report() {
            if let Some(handler) = self.handler {
                handler(&report, self.context);
            }
            if let Some(handler) = self.pressed_handler {
                for &code in &report.keys {
                    if code != scancode::NONE && !prev.keys.contains(&code) {
                        if let Some(c) = scancode_to_ascii(code, report.shift()) {
                            let buf = [c as u8];
                            if let Ok(s) = core::str::from_utf8(&buf) {
                                handler(s, self.context);
                            }
                        }
                    }
                }
            }
            if report.is_ctrl_alt_del() {
                if let Some(shutdown) = self.shutdown {
                    shutdown(self.context);
                }
            }
        }
    }
}

/// A bound boot-protocol mouse interface.
pub struct MouseDevice<E: Env> {
    hcd: Arc<Hcd<E>>,
    name: String,
    interface: u8,
    ep_in: Endpoint,
    split: Option<SplitInfo>,
    handler: Option<MouseReportHandler>,
    context: *mut u8,
}

// SAFETY: see `KeyboardDevice`.
unsafe impl<E: Env> Send for MouseDevice<E> {}
unsafe impl<E: Env> Sync for MouseDevice<E> {}

impl<E: Env> MouseDevice<E> {
    /// Binds to the boot-mouse interrupt IN endpoint.
    pub fn new(
        hcd: Arc<Hcd<E>>,
        name: String,
        interface: u8,
        ep_in: Endpoint,
        split: Option<SplitInfo>,
    ) -> Result<Self> {
        let mut dev = Self { hcd, name, interface, ep_in, split, handler: None, context: core::ptr::null_mut() };
        dev.set_protocol(0)?;
        Ok(dev)
    }

    /// The name this device was registered under (`"umouse1"`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the per-report callback.
    pub fn register_handler(&mut self, handler: MouseReportHandler, context: *mut u8) {
        self.handler = Some(handler);
        self.context = context;
    }

    fn set_protocol(&mut self, protocol: u8) -> Result<()> {
        let setup = SetupPacket::set_protocol(self.interface, protocol);
        let mut ep0 = Endpoint::new_control(self.ep_in.device_address(), 8);
        let mut empty = [0u8; 0];
        self.hcd.control_transfer(&mut ep0, &setup, &mut empty, self.split).map(|_| ())
    }

    /// Polls the interrupt endpoint once.
    pub fn poll_report(&mut self) -> Result<Option<MouseReport>> {
        let mut buf = [0u8; 3];
        match self.hcd.transfer(&mut self.ep_in, &mut buf, self.split) {
            Ok(n) if n >= 3 => {
                Ok(Some(unsafe { core::ptr::read_unaligned(buf.as_ptr() as *const MouseReport) }))
            }
            Ok(_) => Ok(None),
            Err(UsbError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Called once per host tick.
    pub fn poll(&mut self) {
        if let Ok(Some(report)) = self.poll_report() {
            if let Some(handler) = self.handler {
                handler(&report, self.context);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_alt_del_requires_both_modifiers_and_delete() {
        let mut r = KeyboardReport { modifiers: modifier::CTRL | modifier::ALT, ..Default::default() };
        assert!(!r.is_ctrl_alt_del());
        r.keys[0] = scancode::DELETE;
        assert!(r.is_ctrl_alt_del());
    }

    #[test]
    fn scancode_to_ascii_maps_letters_and_shift() {
        assert_eq!(scancode_to_ascii(scancode::A, false), Some('a'));
        assert_eq!(scancode_to_ascii(scancode::A, true), Some('A'));
        assert_eq!(scancode_to_ascii(scancode::NONE, false), None);
    }
}
