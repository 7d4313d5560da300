//! HID gamepad support for devices that don't speak the keyboard/mouse boot
//! protocol (§4.7).
//!
//! Unlike [`crate::hid`]'s boot-protocol keyboard and mouse, a gamepad's
//! report layout is device-specific and must be learned from its HID report
//! descriptor: a tiny stack machine of global/local state (usage page,
//! usage, report size/count, logical min/max) that emits one [`Field`] per
//! INPUT item. Sony's PS3 controller additionally needs an out-of-band
//! GET_REPORT kick before it starts sending anything over the interrupt
//! endpoint at all.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::channel::SplitInfo;
use crate::desc::SetupPacket;
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::hcd::Hcd;
use crate::hid::{report_type, usage_page};

const PS3_VENDOR_ID: u16 = 0x054C;
const PS3_PRODUCT_ID: u16 = 0x0268;

/// One value extracted from a report by position, as described by an INPUT
/// item in the report descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Usage page this field belongs to (`usage_page::GENERIC_DESKTOP`, `BUTTON`, ...).
    pub usage_page: u16,
    /// Usage within that page (X, Y, hat switch, button number, ...).
    pub usage: u16,
    /// Offset of this field's first bit within the report, header byte excluded.
    pub bit_offset: u32,
    /// Width of this field in bits.
    pub bit_size: u32,
    /// True if the field's logical range includes negative values.
    pub is_signed: bool,
}

/// Up to 64 buttons, 8 analog/hat axes, decoded from the device's own report
/// layout.
#[derive(Debug, Clone, Default)]
pub struct GamepadState {
    /// One bit per button, in report-descriptor order.
    pub buttons: u64,
    /// Decoded axis/hat values, normalized to the field's logical range.
    pub axes: Vec<i32>,
}

/// Extracts an unsigned value of `bit_size` bits starting at `bit_offset`
/// from `buf`, little-endian bit order (matches `BitGetUnsigned`).
pub fn bit_get_unsigned(buf: &[u8], bit_offset: u32, bit_size: u32) -> u32 {
    let mut result = 0u32;
    for i in 0..bit_size {
        let bit = bit_offset + i;
        let byte = (bit / 8) as usize;
        let shift = bit % 8;
        if byte >= buf.len() {
            break;
        }
        if (buf[byte] >> shift) & 1 != 0 {
            result |= 1 << i;
        }
    }
    result
}

/// Same as [`bit_get_unsigned`] but sign-extends the result from `bit_size`
/// bits (matches `BitGetSigned`).
pub fn bit_get_signed(buf: &[u8], bit_offset: u32, bit_size: u32) -> i32 {
    let raw = bit_get_unsigned(buf, bit_offset, bit_size);
    if bit_size == 0 || bit_size >= 32 {
        return raw as i32;
    }
    let sign_bit = 1u32 << (bit_size - 1);
    if raw & sign_bit != 0 {
        (raw | !((1u32 << bit_size) - 1)) as i32
    } else {
        raw as i32
    }
}

const TAG_USAGE_PAGE: u8 = 0x04;
const TAG_USAGE: u8 = 0x08;
const TAG_LOGICAL_MIN: u8 = 0x14;
const TAG_LOGICAL_MAX: u8 = 0x24;
const TAG_REPORT_SIZE: u8 = 0x74;
const TAG_REPORT_COUNT: u8 = 0x94;
const TAG_INPUT: u8 = 0x80;

/// Walks a HID report descriptor and returns one [`Field`] per bit-range an
/// INPUT item declares, in report order. Output/feature items and
/// collections are skipped — only the fixed bit layout matters here.
pub fn parse_report_descriptor(desc: &[u8]) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut usage_page_cur: u16 = 0;
    let mut usage_cur: u16 = 0;
    let mut logical_min: i32 = 0;
    let mut logical_max: i32 = 0;
    let mut report_size: u32 = 0;
    let mut report_count: u32 = 0;
    let mut bit_pos: u32 = 0;

    let mut pos = 0usize;
    while pos < desc.len() {
        let prefix = desc[pos];
        let size = match prefix & 0x03 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        if pos + 1 + size > desc.len() {
            break;
        }
        let tag = prefix & 0xFC;
        let data = &desc[pos + 1..pos + 1 + size];
        let value = match size {
            1 => data[0] as u32,
            2 => u16::from_le_bytes([data[0], data[1]]) as u32,
            4 => u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            _ => 0,
        };

        match tag {
            TAG_USAGE_PAGE => usage_page_cur = value as u16,
            TAG_USAGE => usage_cur = value as u16,
            TAG_LOGICAL_MIN => logical_min = sign_extend(value, size),
            TAG_LOGICAL_MAX => logical_max = sign_extend(value, size),
            TAG_REPORT_SIZE => report_size = value,
            TAG_REPORT_COUNT => report_count = value,
            TAG_INPUT => {
                let is_signed = logical_min < 0;
                for _ in 0..report_count {
                    fields.push(Field {
                        usage_page: usage_page_cur,
                        usage: usage_cur,
                        bit_offset: bit_pos,
                        bit_size: report_size,
                        is_signed,
                    });
                    bit_pos += report_size;
                }
            }
            _ => {}
        }

        pos += 1 + size;
    }

    fields
}

fn sign_extend(value: u32, size: usize) -> i32 {
    match size {
        1 => value as i8 as i32,
        2 => value as i16 as i32,
        _ => value as i32,
    }
}

/// Invoked once per newly decoded gamepad report.
pub type StatusHandler = fn(index: u32, state: &GamepadState, context: *mut u8);

/// A bound HID gamepad interface.
pub struct GamepadDevice<E: Env> {
    hcd: Arc<Hcd<E>>,
    name: String,
    index: u32,
    interface: u8,
    ep_in: Endpoint,
    split: Option<SplitInfo>,
    report_bytes: usize,
    fields: Vec<Field>,
    last_state: GamepadState,
    handler: Option<StatusHandler>,
    context: *mut u8,
}

// SAFETY: see `crate::hid::KeyboardDevice`.
unsafe impl<E: Env> Send for GamepadDevice<E> {}
unsafe impl<E: Env> Sync for GamepadDevice<E> {}

impl<E: Env> GamepadDevice<E> {
    /// Binds to the gamepad's interrupt IN endpoint, parses `report_desc`
    /// into its field layout, and applies the PS3 controller's activation
    /// quirk if `vendor_id`/`product_id` match.
    pub fn new(
        hcd: Arc<Hcd<E>>,
        name: String,
        index: u32,
        interface: u8,
        ep_in: Endpoint,
        split: Option<SplitInfo>,
        report_desc: &[u8],
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Self> {
        let fields = parse_report_descriptor(report_desc);
        let report_bytes = fields.iter().map(|f| f.bit_offset + f.bit_size).max().unwrap_or(0).div_ceil(8) as usize;

        let mut dev = Self {
            hcd,
            name,
            index,
            interface,
            ep_in,
            split,
            report_bytes,
            fields,
            last_state: GamepadState::default(),
            handler: None,
            context: core::ptr::null_mut(),
        };

        if vendor_id == PS3_VENDOR_ID && product_id == PS3_PRODUCT_ID {
            dev.activate_ps3()?;
        }

        Ok(dev)
    }

    /// The name this device was registered under (`"upad1"`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the per-report callback, invoked with this pad's index.
    pub fn register_handler(&mut self, handler: StatusHandler, context: *mut u8) {
        self.handler = Some(handler);
        self.context = context;
    }

    /// Per-player LED pattern `activate_ps3` OR's into the output report's
    /// byte 9, indexed by the pad's player slot.
    const PS3_PLAYER_LEDS: [u8; 5] = [0x00, 0x01, 0x02, 0x04, 0x08];

    /// Sends the Sixaxis/DualShock 3 two-step SET_REPORT sequence that
    /// switches the pad from "boot mode" (HID-idle, no reports) into
    /// operational mode: a 4-byte feature report enabling the pad, then a
    /// 48-byte output report lighting this pad's player LED.
    fn activate_ps3(&mut self) -> Result<()> {
        let setup = SetupPacket::hid_set_report(self.interface, report_type::FEATURE, 0xF4, 4);
        let mut ep0 = Endpoint::new_control(self.ep_in.device_address(), 8);
        let mut enable = [0x42u8, 0x0C, 0x00, 0x00];
        self.hcd.control_transfer(&mut ep0, &setup, &mut enable, self.split)?;

        #[rustfmt::skip]
        let mut output: [u8; 48] = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0xff, 0x27, 0x10, 0x00, 0x32,
            0xff, 0x27, 0x10, 0x00, 0x32,
            0xff, 0x27, 0x10, 0x00, 0x32,
            0xff, 0x27, 0x10, 0x00, 0x32,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let led = Self::PS3_PLAYER_LEDS.get(self.index as usize).copied().unwrap_or(0);
        output[9] |= led << 1;

        let setup = SetupPacket::hid_set_report(self.interface, report_type::OUTPUT, 0x01, 48);
        let mut ep0 = Endpoint::new_control(self.ep_in.device_address(), 8);
        self.hcd.control_transfer(&mut ep0, &setup, &mut output, self.split)?;
        Ok(())
    }

    /// Polls the interrupt endpoint once and decodes a new report into a
    /// [`GamepadState`], if one arrived.
    pub fn poll_state(&mut self) -> Result<Option<GamepadState>> {
        let mut buf = alloc::vec![0u8; self.report_bytes];
        match self.hcd.transfer(&mut self.ep_in, &mut buf, self.split) {
            Ok(_) => {
                let state = self.decode(&buf);
                self.last_state = state.clone();
                Ok(Some(state))
            }
            Err(UsbError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn decode(&self, buf: &[u8]) -> GamepadState {
        let mut state = GamepadState::default();
        let mut button_index = 0u32;
        for field in &self.fields {
            match field.usage_page {
                p if p == usage_page::BUTTON => {
                    let v = bit_get_unsigned(buf, field.bit_offset, field.bit_size);
                    if v != 0 {
                        state.buttons |= 1u64 << button_index.min(63);
                    }
                    button_index += 1;
                }
                p if p == usage_page::GENERIC_DESKTOP => {
                    let v = if field.is_signed {
                        bit_get_signed(buf, field.bit_offset, field.bit_size)
                    } else {
                        bit_get_unsigned(buf, field.bit_offset, field.bit_size) as i32
                    };
                    state.axes.push(v);
                }
                _ => {}
            }
        }
        state
    }

    /// Called once per host tick.
    pub fn poll(&mut self) {
        if let Ok(Some(state)) = self.poll_state() {
            if let Some(handler) = self.handler {
                handler(self.index, &state, self.context);
            }
        }
    }

    /// The most recently decoded state.
    pub fn state(&self) -> &GamepadState {
        &self.last_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_get_unsigned_reads_across_byte_boundary() {
        let buf = [0b1011_0000, 0b0000_0001];
        assert_eq!(bit_get_unsigned(&buf, 4, 5), 0b10110);
    }

    #[test]
    fn bit_get_signed_sign_extends() {
        let buf = [0b0111_1111];
        assert_eq!(bit_get_signed(&buf, 0, 8), 127);
        let buf = [0b1000_0001];
        assert_eq!(bit_get_signed(&buf, 0, 8), -127);
    }

    #[test]
    fn parses_simple_button_and_axis_descriptor() {
        #[rustfmt::skip]
        let desc: &[u8] = &[
            0x05, 0x01,       // Usage Page (Generic Desktop)
            0x09, 0x30,       // Usage (X)
            0x15, 0x81,       // Logical Minimum (-127)
            0x25, 0x7F,       // Logical Maximum (127)
            0x75, 0x08,       // Report Size (8)
            0x95, 0x01,       // Report Count (1)
            0x81, 0x02,       // Input
            0x05, 0x09,       // Usage Page (Button)
            0x75, 0x01,       // Report Size (1)
            0x95, 0x08,       // Report Count (8)
            0x81, 0x02,       // Input
        ];
        let fields = parse_report_descriptor(desc);
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0].bit_size, 8);
        assert!(fields[0].is_signed);
        assert_eq!(fields[1].usage_page, usage_page::BUTTON);
        assert_eq!(fields[1].bit_size, 1);
    }
}
