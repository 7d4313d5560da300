//! USB-MIDI support (§4.9).
//!
//! USB-MIDI 1.0 frames every MIDI message into a fixed 4-byte USB-MIDI Event
//! Packet: a cable number + code index number (CIN) byte followed by up to
//! three bytes of the underlying MIDI message, padded with zeros. A bulk IN
//! transfer can carry several such packets back to back.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::channel::SplitInfo;
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::hcd::Hcd;

/// Code Index Number values that classify a USB-MIDI event packet's payload.
pub mod cin {
    /// Single-byte system realtime / common message.
    pub const SINGLE_BYTE: u8 = 0xF;
    /// Note-off.
    pub const NOTE_OFF: u8 = 0x8;
    /// Note-on.
    pub const NOTE_ON: u8 = 0x9;
    /// Poly key pressure.
    pub const POLY_PRESSURE: u8 = 0xA;
    /// Control change.
    pub const CONTROL_CHANGE: u8 = 0xB;
    /// Program change.
    pub const PROGRAM_CHANGE: u8 = 0xC;
    /// Channel pressure.
    pub const CHANNEL_PRESSURE: u8 = 0xD;
    /// Pitch bend change.
    pub const PITCH_BEND: u8 = 0xE;
}

/// One decoded USB-MIDI event packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Virtual cable this event arrived on (0-15).
    pub cable: u8,
    /// Code Index Number (§`cin`), identifying the MIDI message type.
    pub cin: u8,
    /// Up to 3 bytes of the underlying MIDI message, zero-padded.
    pub data: [u8; 3],
}

impl MidiEvent {
    /// Decodes one 4-byte USB-MIDI Event Packet.
    pub fn from_bytes(raw: [u8; 4]) -> Self {
        Self { cable: raw[0] >> 4, cin: raw[0] & 0x0F, data: [raw[1], raw[2], raw[3]] }
    }

    /// Encodes back into the 4-byte wire format.
    pub fn to_bytes(self) -> [u8; 4] {
        [(self.cable << 4) | (self.cin & 0x0F), self.data[0], self.data[1], self.data[2]]
    }

    /// MIDI channel (0-15), for channel-voice messages.
    pub fn channel(&self) -> u8 {
        self.data[0] & 0x0F
    }

    /// True if this event is a note-on with non-zero velocity (a note-on
    /// with velocity 0 is conventionally a note-off).
    pub fn is_note_on(&self) -> bool {
        self.cin == cin::NOTE_ON && self.data[2] != 0
    }
}

/// Splits a buffer of packed USB-MIDI event packets into individual events.
pub fn decode_packets(buf: &[u8]) -> Vec<MidiEvent> {
    buf.chunks_exact(4)
        .map(|c| MidiEvent::from_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Invoked once per received USB-MIDI event packet.
pub type PacketHandler = fn(cable: u32, len: u32, packet: &[u8], context: *mut u8);

/// A bound USB-MIDI streaming interface.
pub struct MidiDevice<E: Env> {
    hcd: Arc<Hcd<E>>,
    name: String,
    ep_in: Endpoint,
    ep_out: Option<Endpoint>,
    split: Option<SplitInfo>,
    handler: Option<PacketHandler>,
    context: *mut u8,
}

// SAFETY: see `crate::hid::KeyboardDevice`.
unsafe impl<E: Env> Send for MidiDevice<E> {}
unsafe impl<E: Env> Sync for MidiDevice<E> {}

impl<E: Env> MidiDevice<E> {
    /// Binds to the streaming interface's bulk IN (and, if present, OUT)
    /// endpoint.
    pub fn new(
        hcd: Arc<Hcd<E>>,
        name: String,
        ep_in: Endpoint,
        ep_out: Option<Endpoint>,
        split: Option<SplitInfo>,
    ) -> Self {
        Self { hcd, name, ep_in, ep_out, split, handler: None, context: core::ptr::null_mut() }
    }

    /// The name this device was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the per-packet callback, invoked once per raw 4-byte event
    /// received on a tick (cable in the high nibble of the packet's first byte).
    pub fn register_handler(&mut self, handler: PacketHandler, context: *mut u8) {
        self.handler = Some(handler);
        self.context = context;
    }

    /// Reads one bulk packet's worth of events (a NAK yields an empty `Vec`,
    /// not an error).
    pub fn poll_events(&mut self) -> Result<Vec<MidiEvent>> {
        let mps = self.ep_in.max_packet_size().max(4) as usize;
        let mut buf = alloc::vec![0u8; mps - mps % 4];
        match self.hcd.transfer(&mut self.ep_in, &mut buf, self.split) {
            Ok(n) => Ok(decode_packets(&buf[..n - n % 4])),
            Err(UsbError::Timeout) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Sends one event, if this device exposes a bulk OUT endpoint.
    pub fn send_event(&mut self, event: MidiEvent) -> Result<()> {
        let ep_out = self.ep_out.as_mut().ok_or(UsbError::NotSupported)?;
        let mut buf = event.to_bytes();
        self.hcd.transfer(ep_out, &mut buf, self.split)?;
        Ok(())
    }

    /// Called once per host tick: drains available events and dispatches
    /// the registered callback once per packet.
    pub fn poll(&mut self) {
        if let Ok(events) = self.poll_events() {
            if let Some(handler) = self.handler {
                for event in events {
                    let bytes = event.to_bytes();
                    handler(event.cable as u32, 4, &bytes, self.context);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_round_trips_through_bytes() {
        let event = MidiEvent { cable: 0, cin: cin::NOTE_ON, data: [0x90, 60, 100] };
        let bytes = event.to_bytes();
        assert_eq!(MidiEvent::from_bytes(bytes), event);
        assert!(event.is_note_on());
    }

    #[test]
    fn velocity_zero_note_on_is_not_is_note_on() {
        let event = MidiEvent { cable: 0, cin: cin::NOTE_ON, data: [0x90, 60, 0] };
        assert!(!event.is_note_on());
    }

    #[test]
    fn decode_packets_splits_multiple_events() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[0x09, 0x90, 60, 100]);
        buf.extend_from_slice(&[0x08, 0x80, 60, 0]);
        let events = decode_packets(&buf);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].cin, cin::NOTE_ON);
        assert_eq!(events[1].cin, cin::NOTE_OFF);
    }
}
