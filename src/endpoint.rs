//! Per-endpoint state: address, type, direction, max-packet-size and the
//! data-toggle (PID) sequence that must survive across URBs (§9 "Data toggle
//! across URBs").

use crate::desc::EndpointDesc;

/// Endpoint transfer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    /// Bidirectional, SETUP/DATA/STATUS stages.
    Control,
    /// Unidirectional, toggling DATA0/DATA1.
    Bulk,
    /// Unidirectional, polled at `interval_ms`.
    Interrupt,
}

/// Transfer direction; irrelevant for control endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to device.
    Out,
    /// Device to host.
    In,
}

/// The data-toggle PID a packet should carry; `Setup` only ever appears on
/// endpoint 0's SETUP stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pid {
    /// DATA0
    Data0,
    /// DATA1
    Data1,
    /// SETUP (control transfers only)
    Setup,
}

/// A USB endpoint bound to a particular device address.
///
/// Endpoint 0 is created once per device with [`Endpoint::new_control`] and
/// lives for the device's whole lifetime; other endpoints are created during
/// interface configuration from an [`EndpointDesc`].
#[derive(Debug, Clone)]
pub struct Endpoint {
    device_address: u8,
    number: u8,
    direction: Direction,
    ep_type: EndpointType,
    max_packet_size: u16,
    interval_ms: u32,
    toggle: Pid,
}

impl Endpoint {
    /// Creates endpoint 0: control, bidirectional, with the device's default
    /// max-packet-size (8 bytes until the real device descriptor is read).
    pub fn new_control(device_address: u8, max_packet_size: u16) -> Self {
        Self {
            device_address,
            number: 0,
            direction: Direction::In,
            ep_type: EndpointType::Control,
            max_packet_size,
            interval_ms: 0,
            toggle: Pid::Data0,
        }
    }

    /// Creates a non-control endpoint from its descriptor, per
    /// [`EndpointDesc::transfer_type`]/[`EndpointDesc::is_in`].
    pub fn from_descriptor(device_address: u8, desc: &EndpointDesc) -> Self {
        let ep_type = match desc.transfer_type() {
            crate::desc::ep_type::BULK => EndpointType::Bulk,
            crate::desc::ep_type::INTERRUPT => EndpointType::Interrupt,
            _ => EndpointType::Control,
        };
        Self {
            device_address,
            number: desc.number(),
            direction: if desc.is_in() { Direction::In } else { Direction::Out },
            ep_type,
            max_packet_size: desc.packet_size(),
            interval_ms: desc.interval as u32,
            toggle: Pid::Data0,
        }
    }

    /// The device address this endpoint is bound to (updated by `set_address`
    /// the one time enumeration assigns an address to endpoint 0).
    pub fn device_address(&self) -> u8 {
        self.device_address
    }

    /// Rebinds this endpoint to a freshly assigned device address.
    pub fn set_device_address(&mut self, addr: u8) {
        self.device_address = addr;
    }

    /// Endpoint number (0..15, without the direction bit).
    pub fn number(&self) -> u8 {
        self.number
    }

    /// IN or OUT; meaningless (but always `In`) for control endpoints.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Control, bulk or interrupt.
    pub fn ep_type(&self) -> EndpointType {
        self.ep_type
    }

    /// Maximum packet size in bytes.
    pub fn max_packet_size(&self) -> u16 {
        self.max_packet_size
    }

    /// Updates the max-packet-size, used once enumeration reads the real
    /// `bMaxPacketSize0` from the device descriptor.
    pub fn set_max_packet_size(&mut self, mps: u16) {
        self.max_packet_size = mps;
    }

    /// Polling interval in milliseconds; meaningful for interrupt endpoints only.
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// The PID the next packet on this endpoint must carry.
    pub fn current_pid(&self) -> Pid {
        self.toggle
    }

    /// Advances DATA0 <-> DATA1 after a successful data-stage packet. A no-op
    /// on the `Setup` PID, which a caller sets explicitly per transaction.
    pub fn toggle_pid(&mut self) {
        self.toggle = match self.toggle {
            Pid::Data0 => Pid::Data1,
            Pid::Data1 | Pid::Setup => Pid::Data0,
        };
    }

    /// Forces the next packet to carry SETUP (control endpoint 0 only).
    pub fn set_setup_pid(&mut self) {
        self.toggle = Pid::Setup;
    }

    /// Forces the next packet to carry DATA1 (control STATUS stage, or after
    /// CLEAR_FEATURE(HALT)/bulk-storage reset recovery — §4.5, §9 "Data
    /// toggle across URBs").
    pub fn reset_pid(&mut self) {
        self.toggle = Pid::Data1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_alternates_data0_data1() {
        let mut ep = Endpoint::new_control(1, 8);
        ep.reset_pid();
        assert_eq!(ep.current_pid(), Pid::Data1);
        ep.toggle_pid();
        assert_eq!(ep.current_pid(), Pid::Data0);
        ep.toggle_pid();
        assert_eq!(ep.current_pid(), Pid::Data1);
    }
}
