//! SMSC95xx USB-Ethernet adapter support (§4.6).
//!
//! The SMSC95xx family (as embedded in the Raspberry Pi's USB/Ethernet
//! combo chip) exposes its internal register file through vendor-specific
//! control transfers rather than a dedicated configuration endpoint, and
//! frames every bulk transfer with a small command/status header rather
//! than sending raw Ethernet frames — closer to a tiny DMA descriptor than
//! a NIC register block.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::channel::SplitInfo;
use crate::desc::SetupPacket;
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::hcd::Hcd;

/// Vendor-specific request codes (bmRequestType vendor, device recipient).
mod vendor_request {
    pub const WRITE_REGISTER: u8 = 0xA0;
    pub const READ_REGISTER: u8 = 0xA1;
}

/// Internal register file offsets.
pub mod reg {
    /// Chip ID and revision.
    pub const ID_REV: u32 = 0x00;
    /// Interrupt status.
    pub const INT_STS: u32 = 0x08;
    /// Receive configuration.
    pub const RX_CFG: u32 = 0x0C;
    /// Transmit configuration.
    pub const TX_CFG: u32 = 0x10;
    /// Hardware configuration.
    pub const HW_CFG: u32 = 0x14;
    /// Power management control.
    pub const PM_CTRL: u32 = 0x20;
    /// EEPROM command.
    pub const E2P_CMD: u32 = 0x30;
    /// EEPROM data.
    pub const E2P_DATA: u32 = 0x34;
    /// MAC control.
    pub const MAC_CR: u32 = 0x100;
    /// MAC address high (2 bytes + padding).
    pub const ADDRH: u32 = 0x104;
    /// MAC address low (4 bytes).
    pub const ADDRL: u32 = 0x108;
    /// MII (PHY) access address/control.
    pub const MII_ADDR: u32 = 0x114;
    /// MII (PHY) access data.
    pub const MII_DATA: u32 = 0x118;
    /// Flow control.
    pub const FLOW: u32 = 0x11C;
}

/// `MAC_CR` control bits.
mod mac_cr {
    pub const RXEN: u32 = 1 << 2;
    pub const TXEN: u32 = 1 << 3;
    pub const FDPX: u32 = 1 << 20;
}

/// `HW_CFG` control bits.
mod hw_cfg {
    pub const BIR: u32 = 1 << 0;
    pub const LRST: u32 = 1 << 3;
}

/// `MII_ADDR` control bits.
mod mii_addr {
    pub const MIIBZY: u32 = 1 << 0;
    pub const MIIWNR: u32 = 1 << 1;
}

/// Internal PHY's MII address (fixed in the SMSC95xx).
const PHY_ADDR: u32 = 1;
/// PHY Basic Control Register.
const PHY_BCR: u32 = 0;
/// PHY Basic Status Register.
const PHY_BSR: u32 = 1;
/// BCR: restart autonegotiation.
const BCR_ANRESTART: u16 = 1 << 9;
/// BCR: enable autonegotiation.
const BCR_ANENABLE: u16 = 1 << 12;
/// BSR: link up.
const BSR_LSTATUS: u16 = 1 << 2;

/// Bound on polling iterations for `MIIBZY`/`E2P_CMD` busy bits before
/// giving up.
const MAX_POLL: u32 = 100_000;

/// Largest frame `send_frame` accepts (jumbo-free Ethernet MTU plus headroom).
pub const MAX_FRAME_LEN: usize = 1592;

/// Bytes in the command header prefixed to every outgoing bulk packet.
const TX_CMD_LEN: usize = 8;
/// Bytes in the status header prefixed to every incoming bulk packet.
const RX_STATUS_LEN: usize = 4;

/// `TX_CMD_A` bit: this is the only (first and last) segment of the frame.
const TX_CMD_A_FIRST_SEG: u32 = 1 << 13;
const TX_CMD_A_LAST_SEG: u32 = 1 << 12;
const TX_CMD_A_LEN_MASK: u32 = 0x7FF;

const RX_STS_LEN_SHIFT: u32 = 16;
const RX_STS_LEN_MASK: u32 = 0x3FFF;
const RX_STS_ERROR: u32 = 1 << 15;

/// A bound SMSC95xx USB-Ethernet interface.
pub struct EthernetDevice<E: Env> {
    hcd: Arc<Hcd<E>>,
    name: String,
    ep_in: Endpoint,
    ep_out: Endpoint,
    split: Option<SplitInfo>,
    mac_address: [u8; 6],
}

impl<E: Env> EthernetDevice<E> {
    /// Brings the chip up: soft-resets it, programs the MAC address, enables
    /// full-duplex Rx/Tx, and kicks off PHY autonegotiation.
    pub fn new(
        hcd: Arc<Hcd<E>>,
        name: String,
        ep_in: Endpoint,
        ep_out: Endpoint,
        split: Option<SplitInfo>,
        mac_address: [u8; 6],
    ) -> Result<Self> {
        let mut dev = Self { hcd, name, ep_in, ep_out, split, mac_address };
        dev.reset()?;
        dev.set_mac_address(mac_address)?;
        dev.write_register(reg::MAC_CR, mac_cr::RXEN | mac_cr::TXEN | mac_cr::FDPX)?;
        dev.start_autonegotiation()?;
        Ok(dev)
    }

    /// The name this device was registered under (`"eth0"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The MAC address programmed into the chip.
    pub fn mac_address(&self) -> [u8; 6] {
        self.mac_address
    }

    fn control_device(&self) -> Endpoint {
        Endpoint::new_control(self.ep_in.device_address(), 64)
    }

    fn read_register(&mut self, offset: u32) -> Result<u32> {
        let setup = SetupPacket::new(0xC0, vendor_request::READ_REGISTER, 0, offset as u16, 4);
        let mut ep0 = self.control_device();
        let mut buf = [0u8; 4];
        self.hcd.control_transfer(&mut ep0, &setup, &mut buf, self.split)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
        let setup = SetupPacket::new(0x40, vendor_request::WRITE_REGISTER, 0, offset as u16, 4);
        let mut ep0 = self.control_device();
        let mut buf = value.to_le_bytes();
        self.hcd.control_transfer(&mut ep0, &setup, &mut buf, self.split)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.write_register(reg::HW_CFG, hw_cfg::LRST)?;
        let mut tries = 0u32;
        loop {
            if self.read_register(reg::HW_CFG)? & hw_cfg::LRST == 0 {
                break;
            }
            tries += 1;
            if tries > MAX_POLL {
                return Err(UsbError::Timeout);
            }
        }
        self.write_register(reg::HW_CFG, hw_cfg::BIR)?;
        Ok(())
    }

    fn set_mac_address(&mut self, mac: [u8; 6]) -> Result<()> {
        let low = u32::from_le_bytes([mac[0], mac[1], mac[2], mac[3]]);
        let high = u16::from_le_bytes([mac[4], mac[5]]) as u32;
        self.write_register(reg::ADDRL, low)?;
        self.write_register(reg::ADDRH, high)?;
        Ok(())
    }

    fn phy_wait_idle(&mut self) -> Result<()> {
        let mut tries = 0u32;
        while self.read_register(reg::MII_ADDR)? & mii_addr::MIIBZY != 0 {
            tries += 1;
            if tries > MAX_POLL {
                return Err(UsbError::Timeout);
            }
        }
        Ok(())
    }

    fn phy_read(&mut self, phy_reg: u32) -> Result<u16> {
        self.phy_wait_idle()?;
        let addr = (PHY_ADDR << 11) | (phy_reg << 6) | mii_addr::MIIBZY;
        self.write_register(reg::MII_ADDR, addr)?;
        self.phy_wait_idle()?;
        Ok(self.read_register(reg::MII_DATA)? as u16)
    }

    fn phy_write(&mut self, phy_reg: u32, value: u16) -> Result<()> {
        self.phy_wait_idle()?;
        self.write_register(reg::MII_DATA, value as u32)?;
        let addr = (PHY_ADDR << 11) | (phy_reg << 6) | mii_addr::MIIBZY | mii_addr::MIIWNR;
        self.write_register(reg::MII_ADDR, addr)?;
        self.phy_wait_idle()
    }

    fn start_autonegotiation(&mut self) -> Result<()> {
        self.phy_write(PHY_BCR, BCR_ANENABLE | BCR_ANRESTART)
    }

    /// True if the PHY reports the link up.
    pub fn link_up(&mut self) -> Result<bool> {
        Ok(self.phy_read(PHY_BSR)? & BSR_LSTATUS != 0)
    }

    /// Sends one Ethernet frame, adding the chip's 8-byte TX command header.
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() >= MAX_FRAME_LEN {
            return Err(UsbError::InvalidArgument);
        }
        let mut buf = Vec::with_capacity(TX_CMD_LEN + frame.len());
        let cmd_a = TX_CMD_A_FIRST_SEG | TX_CMD_A_LAST_SEG | (frame.len() as u32 & TX_CMD_A_LEN_MASK);
        buf.extend_from_slice(&cmd_a.to_le_bytes());
        buf.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        buf.extend_from_slice(frame);
        self.hcd.transfer(&mut self.ep_out, &mut buf, self.split)?;
        Ok(())
    }

    /// Reads one bulk IN packet and strips its 4-byte RX status header,
    /// returning the enclosed frame. A NAK (nothing queued) yields `None`.
    pub fn receive_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mps = self.ep_in.max_packet_size().max(RX_STATUS_LEN as u16) as usize;
        let mut buf = alloc::vec![0u8; mps];
        match self.hcd.transfer(&mut self.ep_in, &mut buf, self.split) {
            Ok(n) if n >= RX_STATUS_LEN => {
                let status = u32::from_le_bytes(buf[0..4].try_into().unwrap());
                if status & RX_STS_ERROR != 0 {
                    return Err(UsbError::XferFail((status >> 16) as u8));
                }
                let len = ((status >> RX_STS_LEN_SHIFT) & RX_STS_LEN_MASK) as usize;
                let end = (RX_STATUS_LEN + len).min(n);
                Ok(Some(buf[RX_STATUS_LEN..end].to_vec()))
            }
            Ok(_) => Ok(None),
            Err(UsbError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Called once per host tick: drains one pending receive, if any.
    /// Callers needing every frame should poll [`EthernetDevice::receive_frame`] directly.
    pub fn poll(&mut self) {
        let _ = self.receive_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_command_header_encodes_length_and_segment_flags() {
        let cmd_a = TX_CMD_A_FIRST_SEG | TX_CMD_A_LAST_SEG | (64 & TX_CMD_A_LEN_MASK);
        assert_eq!(cmd_a & TX_CMD_A_LEN_MASK, 64);
        assert_ne!(cmd_a & TX_CMD_A_FIRST_SEG, 0);
    }

    #[test]
    fn max_frame_len_matches_boundary() {
        assert_eq!(MAX_FRAME_LEN, 1592);
    }

    #[test]
    fn rx_status_extracts_frame_length() {
        let status: u32 = (100u32 << RX_STS_LEN_SHIFT) & (RX_STS_LEN_MASK << RX_STS_LEN_SHIFT);
        let len = (status >> RX_STS_LEN_SHIFT) & RX_STS_LEN_MASK;
        assert_eq!(len, 100);
    }
}
