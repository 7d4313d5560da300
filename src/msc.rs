//! USB Mass Storage Class (MSC) support (§4.5).
//!
//! Bulk-Only Transport (BOT): a CBW precedes every SCSI command, a CSW
//! follows the data phase, and any failed command is followed by a full
//! BOT reset (MSC reset, clear both endpoint halts, reset both data
//! toggles) before the next retry — the same escalation
//! `usbmassdevice.c`'s `Read`/`Write` use.

use alloc::string::String;
use alloc::sync::Arc;

use crate::channel::SplitInfo;
use crate::desc::{class, feature, SetupPacket};
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::hcd::Hcd;

/// Command Block Wrapper (CBW) - 31 bytes.
///
/// Used to send SCSI commands over USB Bulk-Only Transport.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug)]
pub struct Cbw {
    /// Signature (must be 0x43425355 "USBC")
    pub signature: u32,
    /// Tag to associate CBW with CSW
    pub tag: u32,
    /// Number of bytes to transfer
    pub data_transfer_length: u32,
    /// Flags (bit 7: direction, 0=OUT, 1=IN)
    pub flags: u8,
    /// LUN (bits 3:0)
    pub lun: u8,
    /// Command block length (1-16)
    pub cb_length: u8,
    /// Command block (SCSI CDB)
    pub cb: [u8; 16],
}

impl Cbw {
    /// CBW signature constant.
    pub const SIGNATURE: u32 = 0x43425355;

    /// Creates a new CBW.
    pub fn new(tag: u32, length: u32, direction_in: bool, lun: u8, cdb: &[u8]) -> Self {
        let mut cb = [0u8; 16];
        let len = cdb.len().min(16);
        cb[..len].copy_from_slice(&cdb[..len]);

        Self {
            signature: Self::SIGNATURE,
            tag,
            data_transfer_length: length,
            flags: if direction_in { 0x80 } else { 0x00 },
            lun: lun & 0x0F,
            cb_length: len as u8,
            cb,
        }
    }

    fn to_bytes(self) -> [u8; 31] {
        let mut buf = [0u8; 31];
        buf[0..4].copy_from_slice(&self.signature.to_le_bytes());
        buf[4..8].copy_from_slice(&self.tag.to_le_bytes());
        buf[8..12].copy_from_slice(&self.data_transfer_length.to_le_bytes());
        buf[12] = self.flags;
        buf[13] = self.lun;
        buf[14] = self.cb_length;
        buf[15..31].copy_from_slice(&self.cb);
        buf
    }
}

/// Command Status Wrapper (CSW) - 13 bytes.
///
/// Status returned after a SCSI command completes.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Csw {
    /// Signature (must be 0x53425355 "USBS")
    pub signature: u32,
    /// Tag (should match CBW tag)
    pub tag: u32,
    /// Data residue (difference between expected and actual)
    pub data_residue: u32,
    /// Status (0=passed, 1=failed, 2=phase error)
    pub status: u8,
}

impl Csw {
    /// CSW signature constant.
    pub const SIGNATURE: u32 = 0x53425355;

    /// Command passed.
    pub const STATUS_PASSED: u8 = 0;
    /// Command failed.
    pub const STATUS_FAILED: u8 = 1;
    /// Phase error.
    pub const STATUS_PHASE_ERROR: u8 = 2;

    /// Returns true if the command completed successfully: signature and
    /// tag match the CBW that started it, no residue, and status PASSED.
    pub fn is_ok(&self, expected_tag: u32) -> bool {
        self.signature == Self::SIGNATURE
            && self.tag == expected_tag
            && self.data_residue == 0
            && self.status == Self::STATUS_PASSED
    }

    fn from_bytes(buf: &[u8; 13]) -> Self {
        Self {
            signature: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            tag: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            data_residue: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            status: buf[12],
        }
    }
}

/// SCSI operation codes.
pub mod scsi_op {
    /// Test Unit Ready
    pub const TEST_UNIT_READY: u8 = 0x00;
    /// Request Sense
    pub const REQUEST_SENSE: u8 = 0x03;
    /// Format Unit
    pub const FORMAT_UNIT: u8 = 0x04;
    /// Inquiry
    pub const INQUIRY: u8 = 0x12;
    /// Mode Select (6)
    pub const MODE_SELECT_6: u8 = 0x15;
    /// Mode Sense (6)
    pub const MODE_SENSE_6: u8 = 0x1A;
    /// Start Stop Unit
    pub const START_STOP_UNIT: u8 = 0x1B;
    /// Prevent Allow Medium Removal
    pub const PREVENT_ALLOW_MEDIUM_REMOVAL: u8 = 0x1E;
    /// Read Format Capacities
    pub const READ_FORMAT_CAPACITIES: u8 = 0x23;
    /// Read Capacity (10)
    pub const READ_CAPACITY_10: u8 = 0x25;
    /// Read (10)
    pub const READ_10: u8 = 0x28;
    /// Write (10)
    pub const WRITE_10: u8 = 0x2A;
    /// Seek (10)
    pub const SEEK_10: u8 = 0x2B;
    /// Write and Verify (10)
    pub const WRITE_AND_VERIFY_10: u8 = 0x2E;
    /// Verify (10)
    pub const VERIFY_10: u8 = 0x2F;
    /// Synchronize Cache (10)
    pub const SYNCHRONIZE_CACHE_10: u8 = 0x35;
    /// Read TOC
    pub const READ_TOC: u8 = 0x43;
    /// Mode Select (10)
    pub const MODE_SELECT_10: u8 = 0x55;
    /// Mode Sense (10)
    pub const MODE_SENSE_10: u8 = 0x5A;
    /// Read (12)
    pub const READ_12: u8 = 0xA8;
    /// Write (12)
    pub const WRITE_12: u8 = 0xAA;
    /// Read Capacity (16)
    pub const READ_CAPACITY_16: u8 = 0x9E;
    /// Read (16)
    pub const READ_16: u8 = 0x88;
    /// Write (16)
    pub const WRITE_16: u8 = 0x8A;
}

/// Standard Inquiry response (first 36 bytes).
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct InquiryData {
    /// Peripheral qualifier and device type
    pub peripheral: u8,
    /// RMB (removable media bit) in bit 7
    pub rmb: u8,
    /// Version
    pub version: u8,
    /// Response data format
    pub response_format: u8,
    /// Additional length
    pub additional_length: u8,
    /// Flags
    pub flags: [u8; 3],
    /// Vendor identification (8 bytes)
    pub vendor: [u8; 8],
    /// Product identification (16 bytes)
    pub product: [u8; 16],
    /// Product revision (4 bytes)
    pub revision: [u8; 4],
}

impl InquiryData {
    /// Returns the peripheral device type (0x00 = direct access block device).
    pub fn device_type(&self) -> u8 {
        self.peripheral & 0x1F
    }

    /// Returns true if the medium is removable.
    pub fn is_removable(&self) -> bool {
        (self.rmb & 0x80) != 0
    }
}

/// Read Capacity (10) response data.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadCapacity10Data {
    /// Last logical block address (big-endian)
    pub last_lba: u32,
    /// Block size in bytes (big-endian)
    pub block_size: u32,
}

impl ReadCapacity10Data {
    /// Returns the last LBA (converted from big-endian).
    pub fn last_lba(&self) -> u32 {
        u32::from_be(self.last_lba)
    }

    /// Returns the block size (converted from big-endian).
    pub fn block_size(&self) -> u32 {
        u32::from_be(self.block_size)
    }

    /// Returns the total capacity in bytes.
    pub fn capacity_bytes(&self) -> u64 {
        (self.last_lba() as u64 + 1) * self.block_size() as u64
    }
}

/// Request Sense data (fixed format).
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestSenseData {
    /// Response code (0x70 or 0x71)
    pub response_code: u8,
    /// Obsolete
    pub obsolete: u8,
    /// Sense key, flags
    pub sense_key: u8,
    /// Information
    pub information: [u8; 4],
    /// Additional sense length
    pub additional_sense_length: u8,
    /// Command-specific information
    pub command_specific: [u8; 4],
    /// Additional sense code
    pub asc: u8,
    /// Additional sense code qualifier
    pub ascq: u8,
    /// Field replaceable unit code
    pub fruc: u8,
    /// Sense key specific
    pub sense_key_specific: [u8; 3],
}

impl RequestSenseData {
    /// Returns the sense key.
    pub fn sense_key(&self) -> u8 {
        self.sense_key & 0x0F
    }
}

/// SCSI sense keys.
pub mod sense_key {
    /// No sense
    pub const NO_SENSE: u8 = 0x00;
    /// Recovered error
    pub const RECOVERED_ERROR: u8 = 0x01;
    /// Not ready
    pub const NOT_READY: u8 = 0x02;
    /// Medium error
    pub const MEDIUM_ERROR: u8 = 0x03;
    /// Hardware error
    pub const HARDWARE_ERROR: u8 = 0x04;
    /// Illegal request
    pub const ILLEGAL_REQUEST: u8 = 0x05;
    /// Unit attention
    pub const UNIT_ATTENTION: u8 = 0x06;
    /// Data protect
    pub const DATA_PROTECT: u8 = 0x07;
    /// Blank check
    pub const BLANK_CHECK: u8 = 0x08;
    /// Vendor specific
    pub const VENDOR_SPECIFIC: u8 = 0x09;
    /// Copy aborted
    pub const COPY_ABORTED: u8 = 0x0A;
    /// Aborted command
    pub const ABORTED_COMMAND: u8 = 0x0B;
    /// Volume overflow
    pub const VOLUME_OVERFLOW: u8 = 0x0D;
    /// Miscompare
    pub const MISCOMPARE: u8 = 0x0E;
}

/// Block size assumed when a caller doesn't already know it (overridden once
/// [`MassStorageDevice::read_capacity`] has run).
pub const DEFAULT_BLOCK_SIZE: u32 = 512;

/// Times a BOT command is retried (stall-recover, then reset-recover) before
/// giving up, matching the original driver's escalation.
const MAX_RETRIES: u32 = 4;

/// Write flag: Force Unit Access — bypass the device's write cache.
pub const FUA: u8 = 0x08;

/// A bound mass-storage interface, driven over Bulk-Only Transport.
pub struct MassStorageDevice<E: Env> {
    hcd: Arc<Hcd<E>>,
    name: String,
    interface: u8,
    ep_in: Endpoint,
    ep_out: Endpoint,
    split: Option<SplitInfo>,
    max_lun: u8,
    tag: u32,
}

impl<E: Env> MassStorageDevice<E> {
    /// Binds to `interface`'s two bulk endpoints, reads `GET_MAX_LUN`, and
    /// returns the driver ready for [`MassStorageDevice::read_blocks`]/
    /// [`MassStorageDevice::write_blocks`].
    pub fn new(
        hcd: Arc<Hcd<E>>,
        name: String,
        interface: u8,
        ep_in: Endpoint,
        ep_out: Endpoint,
        split: Option<SplitInfo>,
    ) -> Self {
        let mut dev = Self { hcd, name, interface, ep_in, ep_out, split, max_lun: 0, tag: 1 };
        dev.max_lun = dev.read_max_lun().unwrap_or(0);
        dev
    }

    /// The name this device was registered under (`"umsd1"`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Highest valid LUN (0 for single-LUN devices).
    pub fn max_lun(&self) -> u8 {
        self.max_lun
    }

    fn read_max_lun(&mut self) -> Result<u8> {
        let setup = SetupPacket::msc_get_max_lun(self.interface);
        let ep0 = &mut Endpoint::new_control(self.ep_in.device_address(), 8);
        let mut buf = [0u8; 1];
        match self.hcd.control_transfer(ep0, &setup, &mut buf, self.split) {
            Ok(_) => Ok(buf[0]),
            Err(UsbError::Stall) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Bulk-Only Mass Storage Reset followed by clearing both endpoint
    /// halts, per the Bulk-Only Transport spec's recovery sequence.
    pub fn reset(&mut self) -> Result<()> {
        let setup = SetupPacket::msc_reset(self.interface);
        let mut ep0 = Endpoint::new_control(self.ep_in.device_address(), 8);
        let mut empty = [0u8; 0];
        self.hcd.control_transfer(&mut ep0, &setup, &mut empty, self.split)?;
        self.clear_halt_both()?;
        self.ep_in.reset_pid();
        self.ep_out.reset_pid();
        Ok(())
    }

    fn clear_halt_both(&mut self) -> Result<()> {
        self.clear_halt(self.ep_in.number() | 0x80)?;
        self.clear_halt(self.ep_out.number())?;
        Ok(())
    }

    fn clear_halt(&mut self, endpoint_address: u8) -> Result<()> {
        let setup = SetupPacket::clear_endpoint_feature(feature::ENDPOINT_HALT as u16, endpoint_address);
        let mut ep0 = Endpoint::new_control(self.ep_in.device_address(), 8);
        let mut empty = [0u8; 0];
        self.hcd.control_transfer(&mut ep0, &setup, &mut empty, self.split).map(|_| ())
    }

    /// Runs one SCSI command over Bulk-Only Transport, running a full BOT
    /// reset before each retry on failure.
    pub fn scsi_command(
        &mut self,
        lun: u8,
        cdb: &[u8],
        data: Option<&mut [u8]>,
        direction_in: bool,
    ) -> Result<usize> {
        let mut data = data;
        let mut last_err = UsbError::Timeout;
        for _ in 0..MAX_RETRIES {
            match self.try_scsi_command(lun, cdb, data.as_deref_mut(), direction_in) {
                Ok(n) => return Ok(n),
                Err(e) => {
                    last_err = e;
                    self.reset()?;
                }
            }
        }
        Err(last_err)
    }

    fn try_scsi_command(
        &mut self,
        lun: u8,
        cdb: &[u8],
        data: Option<&mut [u8]>,
        direction_in: bool,
    ) -> Result<usize> {
        let data_len = data.as_ref().map(|d| d.len()).unwrap_or(0);

        let cbw = Cbw::new(self.tag, data_len as u32, direction_in, lun, cdb);
        self.tag = self.tag.wrapping_add(1);
        let mut cbw_bytes = cbw.to_bytes();
        self.hcd.transfer(&mut self.ep_out, &mut cbw_bytes, self.split)?;

        let transferred = if let Some(buf) = data {
            if direction_in {
                self.hcd.transfer(&mut self.ep_in, buf, self.split)?
            } else {
                self.hcd.transfer(&mut self.ep_out, buf, self.split)?
            }
        } else {
            0
        };

        let mut csw_bytes = [0u8; 13];
        self.hcd.transfer(&mut self.ep_in, &mut csw_bytes, self.split)?;
        let csw = Csw::from_bytes(&csw_bytes);

        if !csw.is_ok(cbw.tag) {
            return Err(UsbError::XferFail(csw.status));
        }
        Ok(transferred)
    }

    /// Sends TEST UNIT READY.
    pub fn test_unit_ready(&mut self, lun: u8) -> Result<bool> {
        let cdb = [scsi_op::TEST_UNIT_READY, 0, 0, 0, 0, 0];
        match self.scsi_command(lun, &cdb, None, false) {
            Ok(_) => Ok(true),
            Err(UsbError::XferFail(1)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Sends INQUIRY.
    pub fn inquiry(&mut self, lun: u8) -> Result<InquiryData> {
        let cdb = [scsi_op::INQUIRY, 0, 0, 0, 36, 0];
        let mut data = [0u8; 36];
        self.scsi_command(lun, &cdb, Some(&mut data), true)?;
        Ok(unsafe { core::ptr::read_unaligned(data.as_ptr() as *const InquiryData) })
    }

    /// Sends READ CAPACITY (10).
    pub fn read_capacity(&mut self, lun: u8) -> Result<ReadCapacity10Data> {
        let cdb = [scsi_op::READ_CAPACITY_10, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut data = [0u8; 8];
        self.scsi_command(lun, &cdb, Some(&mut data), true)?;
        Ok(unsafe { core::ptr::read_unaligned(data.as_ptr() as *const ReadCapacity10Data) })
    }

    /// Sends REQUEST SENSE.
    pub fn request_sense(&mut self, lun: u8) -> Result<RequestSenseData> {
        let cdb = [scsi_op::REQUEST_SENSE, 0, 0, 0, 18, 0];
        let mut data = [0u8; 18];
        self.scsi_command(lun, &cdb, Some(&mut data), true)?;
        Ok(unsafe { core::ptr::read_unaligned(data.as_ptr() as *const RequestSenseData) })
    }

    /// Reads `count` blocks starting at `lba` (READ 10).
    pub fn read_blocks(&mut self, lun: u8, lba: u32, count: u16, buf: &mut [u8]) -> Result<usize> {
        let cdb = [
            scsi_op::READ_10, 0,
            (lba >> 24) as u8, (lba >> 16) as u8, (lba >> 8) as u8, lba as u8,
            0, (count >> 8) as u8, count as u8, 0,
        ];
        self.scsi_command(lun, &cdb, Some(buf), true)
    }

    /// Writes `count` blocks starting at `lba` (WRITE 10). Pass `fua = true`
    /// to bypass the device's write cache for this command.
    pub fn write_blocks(
        &mut self,
        lun: u8,
        lba: u32,
        count: u16,
        buf: &mut [u8],
        fua: bool,
    ) -> Result<usize> {
        let cdb = [
            scsi_op::WRITE_10,
            if fua { FUA } else { 0 },
            (lba >> 24) as u8, (lba >> 16) as u8, (lba >> 8) as u8, lba as u8,
            0, (count >> 8) as u8, count as u8, 0,
        ];
        self.scsi_command(lun, &cdb, Some(buf), false)
    }

    /// Sends SYNCHRONIZE CACHE (10).
    pub fn sync_cache(&mut self, lun: u8) -> Result<()> {
        let cdb = [scsi_op::SYNCHRONIZE_CACHE_10, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        self.scsi_command(lun, &cdb, None, false)?;
        Ok(())
    }

    /// Interface number this driver is bound to.
    pub fn interface(&self) -> u8 {
        self.interface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbw_round_trips_through_bytes() {
        let cbw = Cbw::new(7, 512, true, 0, &[scsi_op::READ_10, 0, 0, 0, 0, 1, 0, 0, 1, 0]);
        let bytes = cbw.to_bytes();
        assert_eq!(&bytes[0..4], &Cbw::SIGNATURE.to_le_bytes());
        assert_eq!(bytes[12], 0x80);
    }

    #[test]
    fn csw_is_ok_requires_signature_tag_residue_and_status() {
        let mut buf = [0u8; 13];
        buf[0..4].copy_from_slice(&Csw::SIGNATURE.to_le_bytes());
        buf[4..8].copy_from_slice(&7u32.to_le_bytes());
        let csw = Csw::from_bytes(&buf);
        assert!(csw.is_ok(7));
        assert!(!csw.is_ok(8)); // stale/mismatched tag

        buf[12] = 1; // status FAILED
        assert!(!Csw::from_bytes(&buf).is_ok(7));
        buf[12] = 0;

        buf[8..12].copy_from_slice(&1u32.to_le_bytes()); // nonzero residue
        assert!(!Csw::from_bytes(&buf).is_ok(7));
    }

    #[test]
    fn inquiry_data_decodes_removable_bit() {
        let mut data = [0u8; 36];
        data[1] = 0x80;
        let inq = unsafe { core::ptr::read_unaligned(data.as_ptr() as *const InquiryData) };
        assert!(inq.is_removable());
    }
}

/// True if `interface_class` identifies mass storage, per the USB class
/// spec (used by [`crate::factory`] to recognize a bindable interface).
pub const fn is_mass_storage_interface(interface_class: u8) -> bool {
    interface_class == class::MASS_STORAGE
}
