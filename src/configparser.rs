//! Configuration descriptor walker (§3 "Configuration-parser cursor", §4.3).
//!
//! A configuration descriptor is one flat byte blob: a `ConfigDesc` header
//! followed by a variable run of interface, endpoint, HID and class-specific
//! descriptors back to back, each self-describing its own length. This walks
//! that blob once and groups endpoints (and an optional HID descriptor) under
//! the interface descriptor that precedes them, the same way the old
//! interface-hunting helpers in the class drivers used to scan it by hand.

use alloc::vec::Vec;

use crate::desc::{self, ConfigDesc, EndpointDesc, HidDesc, InterfaceDesc};
use crate::err::{Result, UsbError};

/// One interface and the endpoint/HID descriptors that belong to it.
#[derive(Debug, Clone)]
pub struct InterfaceEntry {
    /// The interface descriptor itself.
    pub desc: InterfaceDesc,
    /// Endpoints declared under this interface, in descriptor order.
    pub endpoints: Vec<EndpointDesc>,
    /// HID class descriptor, if this interface's class is HID.
    pub hid: Option<HidDesc>,
}

/// Reads the 9-byte configuration descriptor header from the start of `data`.
pub fn config_desc(data: &[u8]) -> Result<ConfigDesc> {
    if data.len() < core::mem::size_of::<ConfigDesc>() {
        return Err(UsbError::InvalidDescriptor);
    }
    Ok(unsafe { core::ptr::read_unaligned(data.as_ptr() as *const ConfigDesc) })
}

/// Walks the full configuration blob (header included) and returns every
/// interface descriptor it declares, each with its endpoints/HID descriptor
/// attached.
///
/// Alternate settings are returned as separate entries (same
/// `interface_number`, distinct `alternate_setting`); callers that don't care
/// about alternates should keep the first (`alternate_setting == 0`) entry
/// per interface number.
pub fn parse_interfaces(data: &[u8]) -> Result<Vec<InterfaceEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0usize;
    let mut current: Option<InterfaceEntry> = None;

    while pos + 2 <= data.len() {
        let len = data[pos] as usize;
        let desc_type = data[pos + 1];
        if len < 2 || pos + len > data.len() {
            break;
        }
        let raw = &data[pos..pos + len];

        match desc_type {
            desc::desc_type::INTERFACE => {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
                if len < core::mem::size_of::<InterfaceDesc>() {
                    return Err(UsbError::InvalidDescriptor);
                }
                let desc = unsafe { core::ptr::read_unaligned(raw.as_ptr() as *const InterfaceDesc) };
                current = Some(InterfaceEntry { desc, endpoints: Vec::new(), hid: None });
            }
            desc::desc_type::ENDPOINT => {
                if len < core::mem::size_of::<EndpointDesc>() {
                    return Err(UsbError::InvalidDescriptor);
                }
                let ep = unsafe { core::ptr::read_unaligned(raw.as_ptr() as *const EndpointDesc) };
                if let Some(entry) = current.as_mut() {
                    entry.endpoints.push(ep);
                }
            }
            desc::desc_type::HID => {
                if len < core::mem::size_of::<HidDesc>() {
                    return Err(UsbError::InvalidDescriptor);
                }
                let hid = unsafe { core::ptr::read_unaligned(raw.as_ptr() as *const HidDesc) };
                if let Some(entry) = current.as_mut() {
                    entry.hid = Some(hid);
                }
            }
            _ => {}
        }

        pos += len;
    }

    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(num: u8, class: u8, subclass: u8, protocol: u8, num_ep: u8) -> [u8; 9] {
        [9, desc::desc_type::INTERFACE, num, 0, num_ep, class, subclass, protocol, 0]
    }

    fn ep(addr: u8, attrs: u8, mps: u16, interval: u8) -> [u8; 7] {
        let mps = mps.to_le_bytes();
        [7, desc::desc_type::ENDPOINT, addr, attrs, mps[0], mps[1], interval]
    }

    #[test]
    fn groups_endpoints_under_their_interface() {
        let mut blob = Vec::new();
        blob.extend_from_slice(&iface(0, desc::class::MASS_STORAGE, 6, 0x50, 2));
        blob.extend_from_slice(&ep(0x81, 2, 512, 0));
        blob.extend_from_slice(&ep(0x02, 2, 512, 0));

        let entries = parse_interfaces(&blob).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].endpoints.len(), 2);
        assert!(entries[0].endpoints[0].is_in());
        assert!(entries[0].endpoints[1].is_out());
    }

    #[test]
    fn two_interfaces_dont_cross_contaminate_endpoints() {
        let mut blob = Vec::new();
        blob.extend_from_slice(&iface(0, desc::class::HID, 1, 1, 1));
        blob.extend_from_slice(&ep(0x81, 3, 8, 10));
        blob.extend_from_slice(&iface(1, desc::class::HID, 1, 2, 1));
        blob.extend_from_slice(&ep(0x82, 3, 4, 10));

        let entries = parse_interfaces(&blob).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].endpoints.len(), 1);
        assert_eq!(entries[1].endpoints.len(), 1);
        assert_eq!(entries[0].endpoints[0].number(), 1);
        assert_eq!(entries[1].endpoints[0].number(), 2);
    }
}
