//! Interface-to-function-driver binding (§4.3 "factory").
//!
//! Three attempts are tried in order, mirroring `usbdevice.c`'s
//! `USBDeviceFactoryGetDevice`: vendor/product id first (needed for quirky
//! devices like the SMSC95xx, which reports a vendor-specific interface
//! class), then the device-level class triple, then the interface-level
//! class triple. The first recognized shape wins; if none match, the
//! interface is simply left unbound.

use alloc::sync::Arc;

use crate::channel::SplitInfo;
use crate::configparser::InterfaceEntry;
#[cfg(any(feature = "mass-storage", feature = "hid-boot", feature = "hid-gamepad"))]
use crate::desc::{hid_protocol, hid_subclass, msc_protocol, msc_subclass};
use crate::desc::{self, class, ep_type, DeviceDesc, SetupPacket};
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
#[cfg(feature = "ethernet")]
use crate::eth::EthernetDevice;
use crate::function::FunctionDriver;
#[cfg(feature = "hid-gamepad")]
use crate::gamepad::GamepadDevice;
use crate::hcd::Hcd;
#[cfg(feature = "hid-boot")]
use crate::hid::{KeyboardDevice, MouseDevice};
#[cfg(feature = "midi")]
use crate::midi::MidiDevice;
#[cfg(feature = "mass-storage")]
use crate::msc::MassStorageDevice;
use crate::names::{DeviceKind, NameRegistry};

/// SMSC vendor id (Standard Microsystems / Microchip), the only vendor this
/// crate recognizes a USB-Ethernet adapter by, since the SMSC95xx family
/// reports a vendor-specific interface class rather than a standard one.
#[cfg(feature = "ethernet")]
const SMSC_VENDOR_ID: u16 = 0x0424;

/// USB Audio class streaming subclasses.
#[cfg(feature = "midi")]
mod audio_subclass {
    pub const MIDISTREAMING: u8 = 0x03;
}

/// Attempts to bind `entry` to a concrete function driver, trying
/// vendor/product id, device class triple, then interface class triple.
pub fn bind<E: Env>(
    hcd: Arc<Hcd<E>>,
    device_desc: &DeviceDesc,
    entry: &InterfaceEntry,
    address: u8,
    split: Option<SplitInfo>,
    registry: &mut NameRegistry,
) -> Result<Option<FunctionDriver<E>>> {
    #[allow(unused_variables)]
    let vendor_id = { device_desc.vendor_id };
    #[allow(unused_variables)]
    let product_id = { device_desc.product_id };

    #[cfg(feature = "ethernet")]
    if vendor_id == SMSC_VENDOR_ID {
        if let Some(driver) = try_ethernet(&hcd, entry, address, split, registry)? {
            return Ok(Some(driver));
        }
    }

    #[cfg(feature = "mass-storage")]
    if let Some(driver) = try_mass_storage(&hcd, entry, address, split, registry)? {
        return Ok(Some(driver));
    }
    #[cfg(feature = "hid-boot")]
    if let Some(driver) = try_boot_keyboard(&hcd, entry, address, split, registry)? {
        return Ok(Some(driver));
    }
    #[cfg(feature = "hid-boot")]
    if let Some(driver) = try_boot_mouse(&hcd, entry, address, split, registry)? {
        return Ok(Some(driver));
    }
    #[cfg(feature = "midi")]
    if let Some(driver) = try_midi(&hcd, entry, address, split, registry)? {
        return Ok(Some(driver));
    }
    #[cfg(feature = "hid-gamepad")]
    if let Some(driver) = try_gamepad(&hcd, entry, address, split, vendor_id, product_id, registry)? {
        return Ok(Some(driver));
    }

    Ok(None)
}

fn endpoint_of(entry: &InterfaceEntry, address: u8, transfer_type: u8, is_in: bool) -> Option<Endpoint> {
    entry
        .endpoints
        .iter()
        .find(|e| e.transfer_type() == transfer_type && e.is_in() == is_in)
        .map(|e| Endpoint::from_descriptor(address, e))
}

#[cfg(feature = "mass-storage")]
fn try_mass_storage<E: Env>(
    hcd: &Arc<Hcd<E>>,
    entry: &InterfaceEntry,
    address: u8,
    split: Option<SplitInfo>,
    registry: &mut NameRegistry,
) -> Result<Option<FunctionDriver<E>>> {
    if entry.desc.interface_class != class::MASS_STORAGE
        || entry.desc.interface_subclass != msc_subclass::SCSI_TRANSPARENT
        || entry.desc.interface_protocol != msc_protocol::BBB
    {
        return Ok(None);
    }
    let ep_in = endpoint_of(entry, address, ep_type::BULK, true).ok_or(UsbError::InvEndpoint)?;
    let ep_out = endpoint_of(entry, address, ep_type::BULK, false).ok_or(UsbError::InvEndpoint)?;
    let name = registry.register(DeviceKind::MassStorage);
    let mut dev = MassStorageDevice::new(Arc::clone(hcd), name, entry.desc.interface_number, ep_in, ep_out, split);
    match dev.inquiry(0) {
        Ok(inq) if inq.device_type() == 0x00 => Ok(Some(FunctionDriver::MassStorage(dev))),
        _ => Ok(None),
    }
}

#[cfg(feature = "hid-boot")]
fn try_boot_keyboard<E: Env>(
    hcd: &Arc<Hcd<E>>,
    entry: &InterfaceEntry,
    address: u8,
    split: Option<SplitInfo>,
    registry: &mut NameRegistry,
) -> Result<Option<FunctionDriver<E>>> {
    if entry.desc.interface_class != class::HID
        || entry.desc.interface_subclass != hid_subclass::BOOT
        || entry.desc.interface_protocol != hid_protocol::KEYBOARD
    {
        return Ok(None);
    }
    let ep_in = endpoint_of(entry, address, ep_type::INTERRUPT, true).ok_or(UsbError::InvEndpoint)?;
    let name = registry.register(DeviceKind::Keyboard);
    let dev = KeyboardDevice::new(Arc::clone(hcd), name, entry.desc.interface_number, ep_in, split)?;
    Ok(Some(FunctionDriver::Keyboard(dev)))
}

#[cfg(feature = "hid-boot")]
fn try_boot_mouse<E: Env>(
    hcd: &Arc<Hcd<E>>,
    entry: &InterfaceEntry,
    address: u8,
    split: Option<SplitInfo>,
    registry: &mut NameRegistry,
) -> Result<Option<FunctionDriver<E>>> {
    if entry.desc.interface_class != class::HID
        || entry.desc.interface_subclass != hid_subclass::BOOT
        || entry.desc.interface_protocol != hid_protocol::MOUSE
    {
        return Ok(None);
    }
    let ep_in = endpoint_of(entry, address, ep_type::INTERRUPT, true).ok_or(UsbError::InvEndpoint)?;
    let name = registry.register(DeviceKind::Mouse);
    let dev = MouseDevice::new(Arc::clone(hcd), name, entry.desc.interface_number, ep_in, split)?;
    Ok(Some(FunctionDriver::Mouse(dev)))
}

#[cfg(feature = "midi")]
fn try_midi<E: Env>(
    hcd: &Arc<Hcd<E>>,
    entry: &InterfaceEntry,
    address: u8,
    split: Option<SplitInfo>,
    registry: &mut NameRegistry,
) -> Result<Option<FunctionDriver<E>>> {
    if entry.desc.interface_class != class::AUDIO || entry.desc.interface_subclass != audio_subclass::MIDISTREAMING {
        return Ok(None);
    }
    let ep_in = match endpoint_of(entry, address, ep_type::BULK, true) {
        Some(ep) => ep,
        None => return Ok(None),
    };
    let ep_out = endpoint_of(entry, address, ep_type::BULK, false);
    let name = registry.register(DeviceKind::Midi);
    let dev = MidiDevice::new(Arc::clone(hcd), name, ep_in, ep_out, split);
    Ok(Some(FunctionDriver::Midi(dev)))
}

#[cfg(feature = "hid-gamepad")]
fn try_gamepad<E: Env>(
    hcd: &Arc<Hcd<E>>,
    entry: &InterfaceEntry,
    address: u8,
    split: Option<SplitInfo>,
    vendor_id: u16,
    product_id: u16,
    registry: &mut NameRegistry,
) -> Result<Option<FunctionDriver<E>>> {
    if entry.desc.interface_class != class::HID || entry.hid.is_none() {
        return Ok(None);
    }
    let ep_in = endpoint_of(entry, address, ep_type::INTERRUPT, true).ok_or(UsbError::InvEndpoint)?;
    let hid = entry.hid.unwrap();
    let report_len = hid.report_desc_length;

    let mut ep0 = Endpoint::new_control(address, 8);
    let setup = SetupPacket::new(0x81, desc::request::GET_DESCRIPTOR, (desc::desc_type::HID_REPORT as u16) << 8, entry.desc.interface_number as u16, report_len);
    let mut report_desc = alloc::vec![0u8; report_len as usize];
    hcd.control_transfer(&mut ep0, &setup, &mut report_desc, split)?;

    let name = registry.register(DeviceKind::Gamepad);
    let index = NameRegistry::numeric_suffix(&name);
    let dev = GamepadDevice::new(Arc::clone(hcd), name, index, entry.desc.interface_number, ep_in, split, &report_desc, vendor_id, product_id)?;
    Ok(Some(FunctionDriver::Gamepad(dev)))
}

#[cfg(feature = "ethernet")]
fn try_ethernet<E: Env>(
    hcd: &Arc<Hcd<E>>,
    entry: &InterfaceEntry,
    address: u8,
    split: Option<SplitInfo>,
    registry: &mut NameRegistry,
) -> Result<Option<FunctionDriver<E>>> {
    if entry.endpoints.len() < 2 {
        return Ok(None);
    }
    let ep_in = match endpoint_of(entry, address, ep_type::BULK, true) {
        Some(ep) => ep,
        None => return Ok(None),
    };
    let ep_out = match endpoint_of(entry, address, ep_type::BULK, false) {
        Some(ep) => ep,
        None => return Ok(None),
    };
    let mac = hcd.env().get_mac_address().ok_or(UsbError::InvalidArgument)?;
    let name = registry.register(DeviceKind::Ethernet);
    let dev = EthernetDevice::new(Arc::clone(hcd), name, ep_in, ep_out, split, mac)?;
    Ok(Some(FunctionDriver::Ethernet(dev)))
}
