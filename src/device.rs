//! Device enumeration and configuration (§4.3).
//!
//! Brings a freshly attached device from address 0 up through a bound
//! configuration: fetch the 8-byte prefix of the device descriptor to learn
//! the real `bMaxPacketSize0`, assign an address, fetch the full device and
//! configuration descriptors, then walk the configuration blob binding one
//! [`FunctionDriver`] per interface through [`crate::factory`]. A device
//! whose interface advertises the hub class additionally grows a nested
//! [`Hub`], recursed into during `configure`.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::channel::SplitInfo;
use crate::configparser::{self, InterfaceEntry};
use crate::desc::{self, request, DeviceDesc, SetupPacket};
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::factory;
use crate::function::FunctionDriver;
use crate::hcd::Hcd;
use crate::hub::Hub;
use crate::names::NameRegistry;
use crate::usbstring;

/// First address handed out to a non-root device; address 0 is reserved for
/// an unconfigured device during enumeration.
pub const USB_FIRST_DEDICATED_ADDRESS: u8 = 1;
/// Highest address a device may be assigned (7-bit address field).
pub const USB_MAX_ADDRESS: u8 = 127;
/// Upper bound on a configuration descriptor's total size; guards against a
/// malformed `wTotalLength` looping the parser over attacker-controlled data.
pub const MAX_CONFIG_DESC_SIZE: usize = 512;

/// Hands out device addresses from a monotonic counter, failing once the
/// 7-bit address space is exhausted.
pub struct AddressAllocator {
    next: u8,
}

impl AddressAllocator {
    /// Starts handing out addresses from [`USB_FIRST_DEDICATED_ADDRESS`].
    pub fn new() -> Self {
        Self { next: USB_FIRST_DEDICATED_ADDRESS }
    }

    /// Returns the next free address, or [`UsbError::TooManyDevices`] once
    /// [`USB_MAX_ADDRESS`] is exceeded.
    pub fn allocate(&mut self) -> Result<u8> {
        if self.next > USB_MAX_ADDRESS {
            return Err(UsbError::TooManyDevices);
        }
        let addr = self.next;
        self.next += 1;
        Ok(addr)
    }
}

impl Default for AddressAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// One enumerated and configured USB device.
pub struct Device<E: Env> {
    hcd: Arc<Hcd<E>>,
    address: u8,
    ep0: Endpoint,
    device_desc: DeviceDesc,
    split: Option<SplitInfo>,
    functions: Vec<FunctionDriver<E>>,
    hub: Option<Box<Hub<E>>>,
    names: String,
}

impl<E: Env> Device<E> {
    /// Runs the full bring-up sequence against whatever is currently sitting
    /// at address 0 on `ep0`'s bus segment: descriptor fetch, address
    /// assignment, configuration fetch, interface-to-function binding, and
    /// (if any interface is hub class) descending into its downstream ports.
    pub fn enumerate(
        hcd: Arc<Hcd<E>>,
        split: Option<SplitInfo>,
        addresses: &mut AddressAllocator,
        registry: &mut NameRegistry,
    ) -> Result<Self> {
        let mut ep0 = Endpoint::new_control(0, 8);

        let mut prefix = [0u8; 8];
        let setup = SetupPacket::get_descriptor(desc::desc_type::DEVICE, 0, 8);
        hcd.control_transfer(&mut ep0, &setup, &mut prefix, split)?;
        let max_packet_size0 = prefix[7] as u16;
        ep0.set_max_packet_size(max_packet_size0);

        let address = addresses.allocate()?;
        let setup = SetupPacket::new(0x00, request::SET_ADDRESS, address as u16, 0, 0);
        let mut empty = [0u8; 0];
        hcd.control_transfer(&mut ep0, &setup, &mut empty, split)?;
        hcd.env().ms_delay(2);
        ep0.set_device_address(address);

        let mut dev_bytes = [0u8; core::mem::size_of::<DeviceDesc>()];
        let setup = SetupPacket::get_descriptor(desc::desc_type::DEVICE, 0, dev_bytes.len() as u16);
        hcd.control_transfer(&mut ep0, &setup, &mut dev_bytes, split)?;
        let device_desc: DeviceDesc = unsafe { core::ptr::read_unaligned(dev_bytes.as_ptr() as *const DeviceDesc) };

        let mut header = [0u8; 9];
        let setup = SetupPacket::get_descriptor(desc::desc_type::CONFIGURATION, 0, 9);
        hcd.control_transfer(&mut ep0, &setup, &mut header, split)?;
        let total_length = (u16::from_le_bytes([header[2], header[3]]) as usize).min(MAX_CONFIG_DESC_SIZE);

        let mut config_blob = alloc::vec![0u8; total_length];
        let setup = SetupPacket::get_descriptor(desc::desc_type::CONFIGURATION, 0, total_length as u16);
        hcd.control_transfer(&mut ep0, &setup, &mut config_blob, split)?;
        let config_desc = configparser::config_desc(&config_blob)?;

        let interfaces = configparser::parse_interfaces(&config_blob)?;
        let primary: Vec<&InterfaceEntry> = interfaces.iter().filter(|e| e.desc.alternate_setting == 0).collect();

        let names = Self::resolve_names(&hcd, &mut ep0, &device_desc, split);

        let mut functions = Vec::new();
        let mut hub = None;
        for entry in &primary {
            if entry.desc.interface_class == desc::class::HUB {
                let h = Hub::from_interface(Arc::clone(&hcd), address, max_packet_size0, entry, split, addresses, registry)?;
                hub = Some(Box::new(h));
                continue;
            }
            if let Some(driver) = factory::bind(Arc::clone(&hcd), &device_desc, entry, address, split, registry)? {
                functions.push(driver);
            }
        }

        if functions.is_empty() && hub.is_none() {
            return Err(UsbError::DeviceNotFound);
        }

        let setup = SetupPacket::set_configuration(config_desc.config_value);
        let mut empty = [0u8; 0];
        hcd.control_transfer(&mut ep0, &setup, &mut empty, split)?;

        hcd.env().log_write(
            "device",
            crate::env::Severity::Notice,
            format_args!("{} found", names),
        );

        Ok(Self { hcd, address, ep0, device_desc, split, functions, hub, names })
    }

    fn resolve_names(hcd: &Arc<Hcd<E>>, ep0: &mut Endpoint, device_desc: &DeviceDesc, split: Option<SplitInfo>) -> String {
        let manufacturer = Self::string_descriptor(hcd, ep0, device_desc.manufacturer, split);
        let product = Self::string_descriptor(hcd, ep0, device_desc.product, split);
        match (manufacturer, product) {
            (Some(m), Some(p)) => format!("{} {}", m, p),
            (None, Some(p)) => p,
            (Some(m), None) => m,
            (None, None) => format!("vid{:04x}-pid{:04x}", { device_desc.vendor_id }, { device_desc.product_id }),
        }
    }

    fn string_descriptor(hcd: &Arc<Hcd<E>>, ep0: &mut Endpoint, index: u8, split: Option<SplitInfo>) -> Option<String> {
        if index == 0 {
            return None;
        }
        let mut lang_buf = [0u8; 4];
        let setup = SetupPacket::get_descriptor(desc::desc_type::STRING, 0, 4);
        hcd.control_transfer(ep0, &setup, &mut lang_buf, split).ok()?;
        let lang_id = u16::from_le_bytes([lang_buf[2], lang_buf[3]]);
        let lang_id = if lang_id == 0 { usbstring::DEFAULT_LANG_ID } else { lang_id };

        let mut header = [0u8; 2];
        let setup = SetupPacket::get_string_descriptor(index, lang_id, 2);
        hcd.control_transfer(ep0, &setup, &mut header, split).ok()?;
        let len = header[0] as usize;
        if len < 2 {
            return None;
        }
        let mut full = alloc::vec![0u8; len];
        let setup = SetupPacket::get_string_descriptor(index, lang_id, len as u16);
        hcd.control_transfer(ep0, &setup, &mut full, split).ok()?;
        Some(usbstring::decode(&full[2..]))
    }

    /// This device's assigned address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// This device's own control endpoint, address- and max-packet-size-bound.
    pub fn ep0(&self) -> &Endpoint {
        &self.ep0
    }

    /// Vendor/product/class identity read from the device descriptor.
    pub fn device_desc(&self) -> &DeviceDesc {
        &self.device_desc
    }

    /// Resolved manufacturer/product name, used in the enumeration log line.
    pub fn names(&self) -> &str {
        &self.names
    }

    /// Function drivers bound to this device's interfaces.
    pub fn functions(&self) -> &[FunctionDriver<E>] {
        &self.functions
    }

    /// Mutable access to the bound function drivers, for per-tick polling.
    pub fn functions_mut(&mut self) -> &mut [FunctionDriver<E>] {
        &mut self.functions
    }

    /// The nested hub, if this device's configuration included a hub-class
    /// interface.
    pub fn hub(&self) -> Option<&Hub<E>> {
        self.hub.as_deref()
    }

    /// Mutable access to the nested hub.
    pub fn hub_mut(&mut self) -> Option<&mut Hub<E>> {
        self.hub.as_deref_mut()
    }

    /// Finds the first function driver in this device's own interfaces or,
    /// failing that, anywhere in a nested hub's subtree.
    pub fn find_function(&self, pred: &impl Fn(&FunctionDriver<E>) -> bool) -> Option<&FunctionDriver<E>> {
        if let Some(f) = self.functions.iter().find(|f| pred(f)) {
            return Some(f);
        }
        self.hub.as_deref().and_then(|h| h.find_function(pred))
    }

    /// Mutable counterpart of [`Device::find_function`].
    pub fn find_function_mut(&mut self, pred: &impl Fn(&FunctionDriver<E>) -> bool) -> Option<&mut FunctionDriver<E>> {
        if let Some(pos) = self.functions.iter().position(|f| pred(f)) {
            return self.functions.get_mut(pos);
        }
        self.hub.as_deref_mut().and_then(|h| h.find_function_mut(pred))
    }

    /// Services every bound function driver and, if present, recurses into
    /// the nested hub's own ports.
    pub fn poll(&mut self) {
        for f in &mut self.functions {
            f.poll();
        }
        if let Some(hub) = &mut self.hub {
            hub.poll();
        }
    }
}
