//! Root and standard hub support (§4.2).
//!
//! The root port is driven directly through [`Hcd`]'s `root_port_*`
//! accessors, which exist specifically so this module can treat it as a
//! one-port hub without a real hub descriptor or class requests. A standard
//! (externally attached) hub is a device like any other, bound here instead
//! of through [`crate::factory`] so its downstream ports can recurse back
//! into [`crate::device::Device::enumerate`].

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::channel::SplitInfo;
use crate::configparser::InterfaceEntry;
use crate::desc::{self, hub_feature, HubDesc, SetupPacket};
use crate::device::{AddressAllocator, Device};
use crate::endpoint::Endpoint;
use crate::env::Env;
use crate::err::{Result, UsbError};
use crate::function::FunctionDriver;
use crate::hcd::Hcd;
use crate::names::NameRegistry;
use crate::reg::port_speed;

/// Delay after `SET_FEATURE(PORT_POWER)` before ports are assumed stable
/// enough to read connection state from, matching the original's
/// `HUB_STARTUP_TIME`-class constant.
pub const PORT_POWER_STABLE_MS: u32 = 100;

/// Bound on polls for `C_PORT_RESET` to appear in `wPortChange` before
/// giving up, mirroring [`crate::hcd::Hcd::root_port_reset`]'s bounded poll.
const MAX_PORT_RESET_POLLS: u32 = 10_000;

/// `wPortStatus`/`wPortChange` are bitmaps, not feature-selector numbers:
/// `hub_feature::PORT_RESET`/`C_PORT_RESET` (the values `SET_FEATURE`/
/// `CLEAR_FEATURE` requests carry) happen to equal the `wPortStatus` bit
/// positions for the non-change bits, but the `C_PORT_*` change bits live at
/// bits 0-4 of `wPortChange`, sixteen lower than their feature-selector
/// numbers.
mod port_change {
    pub const C_PORT_CONNECTION: u16 = 0;
    pub const C_PORT_RESET: u16 = 4;
}

/// One downstream port: either empty or owning exactly one enumerated child.
struct Port<E: Env> {
    device: Option<Device<E>>,
}

/// A hub's downstream ports, owned exclusively through this arena — a child
/// [`Device`] carries no back-pointer to its hub beyond what a caller already
/// has in hand (the hub address + port number used for split-transaction
/// addressing and logging).
pub struct Hub<E: Env> {
    hcd: Arc<Hcd<E>>,
    is_root: bool,
    hub_address: u8,
    ep0: Option<Endpoint>,
    high_speed: bool,
    ports: Vec<Port<E>>,
}

impl<E: Env> Hub<E> {
    /// Brings up the root port: powers it, waits for the stabilization
    /// interval, and if a device is already attached, enumerates it.
    pub fn root(hcd: Arc<Hcd<E>>, addresses: &mut AddressAllocator, registry: &mut NameRegistry) -> Result<Self> {
        hcd.env().ms_delay(PORT_POWER_STABLE_MS);

        let mut hub = Self { hcd: Arc::clone(&hcd), is_root: true, hub_address: 0, ep0: None, high_speed: true, ports: alloc::vec![Port { device: None }] };

        if hcd.root_port_connected() {
            hcd.root_port_clear_changes();
            hcd.root_port_reset()?;
            let speed = hcd.root_port_speed();
            let split = if speed != port_speed::HIGH { Some(SplitInfo { hub_address: 0, port: 1 }) } else { None };
            match Device::enumerate(Arc::clone(&hcd), split, addresses, registry) {
                Ok(device) => hub.ports[0].device = Some(device),
                Err(_) => {}
            }
        }

        Ok(hub)
    }

    /// Reads a standard hub's class descriptor over `entry`'s interface and
    /// powers every downstream port, enumerating whatever is already
    /// attached. `parent_address`/`parent_mps0` identify the hub device
    /// itself (already assigned by the time its configuration is parsed).
    pub fn from_interface(
        hcd: Arc<Hcd<E>>,
        parent_address: u8,
        parent_mps0: u16,
        entry: &InterfaceEntry,
        split: Option<SplitInfo>,
        addresses: &mut AddressAllocator,
        registry: &mut NameRegistry,
    ) -> Result<Self> {
        let mut ep0 = Endpoint::new_control(parent_address, parent_mps0);

        let mut header = [0u8; 7];
        let setup = SetupPacket::hub_get_descriptor(7);
        hcd.control_transfer(&mut ep0, &setup, &mut header, split)?;
        let hub_desc: HubDesc = unsafe { core::ptr::read_unaligned(header.as_ptr() as *const HubDesc) };
        let num_ports = hub_desc.num_ports;

        let high_speed = entry.desc.interface_protocol != desc::hub_protocol::FULL_SPEED;

        let mut hub = Self {
            hcd: Arc::clone(&hcd),
            is_root: false,
            hub_address: parent_address,
            ep0: Some(ep0),
            high_speed,
            ports: (0..num_ports).map(|_| Port { device: None }).collect(),
        };

        for port in 1..=num_ports {
            hub.power_port(port)?;
        }
        hcd.env().ms_delay(PORT_POWER_STABLE_MS);

        for port in 1..=num_ports {
            let _ = hub.try_enumerate_port(port, addresses, registry, split);
        }

        Ok(hub)
    }

    fn control(&mut self, setup: &SetupPacket, buf: &mut [u8], split: Option<SplitInfo>) -> Result<usize> {
        let ep0 = self.ep0.as_mut().ok_or(UsbError::InvPort)?;
        self.hcd.control_transfer(ep0, setup, buf, split)
    }

    fn power_port(&mut self, port: u8) -> Result<()> {
        let setup = SetupPacket::hub_set_port_feature(hub_feature::PORT_POWER, port);
        let mut empty = [0u8; 0];
        self.control(&setup, &mut empty, None).map(|_| ())
    }

    fn port_status(&mut self, port: u8) -> Result<(u16, u16)> {
        let setup = SetupPacket::hub_get_port_status(port);
        let mut buf = [0u8; 4];
        self.control(&setup, &mut buf, None)?;
        let status = u16::from_le_bytes([buf[0], buf[1]]);
        let change = u16::from_le_bytes([buf[2], buf[3]]);
        Ok((status, change))
    }

    fn try_enumerate_port(
        &mut self,
        port: u8,
        addresses: &mut AddressAllocator,
        registry: &mut NameRegistry,
        split: Option<SplitInfo>,
    ) -> Result<()> {
        let (status, change) = self.port_status(port)?;
        if change & (1 << port_change::C_PORT_CONNECTION) != 0 {
            let clear = SetupPacket::hub_clear_port_feature(hub_feature::C_PORT_CONNECTION, port);
            let mut empty = [0u8; 0];
            self.control(&clear, &mut empty, None)?;
        }
        if status & (1 << hub_feature::PORT_CONNECTION) == 0 {
            self.ports[(port - 1) as usize].device = None;
            return Ok(());
        }

        let reset = SetupPacket::hub_set_port_feature(hub_feature::PORT_RESET, port);
        let mut empty = [0u8; 0];
        self.control(&reset, &mut empty, None)?;

        let mut tries = 0u32;
        loop {
            let (_, change) = self.port_status(port)?;
            if change & (1 << port_change::C_PORT_RESET) != 0 {
                break;
            }
            if tries > MAX_PORT_RESET_POLLS {
                return Err(UsbError::Timeout);
            }
            tries += 1;
            self.hcd.env().us_delay(100);
        }
        let clear = SetupPacket::hub_clear_port_feature(hub_feature::C_PORT_RESET, port);
        self.control(&clear, &mut empty, None)?;

        let (status, _) = self.port_status(port)?;
        let device_is_low_speed = status & (1 << hub_feature::PORT_LOW_SPEED) != 0;
        let child_split = if self.high_speed && device_is_low_speed {
            Some(SplitInfo { hub_address: self.hub_address, port })
        } else {
            split
        };

        let device = Device::enumerate(Arc::clone(&self.hcd), child_split, addresses, registry)?;
        self.ports[(port - 1) as usize].device = Some(device);
        Ok(())
    }

    /// True for the synthetic root hub.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Number of downstream ports.
    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }

    /// The child device attached to `port` (1-based for a standard hub, 1 for
    /// the single root port), if any.
    pub fn port_device(&self, port: u8) -> Option<&Device<E>> {
        self.ports.get((port.saturating_sub(1)) as usize).and_then(|p| p.device.as_ref())
    }

    /// Every attached child device.
    pub fn children(&self) -> impl Iterator<Item = &Device<E>> {
        self.ports.iter().filter_map(|p| p.device.as_ref())
    }

    /// Mutable access to every attached child device, for per-tick polling.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Device<E>> {
        self.ports.iter_mut().filter_map(|p| p.device.as_mut())
    }

    /// Finds the first function driver in this hub's subtree matching `pred`,
    /// recursing into any nested hubs.
    pub fn find_function(&self, pred: &impl Fn(&FunctionDriver<E>) -> bool) -> Option<&FunctionDriver<E>> {
        self.children().find_map(|c| c.find_function(pred))
    }

    /// Mutable counterpart of [`Hub::find_function`].
    pub fn find_function_mut(&mut self, pred: &impl Fn(&FunctionDriver<E>) -> bool) -> Option<&mut FunctionDriver<E>> {
        for child in self.children_mut() {
            if let Some(f) = child.find_function_mut(pred) {
                return Some(f);
            }
        }
        None
    }

    /// Services every attached child device (which in turn services its own
    /// bound function drivers and any hub nested beneath it).
    pub fn poll(&mut self) {
        for child in self.children_mut() {
            child.poll();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_power_stable_delay_matches_startup_time_class_constant() {
        assert_eq!(PORT_POWER_STABLE_MS, 100);
    }
}
