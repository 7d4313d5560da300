//! Bare-metal lightweight USB 2.0 host stack for OS development.
//!
//! This crate drives a Synopsys DesignWare OTG (DWC-OTG) host controller in
//! environments without the standard library, such as kernels, bootloaders,
//! or embedded systems. It owns channel allocation, enumerates whatever is
//! attached to the root port (including nested standard hubs), and binds
//! class drivers to configured interfaces.
//!
//! # Features
//!
//! - DWC-OTG channel-based transfer engine with split-transaction support
//! - USB device and hub enumeration
//! - HID keyboard, mouse, and gamepad support
//! - USB-MIDI streaming support
//! - Mass Storage Class (MSC) with SCSI commands
//! - SMSC95xx USB-Ethernet adapter support
//!
//! # Example
//!
//! ```ignore
//! let env = Arc::new(MyBoardEnv::new());
//! let mut host = UsbHost::initialize(env)?;
//! loop {
//!     host.poll();
//! }
//! ```
#![no_std]
#![deny(missing_docs)]

extern crate alloc;

mod channel;
mod configparser;
mod desc;
mod device;
mod endpoint;
mod env;
mod err;
#[cfg(feature = "ethernet")]
mod eth;
mod factory;
mod function;
#[cfg(feature = "hid-gamepad")]
mod gamepad;
mod hcd;
#[cfg(feature = "hid-boot")]
mod hid;
mod host;
mod hub;
#[cfg(feature = "midi")]
mod midi;
#[cfg(feature = "mass-storage")]
mod msc;
mod names;
mod reg;
mod timer;
mod urb;
mod usbstring;

// Re-export top-level driver/host types.
pub use crate::{
    device::{AddressAllocator, Device},
    env::{CriticalSection, Env, InterruptHandler, Severity, TimerHandle, TimerHandler},
    err::{Result, UsbError},
    function::FunctionDriver,
    host::UsbHost,
    hub::Hub,
    names::{DeviceKind, NameRegistry},
};

// Re-export mass-storage types and constants.
#[cfg(feature = "mass-storage")]
pub use crate::msc::{
    Cbw, Csw, InquiryData, MassStorageDevice, ReadCapacity10Data, RequestSenseData, is_mass_storage_interface,
    scsi_op, sense_key,
};

// Re-export Ethernet types and constants.
#[cfg(feature = "ethernet")]
pub use crate::eth::{EthernetDevice, MAX_FRAME_LEN};

// Re-export HID keyboard/mouse types and constants.
#[cfg(feature = "hid-boot")]
pub use crate::hid::{
    KeyPressedHandler, KeyReportHandler, KeyboardDevice, KeyboardReport, MouseDevice, MouseReport,
    MouseReportHandler, ShutdownHandler, led, modifier, scancode, scancode_to_ascii,
};

// Re-export gamepad types.
#[cfg(feature = "hid-gamepad")]
pub use crate::gamepad::{GamepadDevice, GamepadState, StatusHandler as GamepadStatusHandler};

// Re-export USB-MIDI types.
#[cfg(feature = "midi")]
pub use crate::midi::{MidiDevice, MidiEvent, PacketHandler as MidiPacketHandler};

// Re-export descriptor types and constants.
pub use crate::desc::{
    // Descriptor structures
    BosDesc,
    ConfigDesc,
    DeviceDesc,
    DeviceQualifierDesc,
    EndpointDesc,
    HidDesc,
    HubDesc,
    InterfaceAssocDesc,
    InterfaceDesc,
    SetupPacket,
    Usb20ExtCapDesc,
    // Constant modules
    capability,
    cdc_subclass,
    class,
    desc_type,
    ep_sync,
    ep_type,
    ep_usage,
    feature,
    hid_protocol,
    hid_subclass,
    hub_feature,
    hub_protocol,
    hub_subclass,
    lang_id,
    msc_protocol,
    msc_subclass,
    req_dir,
    req_recipient,
    req_type,
    request,
};

// Re-export register definitions (useful for advanced users).
/// DWC-OTG register offsets and constants.
pub mod regs {
    pub use crate::reg::*;
}
