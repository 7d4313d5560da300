//! The function driver interface (§9 "Polymorphism without a vtable").
//!
//! Every class driver this crate implements — mass storage, Ethernet, HID
//! gamepad, boot keyboard, boot mouse, MIDI — binds to one interface of an
//! enumerated device and is driven afterwards by the same two calls: a
//! per-tick `poll` for anything that needs periodic interrupt-endpoint
//! polling, and `name` for the identity handed out by [`crate::names`].
//! Modeled as a closed `enum` rather than a boxed trait object, since the set
//! of class drivers is fixed at compile time and `no_std` code would
//! otherwise need an allocator-backed vtable for one degree of freedom that
//! features already express.

use alloc::string::String;

use crate::env::Env;
#[cfg(feature = "ethernet")]
use crate::eth::EthernetDevice;
#[cfg(feature = "hid-gamepad")]
use crate::gamepad::GamepadDevice;
#[cfg(feature = "hid-boot")]
use crate::hid::{KeyboardDevice, MouseDevice};
#[cfg(feature = "midi")]
use crate::midi::MidiDevice;
#[cfg(feature = "mass-storage")]
use crate::msc::MassStorageDevice;

/// A bound class driver instance, owned by the [`crate::device::Device`]
/// whose interface it claimed.
pub enum FunctionDriver<E: Env> {
    /// Boot-protocol keyboard (§4.8).
    #[cfg(feature = "hid-boot")]
    Keyboard(KeyboardDevice<E>),
    /// Boot-protocol mouse (§4.8).
    #[cfg(feature = "hid-boot")]
    Mouse(MouseDevice<E>),
    /// HID gamepad (§4.7).
    #[cfg(feature = "hid-gamepad")]
    Gamepad(GamepadDevice<E>),
    /// USB-MIDI device (§4.9).
    #[cfg(feature = "midi")]
    Midi(MidiDevice<E>),
    /// Bulk-only mass storage (§4.5).
    #[cfg(feature = "mass-storage")]
    MassStorage(MassStorageDevice<E>),
    /// SMSC95xx USB-Ethernet adapter (§4.6).
    #[cfg(feature = "ethernet")]
    Ethernet(EthernetDevice<E>),
}

impl<E: Env> FunctionDriver<E> {
    /// The name this driver was registered under (`"ukbd1"`, `"eth0"`, ...).
    pub fn name(&self) -> &str {
        match self {
            #[cfg(feature = "hid-boot")]
            FunctionDriver::Keyboard(d) => d.name(),
            #[cfg(feature = "hid-boot")]
            FunctionDriver::Mouse(d) => d.name(),
            #[cfg(feature = "hid-gamepad")]
            FunctionDriver::Gamepad(d) => d.name(),
            #[cfg(feature = "midi")]
            FunctionDriver::Midi(d) => d.name(),
            #[cfg(feature = "mass-storage")]
            FunctionDriver::MassStorage(d) => d.name(),
            #[cfg(feature = "ethernet")]
            FunctionDriver::Ethernet(d) => d.name(),
        }
    }

    /// Services anything this driver needs done on a regular tick: reaping
    /// a completed async URB, re-arming the next poll, draining a receive
    /// queue. Interrupt-endpoint-driven drivers rely on
    /// [`crate::hcd::Hcd::on_timer_tick`] for the actual repoll; this is for
    /// bookkeeping above that layer (e.g. keyboard repeat, link-state checks).
    pub fn poll(&mut self) {
        match self {
            #[cfg(feature = "hid-boot")]
            FunctionDriver::Keyboard(d) => d.poll(),
            #[cfg(feature = "hid-boot")]
            FunctionDriver::Mouse(d) => d.poll(),
            #[cfg(feature = "hid-gamepad")]
            FunctionDriver::Gamepad(d) => d.poll(),
            #[cfg(feature = "midi")]
            FunctionDriver::Midi(d) => d.poll(),
            #[cfg(feature = "mass-storage")]
            FunctionDriver::MassStorage(_) => {}
            #[cfg(feature = "ethernet")]
            FunctionDriver::Ethernet(d) => d.poll(),
        }
    }
}

/// Deferred string formatting helper shared by `name()` implementations that
/// just return an owned `String` field.
pub(crate) fn as_str(s: &String) -> &str {
    s.as_str()
}
