//! Device name registry (§3 "Device name registry").
//!
//! Maps a bound function driver to a name like `umsd1` or `eth0`, handed out
//! by a monotonic per-kind counter. Every kind starts at 1 except Ethernet,
//! which starts at 0 — carried over from `smsc951x.c`'s `s_nDeviceNumber = 0`
//! so the single adapter in practice is still named `eth0`.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;

/// The kind of device a name was assigned to, used to pick the right prefix
/// and starting counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeviceKind {
    /// `ukbdN`, boot-protocol keyboard.
    Keyboard,
    /// `umouseN`, boot-protocol mouse.
    Mouse,
    /// `upadN`, HID gamepad.
    Gamepad,
    /// `umsdN`, mass storage (block device).
    MassStorage,
    /// `ethN`, SMSC95xx Ethernet.
    Ethernet,
    /// `umidiN`, USB-MIDI streaming interface.
    Midi,
}

impl DeviceKind {
    fn prefix(self) -> &'static str {
        match self {
            DeviceKind::Keyboard => "ukbd",
            DeviceKind::Mouse => "umouse",
            DeviceKind::Gamepad => "upad",
            DeviceKind::MassStorage => "umsd",
            DeviceKind::Ethernet => "eth",
            DeviceKind::Midi => "umidi",
        }
    }

    fn first_index(self) -> u32 {
        match self {
            DeviceKind::Ethernet => 0,
            _ => 1,
        }
    }
}

/// One registered device: its assigned name and whether it behaves as a
/// block device (mass storage only).
#[derive(Debug, Clone)]
pub struct NameEntry {
    /// The assigned name, e.g. `"umsd1"`.
    pub name: String,
    /// True for mass-storage devices.
    pub is_block_device: bool,
}

/// Assigns and looks up device names.
#[derive(Default)]
pub struct NameRegistry {
    next_index: BTreeMap<DeviceKind, u32>,
    entries: BTreeMap<String, NameEntry>,
}

impl NameRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { next_index: BTreeMap::new(), entries: BTreeMap::new() }
    }

    /// Assigns the next name of `kind` and registers it.
    pub fn register(&mut self, kind: DeviceKind) -> String {
        let counter = self.next_index.entry(kind).or_insert_with(|| kind.first_index());
        let index = *counter;
        *counter += 1;

        let name = format!("{}{}", kind.prefix(), index);
        self.entries.insert(
            name.clone(),
            NameEntry { name: name.clone(), is_block_device: kind == DeviceKind::MassStorage },
        );
        name
    }

    /// Looks up a registered device by exact name.
    pub fn get(&self, name: &str) -> Option<&NameEntry> {
        self.entries.get(name)
    }

    /// Extracts the numeric suffix a registered name ends in (`"upad2"` → `2`),
    /// used by push-style handler APIs that index callbacks by instance
    /// rather than by name.
    pub fn numeric_suffix(name: &str) -> u32 {
        name.trim_start_matches(|c: char| !c.is_ascii_digit()).parse().unwrap_or(0)
    }

    /// True if at least one device of `kind` has been registered.
    pub fn any_of_kind(&self, kind: DeviceKind) -> bool {
        let prefix = kind.prefix();
        self.entries.keys().any(|n| {
            n.strip_prefix(prefix).is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethernet_starts_at_zero_others_at_one() {
        let mut reg = NameRegistry::new();
        assert_eq!(reg.register(DeviceKind::Ethernet), "eth0");
        assert_eq!(reg.register(DeviceKind::Ethernet), "eth1");
        assert_eq!(reg.register(DeviceKind::MassStorage), "umsd1");
        assert_eq!(reg.register(DeviceKind::MassStorage), "umsd2");
    }

    #[test]
    fn any_of_kind_reflects_registrations() {
        let mut reg = NameRegistry::new();
        assert!(!reg.any_of_kind(DeviceKind::Keyboard));
        reg.register(DeviceKind::Keyboard);
        assert!(reg.any_of_kind(DeviceKind::Keyboard));
    }
}
