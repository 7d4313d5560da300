//! USB error types.

use core::result::Result as CoreResult;

/// USB driver error types, grouped the way the design groups them: transport,
/// protocol, policy, resource, halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbError {
    /// A blocking wait (channel busy, PHY/MII poll, port reset) exceeded its bound.
    Timeout,
    /// Out of memory
    OoRam,
    /// Failed to map MMIO region
    MapFail,
    /// No free channel in the pool for a blocking request
    NoChannel,
    /// Invalid port number
    InvPort,
    /// Invalid endpoint
    InvEndpoint,
    /// Command failed with completion code
    CmdFail(u8),
    /// Transfer failed with completion code (XactErr, babble, data-toggle error)
    XferFail(u8),
    /// Device not found
    DeviceNotFound,
    /// The device/interface class is not one this crate implements
    NotSupported,
    /// Invalid descriptor
    InvalidDescriptor,
    /// Endpoint stalled
    Stall,
    /// Too many devices have been assigned an address (> 127)
    TooManyDevices,
    /// Argument violates an alignment/range contract (e.g. unaligned LBA)
    InvalidArgument,
    /// BOT command-status-wrapper validation failed (signature, tag, status, residue)
    ProtocolError,
}

/// Result type for USB operations.
pub type Result<T> = CoreResult<T, UsbError>;
