//! DesignWare OTG (DWC-OTG) host-mode register offsets and bit definitions.
//!
//! Offsets are relative to the core's MMIO base, matching the Synopsys
//! DWC_OTG databook's host-mode register map.

// ============================================================================
// Core Global Registers (offset from MMIO base)
// ============================================================================

/// OTG Control and Status Register
pub const GOTGCTL: usize = 0x000;
/// AHB Configuration Register
pub const GAHBCFG: usize = 0x008;
/// USB Configuration Register
pub const GUSBCFG: usize = 0x00C;
/// Reset Register
pub const GRSTCTL: usize = 0x010;
/// Interrupt Status Register
pub const GINTSTS: usize = 0x014;
/// Interrupt Mask Register
pub const GINTMSK: usize = 0x018;
/// Receive FIFO Size Register
pub const GRXFSIZ: usize = 0x024;
/// Non-periodic Transmit FIFO Size Register
pub const GNPTXFSIZ: usize = 0x028;
/// User HW Config 2 Register
pub const GHWCFG2: usize = 0x048;
/// User HW Config 3 Register
pub const GHWCFG3: usize = 0x04C;
/// Host Periodic Transmit FIFO Size Register
pub const HPTXFSIZ: usize = 0x100;

// ============================================================================
// GAHBCFG Register Bits
// ============================================================================

/// Global Interrupt Mask
pub const GAHBCFG_GLBL_INTR_EN: u32 = 1 << 0;
/// DMA Enable
pub const GAHBCFG_DMA_EN: u32 = 1 << 5;

// ============================================================================
// GUSBCFG Register Bits
// ============================================================================

/// PHY interface selects ULPI
pub const GUSBCFG_ULPI_UTMI_SEL: u32 = 1 << 4;
/// Force Host Mode
pub const GUSBCFG_FORCE_HOST_MODE: u32 = 1 << 29;

// ============================================================================
// GRSTCTL Register Bits
// ============================================================================

/// Core Soft Reset
pub const GRSTCTL_CSFTRST: u32 = 1 << 0;
/// AHB Master Idle
pub const GRSTCTL_AHBIDLE: u32 = 1 << 31;

// ============================================================================
// GINTSTS / GINTMSK Bits
// ============================================================================

/// Host Port Interrupt (change on HPRT)
pub const GINTSTS_PORT_INTR: u32 = 1 << 24;
/// Host Channels Interrupt (one or more HAINT bits set)
pub const GINTSTS_HC_INTR: u32 = 1 << 25;
/// Current Mode of Operation (1 = host)
pub const GINTSTS_CUR_MODE_HOST: u32 = 1 << 0;

// ============================================================================
// Host Global Registers (offset from MMIO base)
// ============================================================================

/// Host Configuration Register
pub const HCFG: usize = 0x400;
/// Host Frame Interval Register
pub const HFIR: usize = 0x404;
/// Host Frame Number / Frame Time Remaining Register
pub const HFNUM: usize = 0x408;
/// Host All Channels Interrupt Register
pub const HAINT: usize = 0x414;
/// Host All Channels Interrupt Mask Register
pub const HAINTMSK: usize = 0x418;
/// Host Port Control and Status Register
pub const HPRT: usize = 0x440;

// ============================================================================
// HCFG Register Bits
// ============================================================================

/// FS/LS PHY Clock Select (bits 1:0)
pub const HCFG_FSLS_PCLK_SEL_MASK: u32 = 0x3;

// ============================================================================
// HPRT Register Bits
// ============================================================================

/// Port Connect Status
pub const HPRT_PRT_CONN_STS: u32 = 1 << 0;
/// Port Connect Detected
pub const HPRT_PRT_CONN_DET: u32 = 1 << 1;
/// Port Enable
pub const HPRT_PRT_ENA: u32 = 1 << 2;
/// Port Enable/Disable Change
pub const HPRT_PRT_ENCHNG: u32 = 1 << 3;
/// Port Overcurrent Change
pub const HPRT_PRT_OVRCURRCHNG: u32 = 1 << 5;
/// Port Reset
pub const HPRT_PRT_RST: u32 = 1 << 8;
/// Port Power
pub const HPRT_PRT_PWR: u32 = 1 << 12;
/// Port Speed (bits 18:17); 0=high, 1=full, 2=low
pub const HPRT_PRT_SPD_MASK: u32 = 0x3 << 17;
/// Write-one-to-clear bits that must not be re-asserted on a read-modify-write
pub const HPRT_WC_BITS: u32 =
    HPRT_PRT_CONN_DET | HPRT_PRT_ENA | HPRT_PRT_ENCHNG | HPRT_PRT_OVRCURRCHNG;

/// Port Speed values (from HPRT bits 18:17).
pub mod port_speed {
    /// High speed (480 Mbps)
    pub const HIGH: u8 = 0;
    /// Full speed (12 Mbps)
    pub const FULL: u8 = 1;
    /// Low speed (1.5 Mbps)
    pub const LOW: u8 = 2;
}

// ============================================================================
// Host Channel Registers (offset from HC base, one block of 0x20 per channel)
// ============================================================================

/// Host channel register block base offset
pub const HC_BASE: usize = 0x500;
/// Size of one channel's register block
pub const HC_REGS_SIZE: usize = 0x20;

/// Host Channel Characteristics Register (offset within a channel block)
pub const HCCHAR: usize = 0x00;
/// Host Channel Split Control Register
pub const HCSPLT: usize = 0x04;
/// Host Channel Interrupt Register
pub const HCINT: usize = 0x08;
/// Host Channel Interrupt Mask Register
pub const HCINTMSK: usize = 0x0C;
/// Host Channel Transfer Size Register
pub const HCTSIZ: usize = 0x10;
/// Host Channel DMA Address Register
pub const HCDMA: usize = 0x14;

// ============================================================================
// HCCHAR Register Bits
// ============================================================================

/// Maximum Packet Size (bits 10:0)
pub const HCCHAR_MPS_MASK: u32 = 0x7FF;
/// Endpoint Number (bits 14:11)
pub const HCCHAR_EPNUM_SHIFT: u32 = 11;
/// Endpoint Direction: 1 = IN
pub const HCCHAR_EPDIR_IN: u32 = 1 << 15;
/// Low-Speed Device
pub const HCCHAR_LSPDDEV: u32 = 1 << 17;
/// Endpoint Type (bits 19:18): 0=control 1=iso 2=bulk 3=interrupt
pub const HCCHAR_EPTYPE_SHIFT: u32 = 18;
/// Multi Count (bits 21:20)
pub const HCCHAR_MC_SHIFT: u32 = 20;
/// Device Address (bits 28:22)
pub const HCCHAR_DEVADDR_SHIFT: u32 = 22;
/// Channel Disable
pub const HCCHAR_CHDIS: u32 = 1 << 30;
/// Channel Enable
pub const HCCHAR_CHENA: u32 = 1 << 31;

/// Endpoint type values packed into [`HCCHAR_EPTYPE_SHIFT`].
pub mod ep_type {
    /// Control transfer
    pub const CONTROL: u32 = 0;
    /// Isochronous transfer (unused — out of scope)
    pub const ISOCHRONOUS: u32 = 1;
    /// Bulk transfer
    pub const BULK: u32 = 2;
    /// Interrupt transfer
    pub const INTERRUPT: u32 = 3;
}

// ============================================================================
// HCSPLT Register Bits
// ============================================================================

/// Port Address (bits 6:0) — the hub's downstream port number
pub const HCSPLT_PRTADDR_MASK: u32 = 0x7F;
/// Hub Address (bits 13:7)
pub const HCSPLT_HUBADDR_SHIFT: u32 = 7;
/// Transaction Position (bits 15:14) — always "all" (0b11) for this crate
pub const HCSPLT_XACTPOS_ALL: u32 = 0b11 << 14;
/// Do Complete Split
pub const HCSPLT_COMPSPLT: u32 = 1 << 16;
/// Split Enable
pub const HCSPLT_SPLTENA: u32 = 1 << 31;

// ============================================================================
// HCINT / HCINTMSK Register Bits
// ============================================================================

/// Transfer Completed
pub const HCINT_XFERCOMPL: u32 = 1 << 0;
/// Channel Halted
pub const HCINT_CHHLTD: u32 = 1 << 1;
/// STALL Response Received
pub const HCINT_STALL: u32 = 1 << 3;
/// NAK Response Received
pub const HCINT_NAK: u32 = 1 << 4;
/// ACK Response Received
pub const HCINT_ACK: u32 = 1 << 5;
/// Transaction Error (timeout, CRC, bit stuff, false EOP)
pub const HCINT_XACTERR: u32 = 1 << 7;
/// Babble Error
pub const HCINT_BBLERR: u32 = 1 << 8;
/// Frame Overrun
pub const HCINT_FRMOVRUN: u32 = 1 << 9;
/// Data Toggle Error
pub const HCINT_DATATGLERR: u32 = 1 << 10;

/// Mask covering every condition the channel state machine treats as
/// a terminal transfer error.
pub const HCINT_ERROR_MASK: u32 =
    HCINT_STALL | HCINT_XACTERR | HCINT_BBLERR | HCINT_FRMOVRUN | HCINT_DATATGLERR;

// ============================================================================
// HCTSIZ Register Bits
// ============================================================================

/// Transfer Size in bytes (bits 18:0)
pub const HCTSIZ_XFERSIZE_MASK: u32 = 0x7FFFF;
/// Packet Count (bits 28:19)
pub const HCTSIZ_PKTCNT_SHIFT: u32 = 19;
/// PID (bits 30:29): 0=DATA0 1=DATA2 2=DATA1 3=MDATA/SETUP
pub const HCTSIZ_PID_SHIFT: u32 = 29;

/// PID values packed into [`HCTSIZ_PID_SHIFT`], matching the DWC_OTG encoding
/// (note DATA1/DATA2 are swapped relative to the USB PID token values).
pub mod pid {
    /// DATA0
    pub const DATA0: u32 = 0;
    /// DATA1
    pub const DATA1: u32 = 2;
    /// SETUP (control transfers only)
    pub const SETUP: u32 = 3;
}

// ============================================================================
// Helper functions
// ============================================================================

/// Byte offset of channel `n`'s register block from the MMIO base.
pub const fn channel_base(n: u8) -> usize {
    HC_BASE + (n as usize) * HC_REGS_SIZE
}

/// Extracts the port speed from an HPRT register value.
pub const fn hprt_speed(hprt: u32) -> u8 {
    ((hprt >> 17) & 0x3) as u8
}

/// True if any write-one-to-clear HPRT bit is set (callers must preserve
/// `PRT_PWR`/`PRT_RST` and must not blindly write back a HPRT read).
pub const fn hprt_has_change(hprt: u32) -> bool {
    hprt & HPRT_WC_BITS != 0
}
