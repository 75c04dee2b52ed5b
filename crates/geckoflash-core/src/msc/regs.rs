//! MSC register map

use bitflags::bitflags;

/// MSC register block base
pub const MSC_BASE: u32 = 0x400E_0000;
/// Write control register
pub const WRITECTRL: u32 = MSC_BASE + 0x008;
/// Write command register
pub const WRITECMD: u32 = MSC_BASE + 0x00C;
/// Page/word address buffer
pub const ADDRB: u32 = MSC_BASE + 0x010;
/// Write data register
pub const WDATA: u32 = MSC_BASE + 0x018;
/// Status register
pub const STATUS: u32 = MSC_BASE + 0x01C;
/// Configuration lock register
pub const LOCK: u32 = MSC_BASE + 0x040;

/// Value written to `LOCK` to unlock the MSC registers
pub const LOCK_KEY: u32 = 0x1B71;

bitflags! {
    /// `MSC_WRITECTRL` bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteCtrl: u32 {
        /// Enable erase and write
        const WREN = 1 << 0;
    }
}

bitflags! {
    /// `MSC_WRITECMD` bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteCmd: u32 {
        /// Load `ADDRB` into the internal address register
        const LADDRIM = 1 << 0;
        /// Erase the page at the latched address
        const ERASEPAGE = 1 << 1;
        /// Write `WDATA` to the latched address
        const WRITEONCE = 1 << 3;
    }
}

bitflags! {
    /// `MSC_STATUS` bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MscStatus: u32 {
        /// Erase or write in progress
        const BUSY = 1 << 0;
        /// Latched address is in a locked page
        const LOCKED = 1 << 1;
        /// Latched address is invalid
        const INVADDR = 1 << 2;
        /// `WDATA` can accept a word
        const WDATAREADY = 1 << 3;
        /// Word write timed out
        const WORDTIMEOUT = 1 << 4;
        /// Last page erase was aborted
        const ERASEABORTED = 1 << 5;

        // Bits owned by other controller features
        const _ = !0;
    }
}
