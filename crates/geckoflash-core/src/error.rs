//! Error types for geckoflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Target errors
    /// Target CPU is not halted
    NotHalted,
    /// Debug transport failed to access target memory
    TargetAccess {
        /// Address of the failed access
        addr: u32,
    },
    /// No working area available on the target
    ResourceUnavailable,

    // Controller errors
    /// MSC status never reached the expected state
    Timeout {
        /// Last status register value observed
        status: u32,
    },
    /// MSC rejected the operation because the page is locked
    Protected {
        /// Address of the rejected page or word
        addr: u32,
    },
    /// MSC rejected the operation because the address is invalid
    InvalidAddress {
        /// Address that was rejected
        addr: u32,
    },
    /// Block write program reported a failure without a specific cause
    AlgorithmFailed {
        /// Flash address the program had reached
        addr: u32,
        /// MSC status returned by the program
        status: u32,
    },

    // Probe errors
    /// CPU core is not a supported Cortex-M variant
    UnsupportedCore {
        /// CPUID part number
        part: u16,
    },
    /// Part family is not supported
    UnknownFamily(u8),
    /// Decoded page size is not supported
    InvalidGeometry {
        /// Decoded page size in bytes
        page_size: u32,
    },
    /// Flash bank has not been probed
    NotProbed,

    // Address/range errors
    /// Offset or sector range is outside the flash bank
    AddressOutOfBounds,
    /// Operation requires a 4-byte aligned offset
    InvalidAlignment {
        /// Offending offset
        offset: u32,
    },

    // Protection errors
    /// Page locks can only be cleared by erasing the lock bits page
    UnlockUnsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotHalted => write!(f, "target not halted"),
            Self::TargetAccess { addr } => {
                write!(f, "target memory access failed at 0x{:08X}", addr)
            }
            Self::ResourceUnavailable => write!(f, "no working area available on target"),
            Self::Timeout { status } => {
                write!(f, "timed out waiting for MSC status (0x{:08X})", status)
            }
            Self::Protected { addr } => write!(f, "page at 0x{:08X} is locked", addr),
            Self::InvalidAddress { addr } => write!(f, "invalid flash address 0x{:08X}", addr),
            Self::AlgorithmFailed { addr, status } => write!(
                f,
                "flash write failed at 0x{:08X} (MSC status 0x{:08X})",
                addr, status
            ),
            Self::UnsupportedCore { part } => {
                write!(f, "target is not a Cortex-Mx device (part 0x{:03X})", part)
            }
            Self::UnknownFamily(id) => write!(f, "unknown MCU family {}", id),
            Self::InvalidGeometry { page_size } => write!(f, "invalid page size {}", page_size),
            Self::NotProbed => write!(f, "flash bank not probed"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment { offset } => write!(
                f,
                "offset 0x{:08X} breaks required 4-byte alignment",
                offset
            ),
            Self::UnlockUnsupported => write!(f, "erase device data to reset page locks"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
