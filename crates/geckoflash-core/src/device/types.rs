//! Device descriptor types

use core::fmt;

/// The only page size the supported families use
pub const SUPPORTED_PAGE_SIZE: u32 = 2048;

/// Cortex-M core variant, from the CPUID part number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreVariant {
    /// Cortex-M3
    CortexM3,
    /// Cortex-M4 (Wonder Gecko and the EFR32 Series 1)
    CortexM4,
    /// Cortex-M0+
    CortexM0Plus,
}

impl CoreVariant {
    /// Classify a raw CPUID register value
    pub const fn from_cpuid(cpuid: u32) -> Option<Self> {
        match Self::part_number(cpuid) {
            0xC23 => Some(Self::CortexM3),
            0xC24 => Some(Self::CortexM4),
            0xC60 => Some(Self::CortexM0Plus),
            _ => None,
        }
    }

    /// Extract the part number field (bits 15:4) of a CPUID value
    pub const fn part_number(cpuid: u32) -> u16 {
        ((cpuid >> 4) & 0xFFF) as u16
    }
}

impl fmt::Display for CoreVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CortexM3 => write!(f, "Cortex-M3"),
            Self::CortexM4 => write!(f, "Cortex-M4"),
            Self::CortexM0Plus => write!(f, "Cortex-M0+"),
        }
    }
}

/// EFR32 part family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartFamily {
    /// EFR32MG (family id 28)
    MightyGecko,
    /// EFR32BG (family id 20)
    BlueGecko,
    /// Any other family id
    Unsupported(u8),
}

impl PartFamily {
    /// Family id of Mighty Gecko parts in the DI page
    pub const MIGHTY_GECKO_ID: u8 = 28;
    /// Family id of Blue Gecko parts in the DI page
    pub const BLUE_GECKO_ID: u8 = 20;

    /// Classify a raw family id
    pub const fn from_id(id: u8) -> Self {
        match id {
            Self::MIGHTY_GECKO_ID => Self::MightyGecko,
            Self::BLUE_GECKO_ID => Self::BlueGecko,
            other => Self::Unsupported(other),
        }
    }

    /// Raw family id
    pub const fn id(&self) -> u8 {
        match self {
            Self::MightyGecko => Self::MIGHTY_GECKO_ID,
            Self::BlueGecko => Self::BLUE_GECKO_ID,
            Self::Unsupported(id) => *id,
        }
    }

    /// Whether the flash driver supports this family
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    /// Marketing name of the family
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MightyGecko => "Mighty Gecko",
            Self::BlueGecko => "Blue Gecko",
            Self::Unsupported(_) => "Unknown Gecko",
        }
    }
}

/// Decode the DI page-size byte: `1 << (value + 10)`
///
/// Returns `None` when the shift does not fit in a `u32`.
pub const fn decode_page_size(value: u8) -> Option<u32> {
    let shift = value as u32 + 10;
    if shift < 32 {
        Some(1 << shift)
    } else {
        None
    }
}

/// Identification and geometry of a probed part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// CPU core variant
    pub core: CoreVariant,
    /// Flash size in KiB
    pub flash_size_kib: u16,
    /// RAM size in KiB
    pub ram_size_kib: u16,
    /// Part number
    pub part_number: u16,
    /// Part family
    pub family: PartFamily,
    /// Product revision
    pub product_revision: u8,
    /// Flash page size in bytes
    pub page_size: u32,
}

impl DeviceInfo {
    /// Total flash size in bytes
    pub const fn flash_size(&self) -> u32 {
        self.flash_size_kib as u32 * 1024
    }

    /// Number of flash pages
    pub const fn page_count(&self) -> u32 {
        self.flash_size() / self.page_size
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EFR32 {} - Rev: {}",
            self.family.name(),
            self.product_revision
        )
    }
}
