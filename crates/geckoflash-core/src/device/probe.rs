//! Device information probing
//!
//! Uses `maybe_async` to support both sync and async modes.

use super::types::{decode_page_size, CoreVariant, DeviceInfo, PartFamily, SUPPORTED_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::target::DebugTarget;
use maybe_async::maybe_async;

/// Cortex-M CPUID register
pub const CPUID: u32 = 0xE000_ED00;

/// Base of the flash information block
pub const INFO_BASE: u32 = 0x0FE0_0000;
/// User data page
pub const USER_DATA_BASE: u32 = INFO_BASE;
/// Lock bits page
pub const LOCK_BITS_BASE: u32 = INFO_BASE + 0x4000;
/// Device information page
pub const DEV_INFO_BASE: u32 = INFO_BASE + 0x8000;

/// Encoded page size (u8)
pub const DI_PAGE_SIZE: u32 = DEV_INFO_BASE + 0x1E7;
/// Flash size in KiB (u16)
pub const DI_FLASH_SIZE: u32 = DEV_INFO_BASE + 0x1F8;
/// RAM size in KiB (u16)
pub const DI_RAM_SIZE: u32 = DEV_INFO_BASE + 0x1FA;
/// Part number (u16)
pub const DI_PART_NUMBER: u32 = DEV_INFO_BASE + 0x1FC;
/// Part family (u8)
pub const DI_PART_FAMILY: u32 = DEV_INFO_BASE + 0x1FE;
/// Product revision (u8)
pub const DI_PROD_REV: u32 = DEV_INFO_BASE + 0x1FF;

/// Read and validate the device descriptor
///
/// Reads CPUID to check the core, then the DI page. Only Mighty Gecko and
/// Blue Gecko parts with 2 KiB pages are accepted.
///
/// # Errors
/// * `UnsupportedCore` - CPUID is not a Cortex-M3/M4/M0+
/// * `UnknownFamily` - DI family id is not a supported family
/// * `InvalidGeometry` - DI page size is not 2048 bytes
#[maybe_async]
pub async fn read_device_info<T: DebugTarget + ?Sized>(target: &mut T) -> Result<DeviceInfo> {
    let cpuid = target.read_u32(CPUID).await?;
    let core = CoreVariant::from_cpuid(cpuid).ok_or_else(|| {
        log::error!("Target is not Cortex-Mx Device (CPUID 0x{:08X})", cpuid);
        Error::UnsupportedCore {
            part: CoreVariant::part_number(cpuid),
        }
    })?;
    log::debug!("CPUID 0x{:08X}: {}", cpuid, core);

    let flash_size_kib = target.read_u16(DI_FLASH_SIZE).await?;
    let ram_size_kib = target.read_u16(DI_RAM_SIZE).await?;
    let part_number = target.read_u16(DI_PART_NUMBER).await?;
    let family = PartFamily::from_id(target.read_u8(DI_PART_FAMILY).await?);
    let product_revision = target.read_u8(DI_PROD_REV).await?;

    if !family.is_supported() {
        log::error!("Unknown MCU family {}", family.id());
        return Err(Error::UnknownFamily(family.id()));
    }

    let encoded = target.read_u8(DI_PAGE_SIZE).await?;
    let page_size = match decode_page_size(encoded) {
        Some(SUPPORTED_PAGE_SIZE) => SUPPORTED_PAGE_SIZE,
        other => {
            let page_size = other.unwrap_or(0);
            log::error!("Invalid page size {} (encoded 0x{:02X})", page_size, encoded);
            return Err(Error::InvalidGeometry { page_size });
        }
    };

    Ok(DeviceInfo {
        core,
        flash_size_kib,
        ram_size_kib,
        part_number,
        family,
        product_revision,
        page_size,
    })
}
