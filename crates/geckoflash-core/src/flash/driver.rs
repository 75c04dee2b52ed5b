//! Flash driver trait
//!
//! Uses `maybe_async` to support both sync and async modes.

use super::bank::FlashBank;
use crate::device::DeviceInfo;
use crate::error::Result;
use maybe_async::maybe_async;

/// Operations a flash bank driver offers to the surrounding tooling
///
/// Sector arguments are indices into the bank's sector table and ranges
/// are inclusive. Offsets are relative to the bank base.
///
/// # Example
///
/// ```ignore
/// use geckoflash_core::flash::FlashDriver;
///
/// fn lock_bootloader<D: FlashDriver>(driver: &mut D) -> Result<()> {
///     driver.auto_probe()?;
///     driver.protect(0, 7, true)?;
///     driver.protect_check()
/// }
/// ```
#[maybe_async(AFIT)]
pub trait FlashDriver {
    /// Identify the part and build the sector table
    ///
    /// Any previous probe result is discarded first, so a failed probe
    /// leaves the bank unprobed.
    async fn probe(&mut self) -> Result<()>;

    /// Probe unless the bank is already probed
    async fn auto_probe(&mut self) -> Result<()>;

    /// Erase sectors `first..=last`
    async fn erase(&mut self, first: u32, last: u32) -> Result<()>;

    /// Lock (`set == true`) sectors `first..=last`
    ///
    /// # Errors
    /// * `UnlockUnsupported` - If `set` is false
    async fn protect(&mut self, first: u32, last: u32, set: bool) -> Result<()>;

    /// Write `data` at `offset`
    ///
    /// # Errors
    /// * `InvalidAlignment` - If `offset` is not 4-byte aligned
    /// * `AddressOutOfBounds` - If the write extends beyond the bank
    async fn write(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Read `buf.len()` bytes at `offset`
    async fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Refresh the protection state of every sector from the device
    async fn protect_check(&mut self) -> Result<()>;

    /// Refresh the erase state of every sector by reading it back
    async fn erase_check(&mut self) -> Result<()>;

    /// Read the device descriptor again
    async fn info(&mut self) -> Result<DeviceInfo>;

    /// The probed bank, if any
    fn bank(&self) -> Option<&FlashBank>;
}
