//! EFR32 flash bank driver

use super::bank::{EraseState, FlashBank};
use super::driver::FlashDriver;
use super::write::{check_halted, write_flash};
use crate::device::{read_device_info, DeviceInfo, LOCK_BITS_BASE};
use crate::error::{Error, Result};
use crate::lockbits::{read_lock_page, LockBitsPage, MAX_LOCKABLE_PAGES};
use crate::msc;
use crate::target::DebugTarget;
use alloc::vec;
use maybe_async::maybe_async;

/// Bus address of the main flash array
pub const FLASH_BASE: u32 = 0x0000_0000;

/// Flash bank driver for EFR32 Mighty Gecko and Blue Gecko parts
///
/// The driver owns the debug target, the probed device descriptor and the
/// mirror of the lock bits page.
pub struct Efr32Flash<T: DebugTarget> {
    target: T,
    info: Option<DeviceInfo>,
    bank: Option<FlashBank>,
    lock_bits: LockBitsPage,
}

impl<T: DebugTarget> Efr32Flash<T> {
    /// Create an unprobed driver for `target`
    pub fn new(target: T) -> Self {
        Self {
            target,
            info: None,
            bank: None,
            lock_bits: LockBitsPage::new(),
        }
    }

    /// Get a reference to the debug target
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Get a mutable reference to the debug target
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Consume the driver and return the debug target
    pub fn into_target(self) -> T {
        self.target
    }

    /// Device descriptor from the last successful probe
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// Current lock bits mirror
    pub fn lock_bits(&self) -> &LockBitsPage {
        &self.lock_bits
    }

    /// Whether the bank has been probed
    pub fn is_probed(&self) -> bool {
        self.bank.is_some()
    }

    fn probed_bank(&self) -> Result<&FlashBank> {
        self.bank.as_ref().ok_or(Error::NotProbed)
    }

    /// Erase the lock bits page and write the mirror back
    ///
    /// Fails with `NotHalted` before the page is touched.
    #[maybe_async]
    pub async fn write_lock_page(&mut self) -> Result<()> {
        let page = self.lock_bits.clone();
        self.flush_lock_page(&page).await
    }

    #[maybe_async]
    async fn flush_lock_page(&mut self, page: &LockBitsPage) -> Result<()> {
        check_halted(&mut self.target).await?;

        msc::begin_write(&mut self.target).await?;
        let erased = msc::erase_page(&mut self.target, LOCK_BITS_BASE).await;
        let restore = msc::end_write(&mut self.target).await;
        if let Err(e) = erased.and(restore) {
            log::error!("Failed to erase LB page");
            return Err(e);
        }

        write_flash(&mut self.target, LOCK_BITS_BASE, &page.to_bytes()).await
    }

    /// Flush `page` and adopt it as the mirror once it is on the device
    #[maybe_async]
    async fn commit_lock_page(&mut self, page: LockBitsPage) -> Result<()> {
        if let Err(e) = self.flush_lock_page(&page).await {
            log::error!("Failed to write LB page");
            return Err(e);
        }
        self.lock_bits = page;
        self.apply_lock_bits();
        Ok(())
    }

    /// Lock the debug interface
    ///
    /// Clears the debug lock word and writes the lock bits page. The lock
    /// takes effect after the next reset.
    #[maybe_async]
    pub async fn debug_lock(&mut self) -> Result<()> {
        check_halted(&mut self.target).await?;
        self.probed_bank()?;

        let mut page = self.lock_bits.clone();
        page.set_debug_locked();
        self.commit_lock_page(page).await?;

        log::info!("debug interface locked, reset the device to apply");
        Ok(())
    }

    fn apply_lock_bits(&mut self) {
        if let Some(bank) = self.bank.as_mut() {
            for (i, sector) in bank.sectors.iter_mut().enumerate() {
                sector.protected = self.lock_bits.is_locked(i as u32);
            }
        }
    }
}

#[maybe_async(AFIT)]
impl<T: DebugTarget> FlashDriver for Efr32Flash<T> {
    async fn probe(&mut self) -> Result<()> {
        self.info = None;
        self.bank = None;
        self.lock_bits.clear();

        let info = read_device_info(&mut self.target).await?;
        log::info!("detected part: {}", info);
        log::info!("flash size = {}kbytes", info.flash_size_kib);
        log::info!("flash page size = {}bytes", info.page_size);

        let page_count = info.page_count();
        if page_count == 0 || page_count > MAX_LOCKABLE_PAGES {
            log::error!("unsupported flash size {} KiB", info.flash_size_kib);
            return Err(Error::InvalidGeometry {
                page_size: info.page_size,
            });
        }

        if let Err(e) = read_lock_page(&mut self.target, &mut self.lock_bits, page_count).await {
            log::error!("Failed to read LB data");
            self.lock_bits.clear();
            return Err(e);
        }

        self.info = Some(info);
        self.bank = Some(FlashBank::new(FLASH_BASE, info.page_size, page_count));
        self.apply_lock_bits();
        Ok(())
    }

    async fn auto_probe(&mut self) -> Result<()> {
        if self.is_probed() {
            return Ok(());
        }
        self.probe().await
    }

    async fn erase(&mut self, first: u32, last: u32) -> Result<()> {
        check_halted(&mut self.target).await?;

        let Self { target, bank, .. } = self;
        let bank = bank.as_mut().ok_or(Error::NotProbed)?;
        bank.check_sector_range(first, last)?;

        if let Err(e) = msc::begin_write(target).await {
            log::error!("Failed to enable MSC write");
            return Err(e);
        }

        let mut first_failure = None;
        for index in first..=last {
            let sector = &mut bank.sectors[index as usize];
            match msc::erase_page(target, bank.base + sector.offset).await {
                Ok(()) => sector.erased = EraseState::Erased,
                Err(e) => {
                    log::error!("Failed to erase page {}: {}", index, e);
                    sector.erased = EraseState::Unknown;
                    first_failure.get_or_insert(e);
                }
            }
        }

        let restore = msc::end_write(target).await;
        match first_failure {
            Some(e) => Err(e),
            None => restore,
        }
    }

    async fn protect(&mut self, first: u32, last: u32, set: bool) -> Result<()> {
        if !set {
            log::error!("Erase device data to reset page locks");
            return Err(Error::UnlockUnsupported);
        }

        check_halted(&mut self.target).await?;
        self.probed_bank()?.check_sector_range(first, last)?;

        let mut page = self.lock_bits.clone();
        for sector in first..=last {
            page.set_locked(sector, true);
        }
        self.commit_lock_page(page).await
    }

    async fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        let Self { target, bank, .. } = self;
        let bank = bank.as_mut().ok_or(Error::NotProbed)?;
        if !bank.is_valid_range(offset, data.len()) {
            return Err(Error::AddressOutOfBounds);
        }

        let result = write_flash(target, bank.base + offset, data).await;
        let state = match result {
            Ok(()) => EraseState::NotErased,
            Err(_) => EraseState::Unknown,
        };
        bank.mark_erase_state(offset, data.len(), state);
        result
    }

    async fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        let bank = self.probed_bank()?;
        if !bank.is_valid_range(offset, buf.len()) {
            return Err(Error::AddressOutOfBounds);
        }

        let address = bank.base + offset;
        self.target.read_memory(address, buf).await
    }

    async fn protect_check(&mut self) -> Result<()> {
        check_halted(&mut self.target).await?;
        let sector_count = self.probed_bank()?.sector_count();

        if let Err(e) = read_lock_page(&mut self.target, &mut self.lock_bits, sector_count).await {
            log::error!("Failed to read LB data");
            return Err(e);
        }

        self.apply_lock_bits();
        Ok(())
    }

    async fn erase_check(&mut self) -> Result<()> {
        let Self { target, bank, .. } = self;
        let bank = bank.as_mut().ok_or(Error::NotProbed)?;

        let mut buf = vec![0u8; bank.page_size() as usize];
        for sector in bank.sectors.iter_mut() {
            target.read_memory(bank.base + sector.offset, &mut buf).await?;
            sector.erased = if buf.iter().all(|&b| b == 0xFF) {
                EraseState::Erased
            } else {
                EraseState::NotErased
            };
        }
        Ok(())
    }

    async fn info(&mut self) -> Result<DeviceInfo> {
        read_device_info(&mut self.target).await.inspect_err(|_| {
            log::error!("Failed to read EFR32 info");
        })
    }

    fn bank(&self) -> Option<&FlashBank> {
        self.bank.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::mock::MockTarget;

    #[test]
    fn test_unprobed_operations() {
        let mut flash = Efr32Flash::new(MockTarget::new());

        assert!(!flash.is_probed());
        assert!(flash.bank().is_none());
        assert_eq!(flash.erase(0, 0), Err(Error::NotProbed));
        assert_eq!(flash.write(0, &[0; 4]), Err(Error::NotProbed));
        assert_eq!(flash.read(0, &mut [0; 4]), Err(Error::NotProbed));
        assert_eq!(flash.protect_check(), Err(Error::NotProbed));
        assert_eq!(flash.erase_check(), Err(Error::NotProbed));
        assert_eq!(flash.debug_lock(), Err(Error::NotProbed));
    }

    #[test]
    fn test_protect_clear_refused() {
        let mut flash = Efr32Flash::new(MockTarget::new());

        assert_eq!(flash.protect(0, 3, false), Err(Error::UnlockUnsupported));
        assert_eq!(flash.target().accesses, 0);
    }

    #[test]
    fn test_not_halted() {
        let mut target = MockTarget::new();
        target.halted = false;
        let mut flash = Efr32Flash::new(target);

        assert_eq!(flash.erase(0, 0), Err(Error::NotHalted));
        assert_eq!(flash.protect(0, 0, true), Err(Error::NotHalted));
        assert_eq!(flash.protect_check(), Err(Error::NotHalted));
        assert_eq!(flash.debug_lock(), Err(Error::NotHalted));
    }

    #[test]
    fn test_failed_probe_leaves_bank_unprobed() {
        // CPUID reads as zero
        let mut flash = Efr32Flash::new(MockTarget::new());

        assert_eq!(flash.probe(), Err(Error::UnsupportedCore { part: 0 }));
        assert!(!flash.is_probed());
        assert!(flash.device_info().is_none());
    }
}
