//! Simulated EFR32 target

use crate::config::DummyConfig;
use crate::msc::{FlashCommand, Latch, MscModel};
use crate::workarea::WorkAreaAllocator;
use geckoflash_core::device::{
    CPUID, DEV_INFO_BASE, DI_FLASH_SIZE, DI_PAGE_SIZE, DI_PART_FAMILY, DI_PART_NUMBER,
    DI_PROD_REV, DI_RAM_SIZE, LOCK_BITS_BASE, USER_DATA_BASE,
};
use geckoflash_core::msc::regs;
use geckoflash_core::target::{AlgorithmResult, DebugTarget, RegisterBindings, WorkingArea};
use geckoflash_core::{Error, Result};

/// Start of SRAM
pub const RAM_BASE: u32 = 0x2000_0000;
/// Size of the simulated device information page
pub const DEV_INFO_SIZE: u32 = 0x200;

/// Memory regions of the simulated part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Flash,
    UserData,
    LockBits,
    DevInfo,
    Ram,
}

/// Counters for checking how the target was driven
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DummyStats {
    /// Register and memory accesses made through [`DebugTarget`]
    pub accesses: usize,
    /// Register writes to the MSC
    pub msc_writes: usize,
    /// Simulated time spent in `delay_us`
    pub elapsed_us: u64,
    /// Calls to `is_halted`
    pub halted_checks: usize,
    /// Runs of the block write program
    pub algorithm_runs: usize,
    /// Highest ring fill level seen by the host, in bytes
    pub ring_high_water: u32,
}

/// Simulated EFR32 part behind a debug port
///
/// Models the CPUID register, the DI page, the main flash array, the user
/// data and lock bits pages, SRAM and the MSC. Flash can only be changed
/// through MSC commands; programming clears bits like real NOR flash.
pub struct DummyTarget {
    config: DummyConfig,
    flash: Vec<u8>,
    user_data: Vec<u8>,
    lock_bits: Vec<u8>,
    dev_info: Vec<u8>,
    ram: Vec<u8>,
    pub(crate) msc: MscModel,
    workarea: WorkAreaAllocator,
    halted: bool,
    pub(crate) stats: DummyStats,
}

impl DummyTarget {
    /// Create a target with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let page_size = config.page_size().max(4) as usize;
        let ram_size = config.ram_size();
        let work_area_size = config.work_area_size.min(ram_size);

        let mut target = Self {
            flash: vec![0xFF; config.flash_size() as usize],
            user_data: vec![0xFF; page_size],
            lock_bits: vec![0xFF; page_size],
            dev_info: vec![0xFF; DEV_INFO_SIZE as usize],
            ram: vec![0; ram_size as usize],
            msc: MscModel::new(),
            workarea: WorkAreaAllocator::new(WorkingArea::new(RAM_BASE, work_area_size)),
            halted: config.halted,
            stats: DummyStats::default(),
            config,
        };
        target.fill_dev_info();
        target
    }

    /// Create a target with the default configuration (EFR32MG1P232)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    fn fill_dev_info(&mut self) {
        let config = self.config.clone();
        let mut put = |addr: u32, bytes: &[u8]| {
            let offset = (addr - DEV_INFO_BASE) as usize;
            self.dev_info[offset..offset + bytes.len()].copy_from_slice(bytes);
        };
        put(DI_PAGE_SIZE, &[config.page_size_code]);
        put(DI_FLASH_SIZE, &config.flash_kib.to_le_bytes());
        put(DI_RAM_SIZE, &config.ram_kib.to_le_bytes());
        put(DI_PART_NUMBER, &config.part_number.to_le_bytes());
        put(DI_PART_FAMILY, &[config.family]);
        put(DI_PROD_REV, &[config.revision]);
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Main flash contents
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Lock bits page contents
    pub fn lock_bits_page(&self) -> &[u8] {
        &self.lock_bits
    }

    /// Word `index` of the lock bits page
    pub fn lock_word(&self, index: usize) -> u32 {
        let offset = index * 4;
        u32::from_le_bytes([
            self.lock_bits[offset],
            self.lock_bits[offset + 1],
            self.lock_bits[offset + 2],
            self.lock_bits[offset + 3],
        ])
    }

    /// Overwrite word `index` of the lock bits page, bypassing the MSC
    pub fn set_lock_word(&mut self, index: usize, value: u32) {
        let offset = index * 4;
        self.lock_bits[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Lock flash page `page` directly in the lock bits page
    pub fn lock_page(&mut self, page: u32) {
        let index = (page / 32) as usize;
        let word = self.lock_word(index) & !(1 << (page % 32));
        self.set_lock_word(index, word);
    }

    /// Halt or resume the CPU
    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    /// MSC register model
    pub fn msc(&self) -> &MscModel {
        &self.msc
    }

    /// Mutable MSC register model, for injecting faults
    pub fn msc_mut(&mut self) -> &mut MscModel {
        &mut self.msc
    }

    /// Working area allocator
    pub fn workarea(&self) -> &WorkAreaAllocator {
        &self.workarea
    }

    /// Mutable working area allocator
    pub fn workarea_mut(&mut self) -> &mut WorkAreaAllocator {
        &mut self.workarea
    }

    /// Access counters
    pub fn stats(&self) -> &DummyStats {
        &self.stats
    }

    /// Reset the access counters
    pub fn reset_stats(&mut self) {
        self.stats = DummyStats::default();
    }

    fn region(&self, addr: u32, len: usize) -> Option<(Region, usize)> {
        let regions = [
            (Region::Flash, geckoflash_core::flash::FLASH_BASE, self.flash.len()),
            (Region::UserData, USER_DATA_BASE, self.user_data.len()),
            (Region::LockBits, LOCK_BITS_BASE, self.lock_bits.len()),
            (Region::DevInfo, DEV_INFO_BASE, self.dev_info.len()),
            (Region::Ram, RAM_BASE, self.ram.len()),
        ];

        regions.into_iter().find_map(|(region, base, size)| {
            let offset = addr.checked_sub(base)? as usize;
            (offset + len <= size).then_some((region, offset))
        })
    }

    fn memory(&self, region: Region) -> &[u8] {
        match region {
            Region::Flash => &self.flash,
            Region::UserData => &self.user_data,
            Region::LockBits => &self.lock_bits,
            Region::DevInfo => &self.dev_info,
            Region::Ram => &self.ram,
        }
    }

    fn memory_mut(&mut self, region: Region) -> &mut [u8] {
        match region {
            Region::Flash => &mut self.flash,
            Region::UserData => &mut self.user_data,
            Region::LockBits => &mut self.lock_bits,
            Region::DevInfo => &mut self.dev_info,
            Region::Ram => &mut self.ram,
        }
    }

    pub(crate) fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let (region, offset) = self.region(addr, buf.len()).ok_or_else(|| {
            log::debug!("read of {} bytes at unmapped 0x{:08X}", buf.len(), addr);
            Error::TargetAccess { addr }
        })?;
        buf.copy_from_slice(&self.memory(region)[offset..offset + buf.len()]);
        Ok(())
    }

    pub(crate) fn write_ram(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        match self.region(addr, data.len()) {
            Some((Region::Ram, offset)) => {
                self.ram[offset..offset + data.len()].copy_from_slice(data);
                Ok(())
            }
            _ => {
                log::debug!("write of {} bytes at 0x{:08X} rejected", data.len(), addr);
                Err(Error::TargetAccess { addr })
            }
        }
    }

    pub(crate) fn ram_u32(&self, addr: u32) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub(crate) fn set_ram_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.write_ram(addr, &value.to_le_bytes())
    }

    /// Decide whether the MSC may erase or write at `addr`
    fn classify(&self, addr: u32) -> Latch {
        match self.region(addr, 1) {
            Some((Region::Flash, offset)) => {
                let page = offset as u32 / self.page_size();
                let index = (page / 32) as usize;
                let locked = self.lock_bits.len() >= (index + 1) * 4
                    && self.lock_word(index) & (1 << (page % 32)) == 0;
                if locked {
                    Latch::Locked
                } else {
                    Latch::Writable
                }
            }
            Some((Region::UserData | Region::LockBits, _)) => Latch::Writable,
            _ => Latch::Invalid,
        }
    }

    fn page_size(&self) -> u32 {
        self.user_data.len() as u32
    }

    /// Register write to the MSC, executing any resulting flash command
    pub(crate) fn msc_write(&mut self, reg: u32, value: u32) {
        self.stats.msc_writes += 1;
        let latch = self.classify(self.msc.addrb());
        match self.msc.write(reg, value, |_| latch) {
            Some(FlashCommand::ErasePage(addr)) => self.erase_page(addr),
            Some(FlashCommand::WriteWord(addr, word)) => self.program_word(addr, word),
            None => {}
        }
    }

    fn erase_page(&mut self, addr: u32) {
        let page_size = self.page_size() as usize;
        if let Some((region, offset)) = self.region(addr, 1) {
            let start = offset - offset % page_size;
            log::trace!("erasing {:?} page at offset 0x{:X}", region, start);
            let memory = self.memory_mut(region);
            let end = (start + page_size).min(memory.len());
            memory[start..end].fill(0xFF);
        }
    }

    fn program_word(&mut self, addr: u32, word: u32) {
        if let Some((region, offset)) = self.region(addr & !3, 4) {
            let memory = self.memory_mut(region);
            for (byte, value) in memory[offset..offset + 4].iter_mut().zip(word.to_le_bytes()) {
                *byte &= value;
            }
        }
    }

    pub(crate) fn is_msc_reg(addr: u32) -> bool {
        (regs::MSC_BASE..regs::MSC_BASE + 0x100).contains(&addr)
    }
}

impl DebugTarget for DummyTarget {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        self.stats.accesses += 1;
        let mut buf = [0u8; 1];
        self.read_bytes(addr, &mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        self.stats.accesses += 1;
        let mut buf = [0u8; 2];
        self.read_bytes(addr, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        self.stats.accesses += 1;
        if addr == CPUID {
            return Ok(self.config.cpuid);
        }
        if Self::is_msc_reg(addr) {
            return Ok(self.msc.read(addr));
        }
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.stats.accesses += 1;
        if Self::is_msc_reg(addr) {
            self.msc_write(addr, value);
            return Ok(());
        }
        self.write_ram(addr, &value.to_le_bytes())
    }

    fn read_memory(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.stats.accesses += 1;
        self.read_bytes(addr, buf)
    }

    fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.stats.accesses += 1;
        self.write_ram(addr, data)
    }

    fn is_halted(&mut self) -> Result<bool> {
        self.stats.accesses += 1;
        self.stats.halted_checks += 1;
        Ok(self.halted)
    }

    fn alloc_working_area(&mut self, size: u32) -> Result<WorkingArea> {
        self.stats.accesses += 1;
        self.workarea.alloc(size)
    }

    fn free_working_area(&mut self, area: WorkingArea) -> Result<()> {
        self.stats.accesses += 1;
        self.workarea.free(area)
    }

    fn run_async_algorithm(
        &mut self,
        code: &WorkingArea,
        ring: &WorkingArea,
        data: &[u8],
        block_size: u32,
        registers: RegisterBindings,
    ) -> Result<AlgorithmResult> {
        self.stats.accesses += 1;
        if !self.halted {
            return Err(Error::NotHalted);
        }
        crate::program::run(self, code, ring, data, block_size, registers)
    }

    fn delay_us(&mut self, us: u32) {
        self.stats.elapsed_us += us as u64;
    }
}
