//! Debug target trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy or tokio based probes)
//! - With the `is_sync` feature, traits become synchronous

use crate::error::Result;
use maybe_async::maybe_async;

/// A region of target RAM leased for algorithm code or data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingArea {
    /// Start address in target memory
    pub address: u32,
    /// Size in bytes
    pub size: u32,
}

impl WorkingArea {
    /// Create a new working area descriptor
    pub const fn new(address: u32, size: u32) -> Self {
        Self { address, size }
    }

    /// Address one past the last byte of the area
    pub const fn end(&self) -> u32 {
        self.address + self.size
    }
}

/// Core registers handed to (and returned from) an uploaded algorithm
///
/// The meaning of each register is defined by the algorithm; see
/// [`crate::algorithm`] for the flash write program's contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterBindings {
    /// r0
    pub r0: u32,
    /// r1
    pub r1: u32,
    /// r2
    pub r2: u32,
    /// r3
    pub r3: u32,
    /// r4
    pub r4: u32,
}

/// How an uploaded algorithm finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmExit {
    /// All data was consumed
    Completed,
    /// The algorithm signalled a failure by zeroing the read pointer
    OperationFailed,
}

/// Outcome of [`DebugTarget::run_async_algorithm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmResult {
    /// How the algorithm finished
    pub exit: AlgorithmExit,
    /// Register values when the algorithm stopped
    pub registers: RegisterBindings,
}

/// Debug target trait (sync or async depending on `is_sync` feature)
///
/// This trait represents a halted Cortex-M target reached through a debug
/// transport (SWD or JTAG probe, or a simulator). All accesses are
/// little-endian.
///
/// ## Streaming algorithms
///
/// [`run_async_algorithm`](Self::run_async_algorithm) runs code previously
/// uploaded to `code` while the host streams `data` into the ring buffer
/// described by `ring`. The ring header (write pointer at offset 0, read
/// pointer at offset 4) has already been initialised by the caller. The
/// implementation must store each data block before publishing the new
/// write pointer, and must treat a read pointer of zero as the algorithm's
/// error signal.
#[maybe_async(AFIT)]
pub trait DebugTarget {
    /// Read a byte from target memory
    async fn read_u8(&mut self, addr: u32) -> Result<u8>;

    /// Read a half-word from target memory
    async fn read_u16(&mut self, addr: u32) -> Result<u16>;

    /// Read a word from target memory
    async fn read_u32(&mut self, addr: u32) -> Result<u32>;

    /// Write a word to target memory
    async fn write_u32(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Read a block of target memory
    async fn read_memory(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Write a block of target memory
    async fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Check whether the target CPU is halted
    async fn is_halted(&mut self) -> Result<bool>;

    /// Lease a working area of exactly `size` bytes
    ///
    /// Returns `Error::ResourceUnavailable` when no such area exists.
    async fn alloc_working_area(&mut self, size: u32) -> Result<WorkingArea>;

    /// Release a working area obtained from `alloc_working_area`
    async fn free_working_area(&mut self, area: WorkingArea) -> Result<()>;

    /// Run uploaded code while streaming `data` through a ring buffer
    ///
    /// # Arguments
    /// * `code` - Working area holding the uploaded program
    /// * `ring` - Working area holding the ring buffer
    /// * `data` - Data to stream, a multiple of `block_size` bytes
    /// * `block_size` - Granularity of ring pointer updates
    /// * `registers` - Register values at entry
    async fn run_async_algorithm(
        &mut self,
        code: &WorkingArea,
        ring: &WorkingArea,
        data: &[u8],
        block_size: u32,
        registers: RegisterBindings,
    ) -> Result<AlgorithmResult>;

    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);
}

// Blanket impl for boxed targets to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(all(feature = "alloc", feature = "is_sync"))]
impl DebugTarget for alloc::boxed::Box<dyn DebugTarget + Send> {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        (**self).read_u8(addr)
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        (**self).read_u16(addr)
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }

    fn read_memory(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read_memory(addr, buf)
    }

    fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        (**self).write_memory(addr, data)
    }

    fn is_halted(&mut self) -> Result<bool> {
        (**self).is_halted()
    }

    fn alloc_working_area(&mut self, size: u32) -> Result<WorkingArea> {
        (**self).alloc_working_area(size)
    }

    fn free_working_area(&mut self, area: WorkingArea) -> Result<()> {
        (**self).free_working_area(area)
    }

    fn run_async_algorithm(
        &mut self,
        code: &WorkingArea,
        ring: &WorkingArea,
        data: &[u8],
        block_size: u32,
        registers: RegisterBindings,
    ) -> Result<AlgorithmResult> {
        (**self).run_async_algorithm(code, ring, data, block_size, registers)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
