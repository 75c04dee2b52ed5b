//! Streaming block writes

use super::program::FLASH_WRITE_PROGRAM;
use super::ring::{RingBuffer, RING_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::msc::regs::{self, MscStatus};
use crate::target::{AlgorithmExit, DebugTarget, RegisterBindings, WorkingArea};
use maybe_async::maybe_async;

/// Ring buffer size tried first
pub const RING_PREFERRED_SIZE: u32 = 16 * 1024;
/// Smallest ring buffer size that is still tried
pub const RING_MIN_SIZE: u32 = 256;
/// The program consumes the ring one word at a time
pub const RING_BLOCK_SIZE: u32 = 4;

/// Ring sizes tried by [`write_block`], largest first
///
/// Each attempt halves the previous size, kept 4-byte aligned, down to
/// [`RING_MIN_SIZE`].
pub fn ring_sizes() -> impl Iterator<Item = u32> {
    core::iter::successors(Some(RING_PREFERRED_SIZE), |&size| Some((size / 2) & !3))
        .take_while(|&size| size >= RING_MIN_SIZE && size > RING_HEADER_SIZE)
}

/// Write `data` to flash at `address` using the uploaded write program
///
/// `data` must be a multiple of 4 bytes and write mode must already be
/// enabled. Both working areas are released before returning.
///
/// # Errors
/// * `ResourceUnavailable` - No room for the program or the ring buffer;
///   the caller should fall back to word writes
/// * `Protected` / `InvalidAddress` - The MSC rejected the address the
///   program had reached
/// * `AlgorithmFailed` - The program failed without a specific cause
#[maybe_async]
pub async fn write_block<T: DebugTarget + ?Sized>(
    target: &mut T,
    address: u32,
    data: &[u8],
) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }

    let code = match target
        .alloc_working_area(FLASH_WRITE_PROGRAM.len() as u32)
        .await
    {
        Ok(area) => area,
        Err(Error::ResourceUnavailable) => {
            log::warn!("no working area available, can't do block memory writes");
            return Err(Error::ResourceUnavailable);
        }
        Err(e) => return Err(e),
    };

    if let Err(e) = target.write_memory(code.address, &FLASH_WRITE_PROGRAM).await {
        release(target, code).await;
        return Err(e);
    }

    let ring = match alloc_ring(target).await {
        Ok(Some(area)) => area,
        Err(e) => {
            release(target, code).await;
            return Err(e);
        }
        Ok(None) => {
            release(target, code).await;
            log::warn!("no large enough working area available, can't do block memory writes");
            return Err(Error::ResourceUnavailable);
        }
    };
    log::debug!(
        "block write: program at 0x{:08X}, {} byte ring at 0x{:08X}",
        code.address,
        ring.size,
        ring.address
    );

    let result = run_program(target, &code, &ring, address, data).await;

    release(target, ring).await;
    release(target, code).await;
    result
}

#[maybe_async]
async fn alloc_ring<T: DebugTarget + ?Sized>(target: &mut T) -> Result<Option<WorkingArea>> {
    for size in ring_sizes() {
        match target.alloc_working_area(size).await {
            Ok(area) => return Ok(Some(area)),
            Err(Error::ResourceUnavailable) => {
                log::debug!("no {} byte working area for the ring buffer", size)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

#[maybe_async]
async fn release<T: DebugTarget + ?Sized>(target: &mut T, area: WorkingArea) {
    if let Err(e) = target.free_working_area(area).await {
        log::warn!(
            "failed to free working area at 0x{:08X}: {}",
            area.address,
            e
        );
    }
}

#[maybe_async]
async fn run_program<T: DebugTarget + ?Sized>(
    target: &mut T,
    code: &WorkingArea,
    ring: &WorkingArea,
    address: u32,
    data: &[u8],
) -> Result<()> {
    let buffer = RingBuffer::new(ring);
    target
        .write_u32(buffer.write_ptr_addr(), buffer.data_start())
        .await?;
    target
        .write_u32(buffer.read_ptr_addr(), buffer.data_start())
        .await?;

    let registers = RegisterBindings {
        r0: regs::MSC_BASE,
        r1: (data.len() / 4) as u32,
        r2: ring.address,
        r3: ring.end(),
        r4: address,
    };

    let result = target
        .run_async_algorithm(code, ring, data, RING_BLOCK_SIZE, registers)
        .await?;

    match result.exit {
        AlgorithmExit::Completed => Ok(()),
        AlgorithmExit::OperationFailed => Err(decode_failure(result.registers)),
    }
}

/// Map the registers of a failed run to an error
///
/// r0 holds the last MSC status and r4 the address being written.
pub fn decode_failure(registers: RegisterBindings) -> Error {
    let addr = registers.r4;
    let status = MscStatus::from_bits_retain(registers.r0);
    log::error!("flash write failed at address 0x{:08X}", addr);

    if status.contains(MscStatus::LOCKED) {
        log::error!("flash memory write protected");
    }
    if status.contains(MscStatus::INVADDR) {
        log::error!("invalid flash memory write address");
    }

    if status.contains(MscStatus::LOCKED) {
        Error::Protected { addr }
    } else if status.contains(MscStatus::INVADDR) {
        Error::InvalidAddress { addr }
    } else {
        Error::AlgorithmFailed {
            addr,
            status: status.bits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::mock::MockTarget;

    #[test]
    fn test_ring_sizes_halve_to_floor() {
        let sizes: Vec<u32> = ring_sizes().collect();
        assert_eq!(sizes, [16384, 8192, 4096, 2048, 1024, 512, 256]);
    }

    #[test]
    fn test_no_program_area() {
        let mut target = MockTarget::new();

        assert_eq!(
            write_block(&mut target, 0, &[0; 8]),
            Err(Error::ResourceUnavailable)
        );
        assert_eq!(target.alloc_requests, [FLASH_WRITE_PROGRAM.len() as u32]);
        assert!(target.writes.is_empty());
    }

    #[test]
    fn test_program_alloc_access_error_propagates() {
        let mut target = MockTarget::new();
        target
            .alloc_results
            .push_back(Err(Error::TargetAccess { addr: 0x2000_0000 }));

        assert_eq!(
            write_block(&mut target, 0, &[0; 8]),
            Err(Error::TargetAccess { addr: 0x2000_0000 })
        );
        assert!(target.writes.is_empty());
    }

    #[test]
    fn test_ring_alloc_access_error_releases_program() {
        let code = WorkingArea::new(0x2000_0000, 92);
        let mut target = MockTarget::new();
        target.alloc_results.extend([
            Ok(code),
            Err(Error::ResourceUnavailable),
            Err(Error::TargetAccess { addr: 0x2000_0060 }),
        ]);

        assert_eq!(
            write_block(&mut target, 0, &[0; 8]),
            Err(Error::TargetAccess { addr: 0x2000_0060 })
        );
        // Stops at the failing request instead of trying smaller rings
        assert_eq!(target.alloc_requests, [92, 16384, 8192]);
        assert_eq!(target.freed, [code]);
    }

    #[test]
    fn test_empty_data_is_noop() {
        let mut target = MockTarget::new();
        write_block(&mut target, 0, &[]).unwrap();
        assert_eq!(target.accesses, 0);
    }

    #[test]
    fn test_decode_failure() {
        let regs = |r0, r4| RegisterBindings {
            r0,
            r4,
            ..Default::default()
        };

        assert_eq!(
            decode_failure(regs(MscStatus::LOCKED.bits(), 0x800)),
            Error::Protected { addr: 0x800 }
        );
        assert_eq!(
            decode_failure(regs((MscStatus::LOCKED | MscStatus::INVADDR).bits(), 0x800)),
            Error::Protected { addr: 0x800 }
        );
        assert_eq!(
            decode_failure(regs(MscStatus::INVADDR.bits(), 0x0400_0000)),
            Error::InvalidAddress { addr: 0x0400_0000 }
        );
        assert_eq!(
            decode_failure(regs(0, 0x1000)),
            Error::AlgorithmFailed {
                addr: 0x1000,
                status: 0
            }
        );
    }
}
