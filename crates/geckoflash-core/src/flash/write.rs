//! Write dispatcher
//!
//! Every flash write, including lock bits page writes, goes through
//! [`write_flash`]. It pads the data to whole words, enables MSC writes,
//! tries the block write program and falls back to word writes when the
//! target has no working area to spare.

use crate::algorithm;
use crate::error::{Error, Result};
use crate::msc;
use crate::target::DebugTarget;
use alloc::borrow::Cow;
use alloc::vec::Vec;
use maybe_async::maybe_async;

/// Value used to pad writes to a whole number of words
pub const PAD_BYTE: u8 = 0xFF;

/// Extend `data` to a multiple of 4 bytes with [`PAD_BYTE`]
///
/// Borrows `data` when it is already word sized.
pub fn pad_to_word(data: &[u8]) -> Cow<'_, [u8]> {
    if data.len() % 4 == 0 {
        return Cow::Borrowed(data);
    }

    let padded_len = data.len().div_ceil(4) * 4;
    log::info!(
        "odd number of bytes to write ({}), extending to {} and padding with 0x{:02X}",
        data.len(),
        padded_len,
        PAD_BYTE
    );

    let mut padded = Vec::with_capacity(padded_len);
    padded.extend_from_slice(data);
    padded.resize(padded_len, PAD_BYTE);
    Cow::Owned(padded)
}

/// Fail with `NotHalted` unless the target CPU is halted
#[maybe_async]
pub async fn check_halted<T: DebugTarget + ?Sized>(target: &mut T) -> Result<()> {
    if !target.is_halted().await? {
        log::error!("Target not halted");
        return Err(Error::NotHalted);
    }
    Ok(())
}

/// Write `data` to flash at bus address `address`
///
/// The address must be 4-byte aligned; it is checked before the target is
/// touched. The MSC is unlocked for the duration of the write and always
/// locked again afterwards. A failure to restore the MSC is reported only
/// if the write itself succeeded.
#[maybe_async]
pub async fn write_flash<T: DebugTarget + ?Sized>(
    target: &mut T,
    address: u32,
    data: &[u8],
) -> Result<()> {
    if address % 4 != 0 {
        log::error!("0x{:08X} breaks required 4-byte alignment", address);
        return Err(Error::InvalidAlignment { offset: address });
    }
    check_halted(target).await?;

    let data = pad_to_word(data);
    log::debug!("writing {} bytes at 0x{:08X}", data.len(), address);

    if let Err(e) = msc::begin_write(target).await {
        log::error!("Failed to enable MSC write");
        return Err(e);
    }

    let result = match algorithm::write_block(target, address, &data).await {
        Err(Error::ResourceUnavailable) => {
            log::warn!("couldn't use block writes, falling back to single memory accesses");
            write_words(target, address, &data).await
        }
        Err(e) => {
            log::error!("flash writing failed");
            Err(e)
        }
        Ok(()) => Ok(()),
    };

    let restore = msc::end_write(target).await;
    result.and(restore)
}

/// Program `data` one word at a time
#[maybe_async]
pub async fn write_words<T: DebugTarget + ?Sized>(
    target: &mut T,
    address: u32,
    data: &[u8],
) -> Result<()> {
    for (i, chunk) in data.chunks_exact(4).enumerate() {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let addr = address + (i as u32) * 4;
        msc::write_word(target, addr, word).await.inspect_err(|e| {
            log::error!("Failed to write word at 0x{:08X}: {}", addr, e);
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msc::regs::{self, MscStatus, WriteCmd};
    use crate::target::mock::MockTarget;

    #[test]
    fn test_pad_to_word() {
        let data = [1u8, 2, 3, 4, 5];
        let padded = pad_to_word(&data);
        assert_eq!(&*padded, &[1, 2, 3, 4, 5, 0xFF, 0xFF, 0xFF]);
        assert_eq!(data, [1, 2, 3, 4, 5]);

        for len in 0..12 {
            let data = vec![0u8; len];
            let padded = pad_to_word(&data);
            assert_eq!(padded.len(), len.div_ceil(4) * 4);
            assert!(padded[len..].iter().all(|&b| b == PAD_BYTE));
        }
    }

    #[test]
    fn test_pad_borrows_aligned_data() {
        let data = [0u8; 8];
        assert!(matches!(pad_to_word(&data), Cow::Borrowed(_)));
    }

    #[test]
    fn test_misaligned_write_touches_nothing() {
        let mut target = MockTarget::new();
        assert_eq!(
            write_flash(&mut target, 0x1002, &[0; 4]),
            Err(Error::InvalidAlignment { offset: 0x1002 })
        );
        assert_eq!(target.accesses, 0);
    }

    #[test]
    fn test_not_halted() {
        let mut target = MockTarget::new();
        target.halted = false;
        assert_eq!(write_flash(&mut target, 0, &[0; 4]), Err(Error::NotHalted));
        assert!(target.writes.is_empty());
    }

    #[test]
    fn test_fallback_to_word_writes() {
        let mut target = MockTarget::new();
        target.status = MscStatus::WDATAREADY.bits();

        write_flash(&mut target, 0x800, &[0x11, 0x22, 0x33, 0x44, 0x55]).unwrap();

        let words: Vec<u32> = target
            .writes
            .iter()
            .filter(|&&(reg, _)| reg == regs::WDATA)
            .map(|&(_, val)| val)
            .collect();
        assert_eq!(words, [0x4433_2211, 0xFFFF_FF55]);

        let latched: Vec<u32> = target
            .writes
            .iter()
            .filter(|&&(reg, _)| reg == regs::ADDRB)
            .map(|&(_, val)| val)
            .collect();
        assert_eq!(latched, [0x800, 0x804]);

        // MSC locked and writes disabled afterwards
        assert_eq!(target.word(regs::LOCK), 0);
        assert_eq!(target.word(regs::WRITECTRL), 0);
    }

    #[test]
    fn test_restores_msc_after_failure() {
        let mut target = MockTarget::new();
        target.status = MscStatus::LOCKED.bits();

        assert_eq!(
            write_flash(&mut target, 0x800, &[0; 8]),
            Err(Error::Protected { addr: 0x800 })
        );
        assert_eq!(target.word(regs::LOCK), 0);
        assert_eq!(target.word(regs::WRITECTRL), 0);
        assert!(!target
            .writes
            .iter()
            .any(|&(reg, val)| reg == regs::WRITECMD && val == WriteCmd::WRITEONCE.bits()));
    }
}
