//! Reading the lock bits page from the target

use super::page::{LockBitsPage, DLW_INDEX, MLW_INDEX, ULW_INDEX};
use crate::device::LOCK_BITS_BASE;
use crate::error::Result;
use crate::target::DebugTarget;
use maybe_async::maybe_async;

/// Refresh `page` from the device
///
/// Reads the page lock words covering `sector_count` pages, then ULW, DLW
/// and MLW. Other words of the mirror are left as they are.
#[maybe_async]
pub async fn read_lock_page<T: DebugTarget + ?Sized>(
    target: &mut T,
    page: &mut LockBitsPage,
    sector_count: u32,
) -> Result<()> {
    for index in 0..LockBitsPage::words_for(sector_count) {
        let word = read_word(target, index).await.inspect_err(|_| {
            log::error!("Failed to read PLW {}", index);
        })?;
        page.set_word(index, word);
    }

    for (index, name) in [(ULW_INDEX, "ULW"), (DLW_INDEX, "DLW"), (MLW_INDEX, "MLW")] {
        let word = read_word(target, index).await.inspect_err(|_| {
            log::error!("Failed to read {}", name);
        })?;
        page.set_word(index, word);
    }

    Ok(())
}

#[maybe_async]
async fn read_word<T: DebugTarget + ?Sized>(target: &mut T, index: usize) -> Result<u32> {
    target.read_u32(LOCK_BITS_BASE + index as u32 * 4).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::mock::MockTarget;

    #[test]
    fn test_read_lock_page() {
        let mut target = MockTarget::new();
        target.words.insert(LOCK_BITS_BASE, !(1 << 5));
        target.words.insert(LOCK_BITS_BASE + 4, 0);
        target.words.insert(LOCK_BITS_BASE + 8, 0);
        target.words.insert(LOCK_BITS_BASE + 4 * MLW_INDEX as u32, 0xAAAA_AAAA);
        target.words.insert(LOCK_BITS_BASE + 4 * ULW_INDEX as u32, 0xBBBB_BBBB);
        target.words.insert(LOCK_BITS_BASE + 4 * DLW_INDEX as u32, 0xCCCC_CCCC);

        let mut page = LockBitsPage::new();
        read_lock_page(&mut target, &mut page, 64).unwrap();

        assert!(page.is_locked(5));
        assert!(!page.is_locked(6));
        assert!(page.is_locked(32));
        // Word 2 covers pages 64.. and is not part of a 64 page bank
        assert_eq!(page.word(2), u32::MAX);
        assert_eq!(page.word(MLW_INDEX), 0xAAAA_AAAA);
        assert_eq!(page.word(ULW_INDEX), 0xBBBB_BBBB);
        assert_eq!(page.word(DLW_INDEX), 0xCCCC_CCCC);
        assert_eq!(target.accesses, 2 + 3);
    }

    #[test]
    fn test_read_partial_word() {
        let mut target = MockTarget::new();
        let mut page = LockBitsPage::new();
        read_lock_page(&mut target, &mut page, 33).unwrap();

        // Two page words plus three control words, all read as zero
        assert_eq!(target.accesses, 5);
        assert!(page.is_locked(32));
        assert_eq!(page.word(2), u32::MAX);
    }
}
