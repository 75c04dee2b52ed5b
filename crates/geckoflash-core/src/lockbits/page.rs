//! In-memory mirror of the lock bits page

/// Number of words in the lock bits page
pub const LOCK_WORDS: usize = 128;
/// Size of the lock bits page image in bytes
pub const LOCK_PAGE_SIZE: usize = LOCK_WORDS * 4;

/// Master lock word index
pub const MLW_INDEX: usize = 125;
/// User data page lock word index
pub const ULW_INDEX: usize = 126;
/// Debug lock word index
pub const DLW_INDEX: usize = 127;

/// Highest number of pages the page lock words can describe
pub const MAX_LOCKABLE_PAGES: u32 = MLW_INDEX as u32 * 32;

/// Mirror of the lock bits page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockBitsPage {
    words: [u32; LOCK_WORDS],
}

impl Default for LockBitsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl LockBitsPage {
    /// Create an erased (all unlocked) mirror
    pub const fn new() -> Self {
        Self {
            words: [u32::MAX; LOCK_WORDS],
        }
    }

    /// Reset the mirror to the erased state
    pub fn clear(&mut self) {
        self.words = [u32::MAX; LOCK_WORDS];
    }

    /// Number of page lock words needed for `sector_count` pages
    pub const fn words_for(sector_count: u32) -> usize {
        sector_count.div_ceil(32) as usize
    }

    /// Check whether `sector` is locked
    pub const fn is_locked(&self, sector: u32) -> bool {
        let (index, mask) = Self::locate(sector);
        self.words[index] & mask == 0
    }

    /// Lock or unlock `sector` in the mirror
    pub fn set_locked(&mut self, sector: u32, locked: bool) {
        let (index, mask) = Self::locate(sector);
        if locked {
            self.words[index] &= !mask;
        } else {
            self.words[index] |= mask;
        }
    }

    /// Raw word at `index`
    pub const fn word(&self, index: usize) -> u32 {
        self.words[index]
    }

    /// Replace the raw word at `index`
    pub fn set_word(&mut self, index: usize, value: u32) {
        self.words[index] = value;
    }

    /// All words of the page
    pub const fn words(&self) -> &[u32; LOCK_WORDS] {
        &self.words
    }

    /// Check whether the debug lock word requests a locked debug port
    pub const fn is_debug_locked(&self) -> bool {
        self.words[DLW_INDEX] != u32::MAX
    }

    /// Clear the debug lock word
    pub fn set_debug_locked(&mut self) {
        self.words[DLW_INDEX] = 0;
    }

    /// Little-endian image of the whole page
    pub fn to_bytes(&self) -> [u8; LOCK_PAGE_SIZE] {
        let mut bytes = [0u8; LOCK_PAGE_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    const fn locate(sector: u32) -> (usize, u32) {
        ((sector / 32) as usize, 1 << (sector % 32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unlocked() {
        let page = LockBitsPage::new();
        assert!((0..MAX_LOCKABLE_PAGES).all(|s| !page.is_locked(s)));
        assert!(!page.is_debug_locked());
        assert!(page.to_bytes().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_inverted_polarity() {
        let mut page = LockBitsPage::new();
        page.set_locked(5, true);
        assert_eq!(page.word(0), !(1 << 5));
        assert!(page.is_locked(5));
        assert!(!page.is_locked(4));

        page.set_locked(33, true);
        assert_eq!(page.word(1), !(1 << 1));

        page.set_locked(5, false);
        assert_eq!(page.word(0), u32::MAX);
    }

    #[test]
    fn test_control_words_untouched_by_page_locks() {
        let mut page = LockBitsPage::new();
        page.set_word(MLW_INDEX, 0x1234_5678);
        for sector in 0..MAX_LOCKABLE_PAGES {
            page.set_locked(sector, true);
        }
        assert_eq!(page.word(MLW_INDEX), 0x1234_5678);
        assert_eq!(page.word(ULW_INDEX), u32::MAX);
        assert_eq!(page.word(DLW_INDEX), u32::MAX);
    }

    #[test]
    fn test_debug_lock_clears_only_dlw() {
        let mut page = LockBitsPage::new();
        page.set_debug_locked();
        assert!(page.is_debug_locked());
        assert_eq!(page.word(DLW_INDEX), 0);
        assert!(page.words()[..DLW_INDEX].iter().all(|&w| w == u32::MAX));
    }

    #[test]
    fn test_to_bytes_little_endian() {
        let mut page = LockBitsPage::new();
        page.set_word(0, 0x0403_0201);
        page.set_word(DLW_INDEX, 0);

        let bytes = page.to_bytes();
        assert_eq!(bytes.len(), 512);
        assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[508..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_words_for() {
        assert_eq!(LockBitsPage::words_for(1), 1);
        assert_eq!(LockBitsPage::words_for(32), 1);
        assert_eq!(LockBitsPage::words_for(33), 2);
        assert_eq!(LockBitsPage::words_for(128), 4);
    }
}
