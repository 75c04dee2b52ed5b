//! Flash bank geometry

use crate::error::{Error, Result};
use alloc::vec::Vec;
use core::ops::Range;

/// What is known about a sector's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EraseState {
    /// Not checked since the last probe or a failed operation
    #[default]
    Unknown,
    /// Every byte reads 0xFF
    Erased,
    /// Programmed since the last erase
    NotErased,
}

/// One erasable page of the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    /// Offset from the bank base
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
    /// Erase state
    pub erased: EraseState,
    /// Page lock state
    pub protected: bool,
}

/// A probed flash bank
///
/// Sectors are contiguous, equally sized and cover `size` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashBank {
    /// Bus address of the first byte
    pub base: u32,
    /// Size in bytes
    pub size: u32,
    /// Sector table
    pub sectors: Vec<Sector>,
}

impl FlashBank {
    /// Build a bank of `page_count` pages of `page_size` bytes
    pub fn new(base: u32, page_size: u32, page_count: u32) -> Self {
        let sectors = (0..page_count)
            .map(|i| Sector {
                offset: i * page_size,
                size: page_size,
                erased: EraseState::Unknown,
                protected: false,
            })
            .collect();

        Self {
            base,
            size: page_size * page_count,
            sectors,
        }
    }

    /// Number of sectors
    pub fn sector_count(&self) -> u32 {
        self.sectors.len() as u32
    }

    /// Size of one sector in bytes
    pub fn page_size(&self) -> u32 {
        self.sectors.first().map_or(0, |s| s.size)
    }

    /// Check that `first..=last` names sectors of this bank
    pub fn check_sector_range(&self, first: u32, last: u32) -> Result<()> {
        if first > last || last >= self.sector_count() {
            log::error!(
                "sector range {}..={} outside bank of {} sectors",
                first,
                last,
                self.sector_count()
            );
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }

    /// Check if `len` bytes at `offset` lie inside the bank
    pub fn is_valid_range(&self, offset: u32, len: usize) -> bool {
        let end = offset as u64 + len as u64;
        end <= self.size as u64
    }

    /// Indices of the sectors overlapping `len` bytes at `offset`
    pub fn sectors_in(&self, offset: u32, len: usize) -> Range<usize> {
        let page_size = self.page_size();
        if page_size == 0 || len == 0 {
            return 0..0;
        }
        let end = (offset as u64 + len as u64).min(self.size as u64);
        let first = ((offset / page_size) as usize).min(self.sectors.len());
        let last = end.div_ceil(page_size as u64) as usize;
        first..last.max(first)
    }

    /// Set the erase state of every sector overlapping `len` bytes at `offset`
    pub fn mark_erase_state(&mut self, offset: u32, len: usize, state: EraseState) {
        let range = self.sectors_in(offset, len);
        for sector in &mut self.sectors[range] {
            sector.erased = state;
        }
    }
}
