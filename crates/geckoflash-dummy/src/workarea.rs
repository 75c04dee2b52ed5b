//! Working area allocator

use geckoflash_core::target::WorkingArea;
use geckoflash_core::{Error, Result};

/// First-fit allocator over a fixed region of target RAM
///
/// Areas start on 4-byte boundaries. Every request is recorded so tests
/// can check the sizes a caller tried.
#[derive(Debug, Clone)]
pub struct WorkAreaAllocator {
    region: WorkingArea,
    live: Vec<WorkingArea>,
    requests: Vec<u32>,
}

impl WorkAreaAllocator {
    /// Create an allocator handing out parts of `region`
    pub fn new(region: WorkingArea) -> Self {
        Self {
            region,
            live: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// Lease an area of exactly `size` bytes
    pub fn alloc(&mut self, size: u32) -> Result<WorkingArea> {
        self.requests.push(size);

        if size == 0 {
            return Err(Error::ResourceUnavailable);
        }

        let mut candidate = self.region.address;
        for area in &self.live {
            if candidate as u64 + size as u64 <= area.address as u64 {
                break;
            }
            candidate = area.end().next_multiple_of(4);
        }

        if candidate as u64 + size as u64 > self.region.end() as u64 {
            log::debug!("no {} byte working area left", size);
            return Err(Error::ResourceUnavailable);
        }

        let area = WorkingArea::new(candidate, size);
        let pos = self.live.partition_point(|a| a.address < candidate);
        self.live.insert(pos, area);
        log::trace!("allocated {} bytes at 0x{:08X}", size, candidate);
        Ok(area)
    }

    /// Release an area returned by [`alloc`](Self::alloc)
    pub fn free(&mut self, area: WorkingArea) -> Result<()> {
        match self.live.iter().position(|a| *a == area) {
            Some(pos) => {
                self.live.remove(pos);
                Ok(())
            }
            None => {
                log::warn!("freeing unknown working area at 0x{:08X}", area.address);
                Err(Error::TargetAccess { addr: area.address })
            }
        }
    }

    /// Areas currently leased
    pub fn live(&self) -> &[WorkingArea] {
        &self.live
    }

    /// Every requested size, in order
    pub fn requests(&self) -> &[u32] {
        &self.requests
    }

    /// Forget the request history
    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator(size: u32) -> WorkAreaAllocator {
        WorkAreaAllocator::new(WorkingArea::new(0x2000_0000, size))
    }

    #[test]
    fn test_alloc_and_free() {
        let mut wa = allocator(1024);

        let a = wa.alloc(92).unwrap();
        assert_eq!(a, WorkingArea::new(0x2000_0000, 92));
        let b = wa.alloc(512).unwrap();
        assert_eq!(b.address, 0x2000_005C);

        assert_eq!(wa.alloc(512), Err(Error::ResourceUnavailable));

        wa.free(a).unwrap();
        wa.free(b).unwrap();
        assert!(wa.live().is_empty());
        assert_eq!(wa.requests(), &[92, 512, 512]);
    }

    #[test]
    fn test_reuses_gaps() {
        let mut wa = allocator(64);

        let a = wa.alloc(16).unwrap();
        let b = wa.alloc(16).unwrap();
        wa.free(a).unwrap();

        let c = wa.alloc(16).unwrap();
        assert_eq!(c.address, a.address);
        assert_eq!(wa.live(), &[c, b]);
    }

    #[test]
    fn test_unaligned_sizes_keep_alignment() {
        let mut wa = allocator(64);
        wa.alloc(6).unwrap();
        assert_eq!(wa.alloc(4).unwrap().address % 4, 0);
    }

    #[test]
    fn test_free_unknown() {
        let mut wa = allocator(64);
        assert!(wa.free(WorkingArea::new(0x2000_0000, 4)).is_err());
    }

    #[test]
    fn test_empty_region() {
        let mut wa = allocator(0);
        assert_eq!(wa.alloc(4), Err(Error::ResourceUnavailable));
    }
}
