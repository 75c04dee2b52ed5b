//! Ring buffer shared between host and write program

use crate::target::WorkingArea;

/// Size of the ring header (write pointer + read pointer)
pub const RING_HEADER_SIZE: u32 = 8;

/// Layout of a ring buffer in target RAM
///
/// Pointers are absolute target addresses inside `[data_start, end)`. The
/// ring is empty when both pointers are equal; the producer always leaves
/// one block unused so that a full ring never looks empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingBuffer {
    start: u32,
    end: u32,
}

impl RingBuffer {
    /// Describe the ring occupying `area`
    ///
    /// The area must be larger than the header.
    pub const fn new(area: &WorkingArea) -> Self {
        Self {
            start: area.address,
            end: area.end(),
        }
    }

    /// Address of the write pointer word
    pub const fn write_ptr_addr(&self) -> u32 {
        self.start
    }

    /// Address of the read pointer word
    pub const fn read_ptr_addr(&self) -> u32 {
        self.start + 4
    }

    /// First data address
    pub const fn data_start(&self) -> u32 {
        self.start + RING_HEADER_SIZE
    }

    /// One past the last data address
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Size of the data region in bytes
    pub const fn capacity(&self) -> u32 {
        self.end - self.data_start()
    }

    /// Whether `ptr` is a valid data pointer for this ring
    pub const fn contains(&self, ptr: u32) -> bool {
        ptr >= self.data_start() && ptr < self.end
    }

    /// Bytes published by the host and not yet consumed by the program
    pub const fn readable(&self, wp: u32, rp: u32) -> u32 {
        if wp >= rp {
            wp - rp
        } else {
            self.capacity() - (rp - wp)
        }
    }

    /// Bytes the host may publish without overrunning the program
    ///
    /// One `block` is always held back.
    pub const fn writable(&self, wp: u32, rp: u32, block: u32) -> u32 {
        self.capacity()
            .saturating_sub(self.readable(wp, rp))
            .saturating_sub(block)
    }

    /// Bytes writable at `wp` before the data region wraps
    pub const fn contiguous_writable(&self, wp: u32, rp: u32, block: u32) -> u32 {
        let free = self.writable(wp, rp, block);
        let to_end = self.end - wp;
        if free < to_end {
            free
        } else {
            to_end
        }
    }

    /// Move a pointer forward by `bytes`, wrapping to `data_start`
    pub const fn advance(&self, ptr: u32, bytes: u32) -> u32 {
        let next = ptr + bytes;
        if next >= self.end {
            next - self.capacity()
        } else {
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> RingBuffer {
        // 8 byte header + 32 bytes of data
        RingBuffer::new(&WorkingArea::new(0x2000_0100, 40))
    }

    #[test]
    fn test_layout() {
        let ring = ring();
        assert_eq!(ring.write_ptr_addr(), 0x2000_0100);
        assert_eq!(ring.read_ptr_addr(), 0x2000_0104);
        assert_eq!(ring.data_start(), 0x2000_0108);
        assert_eq!(ring.end(), 0x2000_0128);
        assert_eq!(ring.capacity(), 32);
        assert!(ring.contains(ring.data_start()));
        assert!(!ring.contains(ring.end()));
        assert!(!ring.contains(0));
    }

    #[test]
    fn test_empty_ring() {
        let ring = ring();
        let start = ring.data_start();
        assert_eq!(ring.readable(start, start), 0);
        assert_eq!(ring.writable(start, start, 4), 28);
        assert_eq!(ring.contiguous_writable(start, start, 4), 28);
    }

    #[test]
    fn test_full_ring_keeps_one_block() {
        let ring = ring();
        let rp = ring.data_start();
        let wp = ring.advance(rp, 28);
        assert_eq!(ring.readable(wp, rp), 28);
        assert_eq!(ring.writable(wp, rp, 4), 0);
        // Publishing would make wp == rp, which reads as empty
        assert_eq!(ring.advance(wp, 4), rp);
    }

    #[test]
    fn test_wrap_around() {
        let ring = ring();
        let wp = ring.end() - 4;
        assert_eq!(ring.advance(wp, 4), ring.data_start());
        assert_eq!(ring.advance(wp, 8), ring.data_start() + 4);

        // Write pointer behind the read pointer after wrapping
        let rp = ring.data_start() + 16;
        let wp = ring.data_start() + 8;
        assert_eq!(ring.readable(wp, rp), 24);
        assert_eq!(ring.writable(wp, rp, 4), 4);
        assert_eq!(ring.contiguous_writable(wp, rp, 4), 4);
    }

    #[test]
    fn test_contiguous_stops_at_end() {
        let ring = ring();
        let rp = ring.data_start() + 20;
        let wp = ring.data_start() + 24;
        assert_eq!(ring.writable(wp, rp, 4), 24);
        assert_eq!(ring.contiguous_writable(wp, rp, 4), 8);
    }
}
