//! Block write algorithm
//!
//! Writing flash one word at a time costs several debug transactions per
//! word. For bulk writes a short Thumb program is uploaded into target RAM
//! together with a ring buffer; the host streams data into the ring while
//! the target CPU drains it into the MSC.
//!
//! The shared state lives entirely in target memory:
//!
//! ```text
//! ring.address + 0   write pointer  (advanced by the host)
//! ring.address + 4   read pointer   (advanced by the program, 0 on error)
//! ring.address + 8   data ...       (up to ring.end())
//! ```
//!
//! When no working area is available [`write_block`] fails with
//! `Error::ResourceUnavailable` and the caller falls back to word writes.

mod block;
mod program;
mod ring;

pub use block::*;
pub use program::*;
pub use ring::*;
