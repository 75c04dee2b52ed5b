//! Page lock bits
//!
//! The lock bits page at `0x0FE0_4000` holds one bit per flash page plus
//! three control words. A cleared bit locks the page; an erased (all
//! ones) lock bits page leaves everything unlocked.
//!
//! | Word | Meaning                                  |
//! |------|------------------------------------------|
//! | 0..  | Page lock words, bit `n % 32` of `n / 32` |
//! | 125  | Master lock word (MLW)                   |
//! | 126  | User data page lock word (ULW)           |
//! | 127  | Debug lock word (DLW)                    |
//!
//! The driver keeps a mirror of the page in [`LockBitsPage`]. Changes are
//! made on the mirror and written back as a whole: the page is erased and
//! all 512 bytes are programmed again.

mod page;
mod read;

pub use page::*;
pub use read::*;
