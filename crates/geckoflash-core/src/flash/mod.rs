//! Flash bank driver
//!
//! This module provides the [`FlashDriver`] trait the surrounding tooling
//! uses to drive a flash bank, the EFR32 implementation [`Efr32Flash`] and
//! the write dispatcher shared by flash and lock bits writes.

mod bank;
mod driver;
mod efr32;
mod write;

pub use bank::*;
pub use driver::FlashDriver;
pub use efr32::{Efr32Flash, FLASH_BASE};
pub use write::*;
