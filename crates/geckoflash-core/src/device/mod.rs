//! Part identification
//!
//! EFR32 parts describe themselves in the device information (DI) page of
//! the flash information block. This module reads that page, classifies the
//! CPU core and part family and validates the page geometry.

mod probe;
mod types;

pub use probe::*;
pub use types::*;
