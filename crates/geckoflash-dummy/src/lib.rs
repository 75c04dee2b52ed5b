//! geckoflash-dummy - Simulated EFR32 target for testing
//!
//! This crate provides a debug target that emulates an EFR32 part in
//! memory: device information page, flash array, lock bits page, SRAM and
//! the memory system controller. Block writes run against a software model
//! of the flash write program. It's useful for testing and development
//! without real hardware.
//!
//! # Example
//!
//! ```ignore
//! use geckoflash_core::flash::{Efr32Flash, FlashDriver};
//! use geckoflash_dummy::{DummyConfig, DummyTarget};
//!
//! let mut flash = Efr32Flash::new(DummyTarget::new(DummyConfig::default()));
//! flash.probe()?;
//! flash.erase(0, 0)?;
//! flash.write(0, b"hello")?;
//! ```

mod config;
mod error;
mod msc;
mod program;
mod target;
mod workarea;

pub use config::{DummyConfig, CPUID_CORTEX_M4};
pub use error::{DummyError, Result};
pub use msc::{FlashCommand, Latch, MscModel};
pub use target::{DummyStats, DummyTarget, DEV_INFO_SIZE, RAM_BASE};
pub use workarea::WorkAreaAllocator;

/// Open a simulated target from CLI options
///
/// See [`DummyConfig::from_options`] for the supported keys.
pub fn open_dummy(options: &[(&str, &str)]) -> Result<DummyTarget> {
    let config = DummyConfig::from_options(options)?;
    log::info!(
        "Simulated EFR32: family {}, {} KiB flash, {} KiB RAM, {} byte working area",
        config.family,
        config.flash_kib,
        config.ram_kib,
        config.work_area_size
    );
    Ok(DummyTarget::new(config))
}
