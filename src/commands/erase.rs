//! Erase command

use super::{create_spinner, probed_bank};
use geckoflash_core::flash::FlashDriver;

/// Erase pages `first..=last`, defaulting to the whole bank
pub fn run_erase<D: FlashDriver>(
    driver: &mut D,
    first: Option<u32>,
    last: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(driver)?;
    let first = first.unwrap_or(0);
    let last = last.unwrap_or(bank.sector_count().saturating_sub(1));
    bank.check_sector_range(first, last)?;

    let pages = last - first + 1;
    let pb = create_spinner(format!(
        "Erasing pages {}..={} ({} bytes)...",
        first,
        last,
        pages * bank.page_size()
    ))?;

    match driver.erase(first, last) {
        Ok(()) => {
            pb.finish_with_message(format!("Erased {} pages", pages));
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("Erase failed!");
            Err(Box::new(e))
        }
    }
}
