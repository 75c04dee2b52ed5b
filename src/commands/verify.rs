//! Verify command

use super::{check_range, probed_bank, read_file, verify_flash};
use geckoflash_core::flash::FlashDriver;
use std::path::Path;

/// Compare the flash at `offset` against `input`
pub fn run_verify<D: FlashDriver>(
    driver: &mut D,
    input: &Path,
    offset: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(driver)?;
    let expected = read_file(input)?;
    check_range(&bank, offset, expected.len())?;

    verify_flash(driver, offset, &expected)?;
    println!("Verification passed!");

    Ok(())
}
