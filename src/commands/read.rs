//! Read command

use super::{check_range, create_progress_bar, probed_bank, CHUNK_SIZE};
use geckoflash_core::flash::FlashDriver;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Read `length` bytes at `offset` (default: to the end of the bank) into
/// `output`
pub fn run_read<D: FlashDriver>(
    driver: &mut D,
    output: &Path,
    offset: u32,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(driver)?;
    let length = match length {
        Some(length) => length,
        None => bank
            .size
            .checked_sub(offset)
            .ok_or_else(|| format!("Offset 0x{:08X} is beyond the flash", offset))?,
    } as usize;
    check_range(&bank, offset, length)?;

    let mut data = vec![0xFFu8; length];
    let pb = create_progress_bar(length as u64, "Reading")?;
    let mut done = 0usize;

    for chunk in data.chunks_mut(CHUNK_SIZE) {
        let chunk_len = chunk.len();
        if let Err(e) = driver.read(offset + done as u32, chunk) {
            pb.abandon_with_message("Read failed!");
            return Err(Box::new(e));
        }
        done += chunk_len;
        pb.set_position(done as u64);
    }
    pb.finish_with_message("Read complete");

    let mut file = File::create(output)?;
    file.write_all(&data)?;
    println!("Wrote {} bytes to {:?}", data.len(), output);

    Ok(())
}
