//! Write command

use super::{check_range, create_progress_bar, probed_bank, read_file, verify_flash};
use geckoflash_core::flash::FlashDriver;
use std::path::Path;

/// Bytes handed to the driver per write call
///
/// A multiple of the word size so every chunk starts aligned.
const WRITE_CHUNK_SIZE: usize = 16 * 1024;

/// Write `input` at `offset`, erasing the covered pages first unless
/// `no_erase` is set
pub fn run_write<D: FlashDriver>(
    driver: &mut D,
    input: &Path,
    offset: u32,
    no_erase: bool,
    no_verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(driver)?;
    let data = read_file(input)?;

    if offset % 4 != 0 {
        return Err(format!("Offset 0x{:08X} is not 4-byte aligned", offset).into());
    }
    check_range(&bank, offset, data.len())?;

    if data.is_empty() {
        println!("Nothing to write");
        return Ok(());
    }

    if !no_erase {
        let page_size = bank.page_size();
        let first = offset / page_size;
        let last = (offset + data.len() as u32 - 1) / page_size;
        log::info!("Erasing pages {}..={} before writing", first, last);
        driver.erase(first, last)?;
    }

    let pb = create_progress_bar(data.len() as u64, "Writing")?;
    let mut written = 0usize;

    for chunk in data.chunks(WRITE_CHUNK_SIZE) {
        if let Err(e) = driver.write(offset + written as u32, chunk) {
            pb.abandon_with_message("Write failed!");
            return Err(Box::new(e));
        }
        written += chunk.len();
        pb.set_position(written as u64);
    }
    pb.finish_with_message("Write complete");

    if !no_verify {
        verify_flash(driver, offset, &data)?;
        println!("Verification passed!");
    }

    println!("Wrote {} bytes at 0x{:08X}", data.len(), offset);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{run_read, run_verify};
    use crate::targets::open_flash;
    use std::fs;

    #[test]
    fn test_write_read_verify_files() {
        let dir = std::env::temp_dir().join(format!("geckoflash-write-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("image.bin");
        let output = dir.join("readback.bin");

        let image: Vec<u8> = (0..5001u32).map(|i| (i % 253) as u8).collect();
        fs::write(&input, &image).unwrap();

        let mut flash = open_flash("dummy:flash_kib=64").unwrap();
        run_write(&mut flash, &input, 0x800, false, false).unwrap();
        run_verify(&mut flash, &input, 0x800).unwrap();
        run_read(&mut flash, &output, 0x800, Some(image.len() as u32)).unwrap();
        assert_eq!(fs::read(&output).unwrap(), image);

        // Misaligned offsets are refused before anything is erased
        assert!(run_write(&mut flash, &input, 0x802, false, true).is_err());
        assert!(run_verify(&mut flash, &input, 0x800).is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }
}
