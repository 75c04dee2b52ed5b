//! CLI command implementations
//!
//! Every command opens the target, probes the bank if needed and then works
//! through the [`FlashDriver`] operations, so the same code drives any
//! debug transport the target registry knows about.

mod erase;
mod list;
mod probe;
mod protect;
mod read;
mod verify;
mod write;

pub use erase::run_erase;
pub use list::list_targets;
pub use probe::{run_info, run_probe};
pub use protect::{run_debug_lock, run_protect, run_protect_status};
pub use read::run_read;
pub use verify::run_verify;
pub use write::run_write;

use geckoflash_core::flash::{FlashBank, FlashDriver};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Chunk size for reads and progress updates (2 pages)
const CHUNK_SIZE: usize = 4096;

/// Probe the bank if needed and return it
fn probed_bank<D: FlashDriver>(driver: &mut D) -> Result<FlashBank, Box<dyn std::error::Error>> {
    driver.auto_probe()?;
    driver
        .bank()
        .cloned()
        .ok_or_else(|| "Flash bank not probed".into())
}

/// Print flash size information
fn print_flash_size(bank: &FlashBank) {
    println!(
        "Flash size: {} bytes ({} KiB, {} pages of {} bytes)",
        bank.size,
        bank.size / 1024,
        bank.sector_count(),
        bank.page_size()
    );
}

/// Read file contents into a Vec
fn read_file(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    println!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}

/// Check that `len` bytes at `offset` fit in the bank
fn check_range(bank: &FlashBank, offset: u32, len: usize) -> Result<(), Box<dyn std::error::Error>> {
    let end = offset as u64 + len as u64;
    if end > bank.size as u64 {
        return Err(format!(
            "Range 0x{:08X}..0x{:08X} exceeds flash size ({} bytes)",
            offset, end, bank.size
        )
        .into());
    }
    Ok(())
}

/// Create a progress bar with custom phase message
fn create_progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Create a spinner showing `message`
fn create_spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Compare a chunk read back from flash against the expected bytes
fn verify_chunk(
    chunk: &[u8],
    expected_chunk: &[u8],
    base_offset: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    match chunk
        .iter()
        .zip(expected_chunk)
        .position(|(a, b)| a != b)
    {
        Some(i) => Err(format!(
            "Verification failed at offset 0x{:08X}: expected 0x{:02X}, got 0x{:02X}",
            base_offset as usize + i,
            expected_chunk[i],
            chunk[i]
        )
        .into()),
        None => Ok(()),
    }
}

/// Read back `expected.len()` bytes at `offset` and compare
fn verify_flash<D: FlashDriver>(
    driver: &mut D,
    offset: u32,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = create_progress_bar(expected.len() as u64, "Verifying")?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut done = 0usize;

    for expected_chunk in expected.chunks(CHUNK_SIZE) {
        let chunk = &mut buf[..expected_chunk.len()];
        let chunk_offset = offset + done as u32;

        driver.read(chunk_offset, chunk)?;
        if let Err(e) = verify_chunk(chunk, expected_chunk, chunk_offset) {
            pb.abandon_with_message("Verification failed!");
            return Err(e);
        }

        done += expected_chunk.len();
        pb.set_position(done as u64);
    }

    pb.finish_with_message("Verify complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geckoflash_core::flash::FlashBank;

    #[test]
    fn test_verify_chunk_reports_first_difference() {
        assert!(verify_chunk(&[1, 2, 3], &[1, 2, 3], 0).is_ok());

        let err = verify_chunk(&[1, 2, 0, 0], &[1, 2, 3, 4], 0x800).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Verification failed at offset 0x00000802: expected 0x03, got 0x00"
        );
    }

    #[test]
    fn test_check_range() {
        let bank = FlashBank::new(0, 2048, 4);
        assert!(check_range(&bank, 0, 8192).is_ok());
        assert!(check_range(&bank, 4096, 4096).is_ok());
        assert!(check_range(&bank, 4096, 4097).is_err());
        assert!(check_range(&bank, u32::MAX, 1).is_err());
    }
}
