//! Page lock and debug lock commands

use super::probed_bank;
use geckoflash_core::flash::{Efr32Flash, FlashDriver};
use geckoflash_core::target::DebugTarget;

/// Lock pages `first..=last` and show the resulting lock state
pub fn run_protect<T: DebugTarget>(
    flash: &mut Efr32Flash<T>,
    first: u32,
    last: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(flash)?;
    bank.check_sector_range(first, last)?;

    flash.protect(first, last, true)?;
    println!("Locked pages {}..={}", first, last);

    run_protect_status(flash)
}

/// Read the lock bits back and print the locked page ranges
pub fn run_protect_status<T: DebugTarget>(
    flash: &mut Efr32Flash<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    probed_bank(flash)?;
    flash.protect_check()?;
    let bank = probed_bank(flash)?;

    let locked: Vec<u32> = bank
        .sectors
        .iter()
        .enumerate()
        .filter(|(_, s)| s.protected)
        .map(|(i, _)| i as u32)
        .collect();

    if locked.is_empty() {
        println!("No pages are locked ({} pages)", bank.sector_count());
    } else {
        println!("Locked pages ({} of {}):", locked.len(), bank.sector_count());
        for (start, end) in page_ranges(&locked) {
            let size = (end - start + 1) * bank.page_size();
            let base = bank.base + start * bank.page_size();
            println!(
                "  {:>4}..={:<4} 0x{:08X} - 0x{:08X} ({} bytes)",
                start,
                end,
                base,
                base + size - 1,
                size
            );
        }
    }

    if flash.lock_bits().is_debug_locked() {
        println!("Debug interface: locked");
    }
    Ok(())
}

/// Lock the debug interface
pub fn run_debug_lock<T: DebugTarget>(
    flash: &mut Efr32Flash<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    probed_bank(flash)?;
    flash.debug_lock()?;
    println!("Debug lock written; it takes effect after the next reset");
    Ok(())
}

/// Collapse sorted page indices into inclusive ranges
fn page_ranges(pages: &[u32]) -> Vec<(u32, u32)> {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &page in pages {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == page => *end = page,
            _ => ranges.push((page, page)),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_ranges() {
        assert!(page_ranges(&[]).is_empty());
        assert_eq!(page_ranges(&[5]), [(5, 5)]);
        assert_eq!(
            page_ranges(&[0, 1, 2, 7, 9, 10]),
            [(0, 2), (7, 7), (9, 10)]
        );
    }
}
