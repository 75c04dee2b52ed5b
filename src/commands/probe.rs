//! Probe and info commands

use super::{print_flash_size, probed_bank};
use geckoflash_core::device::DeviceInfo;
use geckoflash_core::flash::{Efr32Flash, FlashDriver};
use geckoflash_core::target::DebugTarget;

/// Identify the part behind the target
pub fn run_probe<T: DebugTarget>(
    flash: &mut Efr32Flash<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = flash.probe() {
        eprintln!("Probe failed: {}", e);
        return Err(Box::new(e));
    }

    let bank = probed_bank(flash)?;
    if let Some(info) = flash.device_info() {
        println!("Found {}", info);
    }
    print_flash_size(&bank);
    Ok(())
}

/// Show the device descriptor and the bank state
pub fn run_info<T: DebugTarget>(
    flash: &mut Efr32Flash<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = probed_bank(flash)?;
    let info = flash.info()?;

    print_device_info(&info);
    println!();
    print_flash_size(&bank);

    let locked = bank.sectors.iter().filter(|s| s.protected).count();
    println!("Locked pages:    {}", locked);
    println!(
        "Debug lock:      {}",
        if flash.lock_bits().is_debug_locked() {
            "set"
        } else {
            "clear"
        }
    );
    Ok(())
}

fn print_device_info(info: &DeviceInfo) {
    println!("Device Information");
    println!("==================");
    println!();
    println!("Device:          {}", info);
    println!("Core:            {}", info.core);
    println!(
        "Family:          {} (id {})",
        info.family.name(),
        info.family.id()
    );
    println!("Part number:     {}", info.part_number);
    println!("Revision:        {}", info.product_revision);
    println!("Flash:           {} KiB", info.flash_size_kib);
    println!("RAM:             {} KiB", info.ram_size_kib);
    println!("Page size:       {} bytes", info.page_size);
}
