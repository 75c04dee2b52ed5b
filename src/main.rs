//! geckoflash - Flash programmer for Silicon Labs EFR32 parts
//!
//! Drives the memory system controller of EFR32 Mighty Gecko and Blue Gecko
//! parts through a debug target to read, write and erase the main flash and
//! to maintain the page and debug lock bits.
//!
//! # Architecture
//!
//! Targets are opened from a `name[:key=value,...]` string (see
//! [`targets`]) and wrapped in the `Efr32Flash` driver from
//! `geckoflash-core`. The commands only talk to the driver, so they work
//! the same for every target.

mod cli;
mod commands;
mod targets;

use clap::Parser;
use cli::{Cli, Commands};
use targets::open_flash;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Probe { target } => {
            let mut flash = open_flash(&target)?;
            commands::run_probe(&mut flash)
        }
        Commands::Info { target } => {
            let mut flash = open_flash(&target)?;
            commands::run_info(&mut flash)
        }
        Commands::Erase {
            target,
            first,
            last,
        } => {
            let mut flash = open_flash(&target)?;
            commands::run_erase(&mut flash, first, last)
        }
        Commands::Write {
            target,
            input,
            offset,
            no_erase,
            no_verify,
        } => {
            let mut flash = open_flash(&target)?;
            commands::run_write(&mut flash, &input, offset, no_erase, no_verify)
        }
        Commands::Read {
            target,
            output,
            offset,
            length,
        } => {
            let mut flash = open_flash(&target)?;
            commands::run_read(&mut flash, &output, offset, length)
        }
        Commands::Verify {
            target,
            input,
            offset,
        } => {
            let mut flash = open_flash(&target)?;
            commands::run_verify(&mut flash, &input, offset)
        }
        Commands::Protect {
            target,
            first,
            last,
        } => {
            let mut flash = open_flash(&target)?;
            commands::run_protect(&mut flash, first, last)
        }
        Commands::ProtectStatus { target } => {
            let mut flash = open_flash(&target)?;
            commands::run_protect_status(&mut flash)
        }
        Commands::DebugLock { target } => {
            let mut flash = open_flash(&target)?;
            commands::run_debug_lock(&mut flash)
        }
        Commands::ListTargets => {
            commands::list_targets();
            Ok(())
        }
    }
}
