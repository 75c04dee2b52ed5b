//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

const TARGET_HELP: &str =
    "Debug target, as name[:key=value,...] [available: dummy] (see list-targets)";

#[derive(Parser)]
#[command(name = "geckoflash")]
#[command(author, version, about = "EFR32 flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the target and show the detected part
    Probe {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,
    },

    /// Show device information and flash geometry
    Info {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,
    },

    /// Erase flash pages
    Erase {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,

        /// First page to erase (defaults to 0)
        #[arg(long)]
        first: Option<u32>,

        /// Last page to erase, inclusive (defaults to the last page)
        #[arg(long)]
        last: Option<u32>,
    },

    /// Write file to flash
    Write {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Flash offset to write at (hex, must be 4-byte aligned)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        offset: u32,

        /// Don't erase the affected pages before writing
        #[arg(long)]
        no_erase: bool,

        /// Don't read back and compare after writing
        #[arg(long)]
        no_verify: bool,
    },

    /// Read flash contents to file
    Read {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Flash offset to start reading at (hex or decimal)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        offset: u32,

        /// Number of bytes to read (defaults to the rest of the bank)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },

    /// Verify flash contents against file
    Verify {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,

        /// Input file path to verify against
        #[arg(short, long)]
        input: PathBuf,

        /// Flash offset the file was written at (hex or decimal)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        offset: u32,
    },

    /// Lock flash pages (pages are unlocked by erasing the lock bits page)
    Protect {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,

        /// First page to lock
        #[arg(long)]
        first: u32,

        /// Last page to lock, inclusive
        #[arg(long)]
        last: u32,
    },

    /// Show the lock state of every page
    ProtectStatus {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,
    },

    /// Lock the debug interface (takes effect after reset)
    DebugLock {
        #[arg(short, long, default_value = "dummy", help = TARGET_HELP)]
        target: String,
    },

    /// List supported debug targets
    ListTargets,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x800"), Ok(0x800));
        assert_eq!(parse_hex_u32("0X1F"), Ok(0x1F));
        assert_eq!(parse_hex_u32("2048"), Ok(2048));
        assert!(parse_hex_u32("0xZZ").is_err());
        assert!(parse_hex_u32("-1").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_write_command() {
        let cli = Cli::try_parse_from([
            "geckoflash",
            "-vv",
            "write",
            "-t",
            "dummy:flash_kib=128",
            "-i",
            "image.bin",
            "--offset",
            "0x1000",
            "--no-verify",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Write {
                target,
                input,
                offset,
                no_erase,
                no_verify,
            } => {
                assert_eq!(target, "dummy:flash_kib=128");
                assert_eq!(input, PathBuf::from("image.bin"));
                assert_eq!(offset, 0x1000);
                assert!(!no_erase);
                assert!(no_verify);
            }
            _ => panic!("expected write command"),
        }
    }

    #[test]
    fn test_protect_requires_range() {
        assert!(Cli::try_parse_from(["geckoflash", "protect", "--first", "1"]).is_err());
    }
}
