//! Simulated part configuration

use crate::error::{DummyError, Result};
use geckoflash_core::device::PartFamily;

/// CPUID of a Cortex-M4 r0p1
pub const CPUID_CORTEX_M4: u32 = 0x410F_C241;

/// Configuration of the simulated part
///
/// Defaults describe an EFR32MG1P232 with a 16 KiB working area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyConfig {
    /// Value of the CPUID register
    pub cpuid: u32,
    /// Family id in the DI page
    pub family: u8,
    /// Flash size in KiB
    pub flash_kib: u16,
    /// RAM size in KiB
    pub ram_kib: u16,
    /// Part number
    pub part_number: u16,
    /// Product revision
    pub revision: u8,
    /// Encoded page size in the DI page (`1 << (code + 10)` bytes)
    pub page_size_code: u8,
    /// Working area size in bytes, 0 for none
    pub work_area_size: u32,
    /// Whether the CPU starts halted
    pub halted: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            cpuid: CPUID_CORTEX_M4,
            family: PartFamily::MIGHTY_GECKO_ID,
            flash_kib: 256,
            ram_kib: 32,
            part_number: 232,
            revision: 3,
            page_size_code: 1,
            work_area_size: 16 * 1024,
            halted: true,
        }
    }
}

impl DummyConfig {
    /// Flash size in bytes
    pub fn flash_size(&self) -> u32 {
        self.flash_kib as u32 * 1024
    }

    /// RAM size in bytes
    pub fn ram_size(&self) -> u32 {
        self.ram_kib as u32 * 1024
    }

    /// Page size in bytes, 0 if the code does not decode
    pub fn page_size(&self) -> u32 {
        geckoflash_core::device::decode_page_size(self.page_size_code).unwrap_or(0)
    }

    /// Parse options from key-value pairs (from CLI)
    ///
    /// Supported options:
    /// - family=mg|bg|<id>
    /// - flash_kib=<n>
    /// - ram_kib=<n>
    /// - part=<n>
    /// - rev=<n>
    /// - workarea=<bytes>
    /// - halted=true|false
    pub fn from_options(options: &[(&str, &str)]) -> Result<Self> {
        let mut config = Self::default();

        for (key, value) in options {
            match *key {
                "family" => config.family = parse_family(value)?,
                "flash_kib" => config.flash_kib = parse_num(key, value)?,
                "ram_kib" => config.ram_kib = parse_num(key, value)?,
                "part" => config.part_number = parse_num(key, value)?,
                "rev" => config.revision = parse_num(key, value)?,
                "workarea" => config.work_area_size = parse_num(key, value)?,
                "halted" => {
                    config.halted = match *value {
                        "1" | "true" | "yes" => true,
                        "0" | "false" | "no" => false,
                        _ => return Err(invalid(key, value)),
                    }
                }
                _ => {
                    log::warn!("Unknown dummy target option: {}={}", key, value);
                }
            }
        }

        if config.work_area_size > config.ram_size() {
            return Err(DummyError::WorkAreaTooLarge {
                work_area: config.work_area_size,
                ram: config.ram_size(),
            });
        }

        Ok(config)
    }
}

fn invalid(key: &str, value: &str) -> DummyError {
    DummyError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_num<T: TryFrom<u64>>(key: &str, value: &str) -> Result<T> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed
        .ok()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| invalid(key, value))
}

fn parse_family(value: &str) -> Result<u8> {
    match value.to_ascii_lowercase().as_str() {
        "mg" | "mighty" | "efr32mg" => Ok(PartFamily::MIGHTY_GECKO_ID),
        "bg" | "blue" | "efr32bg" => Ok(PartFamily::BLUE_GECKO_ID),
        other => other
            .parse()
            .map_err(|_| DummyError::UnknownFamily(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DummyConfig::default();
        assert_eq!(config.flash_size(), 256 * 1024);
        assert_eq!(config.page_size(), 2048);
        assert!(config.halted);
    }

    #[test]
    fn test_from_options() {
        let config = DummyConfig::from_options(&[
            ("family", "bg"),
            ("flash_kib", "128"),
            ("ram_kib", "16"),
            ("part", "0x84"),
            ("rev", "1"),
            ("workarea", "0"),
            ("halted", "no"),
        ])
        .unwrap();

        assert_eq!(config.family, PartFamily::BLUE_GECKO_ID);
        assert_eq!(config.flash_kib, 128);
        assert_eq!(config.ram_kib, 16);
        assert_eq!(config.part_number, 0x84);
        assert_eq!(config.revision, 1);
        assert_eq!(config.work_area_size, 0);
        assert!(!config.halted);
    }

    #[test]
    fn test_numeric_family() {
        let config = DummyConfig::from_options(&[("family", "71")]).unwrap();
        assert_eq!(config.family, 71);

        assert_eq!(
            DummyConfig::from_options(&[("family", "zg")]),
            Err(DummyError::UnknownFamily("zg".into()))
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            DummyConfig::from_options(&[("flash_kib", "lots")]),
            Err(DummyError::InvalidValue {
                key: "flash_kib".into(),
                value: "lots".into()
            })
        );
        // rev is a single byte
        assert!(DummyConfig::from_options(&[("rev", "256")]).is_err());
        assert!(DummyConfig::from_options(&[("halted", "maybe")]).is_err());
        assert_eq!(
            DummyConfig::from_options(&[("workarea", "65536")]),
            Err(DummyError::WorkAreaTooLarge {
                work_area: 65536,
                ram: 32 * 1024
            })
        );
    }

    #[test]
    fn test_unknown_option_ignored() {
        let config = DummyConfig::from_options(&[("speed", "fast")]).unwrap();
        assert_eq!(config, DummyConfig::default());
    }
}
