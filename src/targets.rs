//! Debug target registration and dispatch
//!
//! Target strings have the form `name[:key=value,...]`, e.g.
//! `dummy:family=20,flash_kib=512`.

use geckoflash_core::flash::Efr32Flash;
use geckoflash_core::target::DebugTarget;
use thiserror::Error;

/// A debug target opened from a target string
pub type TargetHandle = Box<dyn DebugTarget + Send>;

/// Target string and registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    /// A parameter is not of the form key=value
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),
    /// No target is registered under this name
    #[error("Unknown target: {0} (use 'geckoflash list-targets')")]
    UnknownTarget(String),
}

/// Information about a debug target
pub struct TargetInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
    /// Accepted parameters with their meaning
    pub params: &'static [(&'static str, &'static str)],
}

const TARGETS: &[TargetInfo] = &[TargetInfo {
    name: "dummy",
    aliases: &["sim"],
    description: "Simulated EFR32 part held in memory",
    params: &[
        ("family", "Part family: mg, bg or a raw DI family id"),
        ("flash_kib", "Flash size in KiB"),
        ("ram_kib", "RAM size in KiB"),
        ("part", "Part number"),
        ("rev", "Product revision"),
        ("workarea", "Working area size in bytes (0 disables block writes)"),
        ("halted", "Whether the core is halted (true/false)"),
    ],
}];

/// All targets this build can open
pub fn available_targets() -> &'static [TargetInfo] {
    TARGETS
}

/// Find a target by name or alias
pub fn find_target(name: &str) -> Option<&'static TargetInfo> {
    available_targets()
        .iter()
        .find(|t| t.name == name || t.aliases.contains(&name))
}

/// A parsed target string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec<'a> {
    /// Target name
    pub name: &'a str,
    /// Parameters in the order given
    pub params: Vec<(&'a str, &'a str)>,
}

/// Parse a `name[:key=value,...]` target string
///
/// Empty parameter entries (e.g. a trailing comma) are ignored.
pub fn parse_target_string(s: &str) -> Result<TargetSpec<'_>, TargetError> {
    let (name, opts) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    for opt in opts.split(',').filter(|opt| !opt.is_empty()) {
        match opt.split_once('=') {
            Some((key, value)) => params.push((key.trim(), value.trim())),
            None => return Err(TargetError::InvalidParameter(opt.to_string())),
        }
    }

    Ok(TargetSpec {
        name: name.trim(),
        params,
    })
}

/// Open the target named by `target` and wrap it in a flash driver
///
/// The bank is not probed yet; commands call `auto_probe` themselves.
pub fn open_flash(target: &str) -> Result<Efr32Flash<TargetHandle>, Box<dyn std::error::Error>> {
    let spec = parse_target_string(target)?;
    let info =
        find_target(spec.name).ok_or_else(|| TargetError::UnknownTarget(spec.name.to_string()))?;

    log::debug!("Opening target '{}' with {:?}", info.name, spec.params);

    match info.name {
        "dummy" => {
            let dummy = geckoflash_dummy::open_dummy(&spec.params)?;
            Ok(Efr32Flash::new(Box::new(dummy)))
        }
        other => Err(TargetError::UnknownTarget(other.to_string()).into()),
    }
}
