//! Error types for the simulated target

use thiserror::Error;

/// Errors from configuring a simulated target
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DummyError {
    /// Option value could not be parsed
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue {
        /// Option name
        key: String,
        /// Rejected value
        value: String,
    },

    /// Family name is not known
    #[error("Unknown family '{0}' (use mg, bg or a numeric family id)")]
    UnknownFamily(String),

    /// Working area does not fit in RAM
    #[error("Working area of {work_area} bytes does not fit in {ram} bytes of RAM")]
    WorkAreaTooLarge {
        /// Requested working area size
        work_area: u32,
        /// RAM size
        ram: u32,
    },
}

/// Result type for simulated target configuration
pub type Result<T> = std::result::Result<T, DummyError>;
