//! Debug target traits and abstractions
//!
//! This module defines the trait a debug transport must implement so the
//! flash engine can reach the target's memory, registers and RAM.

#[cfg(test)]
pub(crate) mod mock;
mod traits;

pub use traits::*;
