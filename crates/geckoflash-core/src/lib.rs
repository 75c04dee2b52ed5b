//! geckoflash-core - Core library for EFR32 flash programming
//!
//! This crate drives the memory system controller (MSC) of Silicon Labs
//! EFR32 "Gecko" parts through a debug transport: it identifies the part,
//! erases and writes flash pages and maintains the page lock bits. It is
//! designed to be `no_std` compatible; the flash bank driver needs `alloc`.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable the flash bank driver and the write dispatcher
//! - `is_sync` - Compile the `maybe_async` code as blocking code
//!
//! # Example
//!
//! ```ignore
//! use geckoflash_core::flash::{Efr32Flash, FlashDriver};
//!
//! fn program<T: DebugTarget>(target: T, image: &[u8]) -> Result<()> {
//!     let mut flash = Efr32Flash::new(target);
//!     flash.probe()?;
//!     let pages = image.len().div_ceil(2048);
//!     flash.erase(0, pages - 1)?;
//!     flash.write(0, image)
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod algorithm;
pub mod device;
pub mod error;
#[cfg(feature = "alloc")]
pub mod flash;
pub mod lockbits;
pub mod msc;
pub mod target;

pub use error::{Error, Result};
