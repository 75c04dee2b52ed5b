//! Memory system controller (MSC) protocol
//!
//! This module implements the register-level command sequences the EFR32
//! MSC uses to erase pages and program words:
//!
//! - **Unlock/lock**: writing the lock key to `MSC_LOCK` enables writes to
//!   the command registers
//! - **Write enable**: `WRITECTRL.WREN` must be set before erase or write
//! - **Address latch**: the target address is written to `ADDRB` and
//!   latched with `WRITECMD.LADDRIM`; the controller reports `LOCKED` or
//!   `INVADDR` immediately
//! - **Erase/write**: `WRITECMD.ERASEPAGE` or `WDATA` + `WRITECMD.WRITEONCE`,
//!   then wait for `STATUS.BUSY` to clear
//!
//! Uses `maybe_async` to support both sync and async modes.

mod ops;
pub mod regs;

pub use ops::*;
pub use regs::{MscStatus, WriteCmd, WriteCtrl};
