//! MSC command sequences

use super::regs::{self, MscStatus, WriteCmd, WriteCtrl};
use crate::error::{Error, Result};
use crate::target::DebugTarget;
use maybe_async::maybe_async;

/// Bounded polling budget for [`wait_status`]
///
/// The status register is read at most `polls` times with a delay of
/// `interval_us` between consecutive reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    /// Maximum number of status reads
    pub polls: u32,
    /// Delay between reads in microseconds
    pub interval_us: u32,
}

impl PollBudget {
    /// Create a new polling budget
    pub const fn new(polls: u32, interval_us: u32) -> Self {
        Self { polls, interval_us }
    }
}

/// Page erase: 100 polls, 1ms apart
pub const ERASE_TIMEOUT: PollBudget = PollBudget::new(100, 1000);
/// Wait for WDATAREADY: 100 polls, 1ms apart
pub const WDATAREADY_TIMEOUT: PollBudget = PollBudget::new(100, 1000);
/// Word write: 100 polls, 1ms apart
pub const WRITE_TIMEOUT: PollBudget = PollBudget::new(100, 1000);

/// Read the MSC status register
#[maybe_async]
pub async fn read_status<T: DebugTarget + ?Sized>(target: &mut T) -> Result<MscStatus> {
    let status = target.read_u32(regs::STATUS).await?;
    Ok(MscStatus::from_bits_retain(status))
}

/// Set or clear bits in a register with a read-modify-write
#[maybe_async]
pub async fn set_reg_bits<T: DebugTarget + ?Sized>(
    target: &mut T,
    reg: u32,
    mask: u32,
    set: bool,
) -> Result<()> {
    let mut value = target.read_u32(reg).await?;
    if set {
        value |= mask;
    } else {
        value &= !mask;
    }
    target.write_u32(reg, value).await
}

/// Set or clear `WRITECTRL.WREN`
#[maybe_async]
pub async fn set_write_enable<T: DebugTarget + ?Sized>(target: &mut T, enable: bool) -> Result<()> {
    set_reg_bits(target, regs::WRITECTRL, WriteCtrl::WREN.bits(), enable).await
}

/// Lock or unlock the MSC command registers
#[maybe_async]
pub async fn set_msc_lock<T: DebugTarget + ?Sized>(target: &mut T, locked: bool) -> Result<()> {
    let key = if locked { 0 } else { regs::LOCK_KEY };
    target.write_u32(regs::LOCK, key).await
}

/// Unlock the MSC and enable writes
///
/// On failure the MSC is locked again before returning. Every successful
/// call must be paired with [`end_write`].
#[maybe_async]
pub async fn begin_write<T: DebugTarget + ?Sized>(target: &mut T) -> Result<()> {
    set_msc_lock(target, false).await?;
    if let Err(e) = set_write_enable(target, true).await {
        log::error!("Failed to enable MSC write: {}", e);
        if let Err(e) = set_msc_lock(target, true).await {
            log::warn!("Failed to relock MSC: {}", e);
        }
        return Err(e);
    }
    Ok(())
}

/// Disable writes and lock the MSC
///
/// Both steps are always attempted; the first failure is returned.
#[maybe_async]
pub async fn end_write<T: DebugTarget + ?Sized>(target: &mut T) -> Result<()> {
    let wren = set_write_enable(target, false).await;
    let lock = set_msc_lock(target, true).await;
    wren.and(lock)
}

/// Wait until the bits in `mask` are set (`want_set`) or clear
///
/// The status register is read at most `budget.polls` times. Returns the
/// status that satisfied the condition, or `Error::Timeout` carrying the
/// last status read.
#[maybe_async]
pub async fn wait_status<T: DebugTarget + ?Sized>(
    target: &mut T,
    budget: PollBudget,
    mask: MscStatus,
    want_set: bool,
) -> Result<MscStatus> {
    let mut status = MscStatus::empty();

    for poll in 0..budget.polls {
        if poll > 0 {
            target.delay_us(budget.interval_us).await;
        }

        status = read_status(target).await?;
        log::debug!("status: 0x{:08X}", status.bits());

        if status.intersects(mask) == want_set {
            warn_if_erase_aborted(status);
            return Ok(status);
        }
    }

    warn_if_erase_aborted(status);
    log::error!("timed out waiting for MSC status");
    Err(Error::Timeout {
        status: status.bits(),
    })
}

fn warn_if_erase_aborted(status: MscStatus) {
    if status.contains(MscStatus::ERASEABORTED) {
        log::warn!("page erase was aborted");
    }
}

/// Latch `addr` into the MSC and check it is writable
#[maybe_async]
async fn latch_address<T: DebugTarget + ?Sized>(target: &mut T, addr: u32) -> Result<()> {
    target.write_u32(regs::ADDRB, addr).await?;
    set_reg_bits(target, regs::WRITECMD, WriteCmd::LADDRIM.bits(), true).await?;

    let status = read_status(target).await?;
    log::debug!("status 0x{:08X}", status.bits());

    if status.contains(MscStatus::LOCKED) {
        log::error!("Page is locked");
        Err(Error::Protected { addr })
    } else if status.contains(MscStatus::INVADDR) {
        log::error!("Invalid address 0x{:08X}", addr);
        Err(Error::InvalidAddress { addr })
    } else {
        Ok(())
    }
}

/// Erase the flash page containing `addr`
///
/// Write mode must already be enabled with [`begin_write`].
#[maybe_async]
pub async fn erase_page<T: DebugTarget + ?Sized>(target: &mut T, addr: u32) -> Result<()> {
    log::debug!("erasing flash page at 0x{:08X}", addr);

    latch_address(target, addr).await?;
    set_reg_bits(target, regs::WRITECMD, WriteCmd::ERASEPAGE.bits(), true).await?;
    wait_status(target, ERASE_TIMEOUT, MscStatus::BUSY, false).await?;
    Ok(())
}

/// Program one word at `addr`
///
/// Write mode must already be enabled with [`begin_write`].
#[maybe_async]
pub async fn write_word<T: DebugTarget + ?Sized>(target: &mut T, addr: u32, value: u32) -> Result<()> {
    latch_address(target, addr).await?;

    if let Err(e) = wait_status(target, WDATAREADY_TIMEOUT, MscStatus::WDATAREADY, true).await {
        log::error!("Wait for WDATAREADY failed");
        return Err(e);
    }

    target.write_u32(regs::WDATA, value).await?;
    target
        .write_u32(regs::WRITECMD, WriteCmd::WRITEONCE.bits())
        .await?;

    if let Err(e) = wait_status(target, WRITE_TIMEOUT, MscStatus::BUSY, false).await {
        log::error!("Wait for BUSY failed");
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::mock::MockTarget;

    #[test]
    fn test_wait_status_times_out_after_budget() {
        let mut target = MockTarget::new();
        target.status = MscStatus::BUSY.bits();

        let budget = PollBudget::new(7, 10);
        let result = wait_status(&mut target, budget, MscStatus::BUSY, false);

        assert_eq!(
            result,
            Err(Error::Timeout {
                status: MscStatus::BUSY.bits()
            })
        );
        assert_eq!(target.status_reads, 7);
        assert_eq!(target.delayed_us, 6 * 10);
    }

    #[test]
    fn test_wait_status_returns_immediately() {
        let mut target = MockTarget::new();
        target.status = MscStatus::WDATAREADY.bits();

        let status = wait_status(&mut target, WRITE_TIMEOUT, MscStatus::WDATAREADY, true).unwrap();
        assert!(status.contains(MscStatus::WDATAREADY));
        assert_eq!(target.status_reads, 1);
        assert_eq!(target.delayed_us, 0);
    }

    #[test]
    fn test_wait_status_follows_sequence() {
        let mut target = MockTarget::new();
        let busy = MscStatus::BUSY.bits();
        target.status_sequence.extend([busy, busy, busy]);

        wait_status(&mut target, ERASE_TIMEOUT, MscStatus::BUSY, false).unwrap();
        assert_eq!(target.status_reads, 4);
    }

    #[test]
    fn test_erase_page_locked() {
        let mut target = MockTarget::new();
        target.status = MscStatus::LOCKED.bits();

        assert_eq!(
            erase_page(&mut target, 0x800),
            Err(Error::Protected { addr: 0x800 })
        );
        // The erase command must not be issued for a locked page
        assert!(!target
            .writes
            .iter()
            .any(|&(reg, val)| reg == regs::WRITECMD && val & WriteCmd::ERASEPAGE.bits() != 0));
    }

    #[test]
    fn test_erase_page_invalid_address() {
        let mut target = MockTarget::new();
        target.status = MscStatus::INVADDR.bits();

        assert_eq!(
            erase_page(&mut target, 0x0100_0000),
            Err(Error::InvalidAddress { addr: 0x0100_0000 })
        );
    }

    #[test]
    fn test_write_word_sequence() {
        let mut target = MockTarget::new();
        target.status = MscStatus::WDATAREADY.bits();

        write_word(&mut target, 0x1000, 0xDEAD_BEEF).unwrap();

        assert_eq!(
            target.writes,
            [
                (regs::ADDRB, 0x1000),
                (regs::WRITECMD, WriteCmd::LADDRIM.bits()),
                (regs::WDATA, 0xDEAD_BEEF),
                (regs::WRITECMD, WriteCmd::WRITEONCE.bits()),
            ]
        );
    }

    #[test]
    fn test_write_word_wdataready_timeout() {
        let mut target = MockTarget::new();
        target.status = 0;

        let result = write_word(&mut target, 0x1000, 0);
        assert_eq!(result, Err(Error::Timeout { status: 0 }));
        assert_eq!(target.status_reads, 1 + WDATAREADY_TIMEOUT.polls as usize);
        assert!(!target.writes.iter().any(|&(reg, _)| reg == regs::WDATA));
    }

    #[test]
    fn test_begin_end_write() {
        let mut target = MockTarget::new();

        begin_write(&mut target).unwrap();
        assert_eq!(target.word(regs::LOCK), regs::LOCK_KEY);
        assert_eq!(target.word(regs::WRITECTRL), WriteCtrl::WREN.bits());

        end_write(&mut target).unwrap();
        assert_eq!(target.word(regs::LOCK), 0);
        assert_eq!(target.word(regs::WRITECTRL), 0);
    }
}
