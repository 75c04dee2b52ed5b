//! Memory system controller model

use geckoflash_core::msc::regs::{self, MscStatus, WriteCmd, WriteCtrl};

/// What the controller decided about a latched address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latch {
    /// Address may be erased and written
    Writable,
    /// Address lies in a locked page
    Locked,
    /// Address is not in a flash page
    Invalid,
}

/// Command the controller asks the flash array to carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashCommand {
    /// Erase the page containing the address
    ErasePage(u32),
    /// Program a word at the address
    WriteWord(u32, u32),
}

/// Register-level state of the MSC
///
/// Command decoding lives here; the owning target supplies the latch
/// decision and applies the resulting [`FlashCommand`]s to its memory.
#[derive(Debug, Clone, Default)]
pub struct MscModel {
    unlocked: bool,
    writectrl: u32,
    addrb: u32,
    latched: Option<(u32, Latch)>,
    wdata: u32,
    busy_remaining: u32,
    /// Number of status reads BUSY stays set after a command
    pub busy_polls: u32,
    /// Report BUSY forever
    pub stuck_busy: bool,
    /// Set ERASEABORTED on every status read
    pub erase_aborted: bool,
    status_reads: usize,
}

impl MscModel {
    /// Create a locked controller with writes disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the command registers are locked
    pub fn is_locked(&self) -> bool {
        !self.unlocked
    }

    /// Whether `WRITECTRL.WREN` is set
    pub fn write_enabled(&self) -> bool {
        WriteCtrl::from_bits_retain(self.writectrl).contains(WriteCtrl::WREN)
    }

    /// Current `ADDRB` value, the address the next `LADDRIM` latches
    pub fn addrb(&self) -> u32 {
        self.addrb
    }

    /// Number of status register reads so far
    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    /// Compute the status register without side effects
    pub fn peek_status(&self) -> MscStatus {
        let mut status = MscStatus::empty();
        match self.latched {
            Some((_, Latch::Locked)) => status |= MscStatus::LOCKED,
            Some((_, Latch::Invalid)) => status |= MscStatus::INVADDR,
            Some((_, Latch::Writable)) => status |= MscStatus::WDATAREADY,
            None => {}
        }
        if self.stuck_busy || self.busy_remaining > 0 {
            status |= MscStatus::BUSY;
        }
        if self.erase_aborted {
            status |= MscStatus::ERASEABORTED;
        }
        status
    }

    /// Read a register
    pub fn read(&mut self, reg: u32) -> u32 {
        match reg {
            regs::STATUS => {
                self.status_reads += 1;
                let status = self.peek_status();
                self.busy_remaining = self.busy_remaining.saturating_sub(1);
                status.bits()
            }
            regs::WRITECTRL => self.writectrl,
            regs::ADDRB => self.addrb,
            regs::LOCK => u32::from(!self.unlocked),
            _ => 0,
        }
    }

    /// Write a register
    ///
    /// `classify` decides the latch result for an address. Returns the
    /// flash command to perform, if the write triggered one.
    pub fn write(
        &mut self,
        reg: u32,
        value: u32,
        classify: impl FnOnce(u32) -> Latch,
    ) -> Option<FlashCommand> {
        if reg == regs::LOCK {
            self.unlocked = value == regs::LOCK_KEY;
            return None;
        }

        if !self.unlocked {
            log::warn!("MSC locked, ignoring write of 0x{:08X} to 0x{:08X}", value, reg);
            return None;
        }

        match reg {
            regs::WRITECTRL => self.writectrl = value,
            regs::ADDRB => self.addrb = value,
            regs::WDATA => self.wdata = value,
            regs::WRITECMD => return self.command(WriteCmd::from_bits_retain(value), classify),
            _ => {}
        }
        None
    }

    fn command(
        &mut self,
        cmd: WriteCmd,
        classify: impl FnOnce(u32) -> Latch,
    ) -> Option<FlashCommand> {
        if cmd.contains(WriteCmd::LADDRIM) {
            self.latched = Some((self.addrb, classify(self.addrb)));
        }

        let (addr, latch) = self.latched?;
        if !cmd.intersects(WriteCmd::ERASEPAGE | WriteCmd::WRITEONCE) {
            return None;
        }
        if !self.write_enabled() {
            log::warn!("MSC command {:?} without WREN ignored", cmd);
            return None;
        }
        if latch != Latch::Writable {
            return None;
        }

        self.busy_remaining = self.busy_polls;
        if cmd.contains(WriteCmd::ERASEPAGE) {
            Some(FlashCommand::ErasePage(addr))
        } else {
            // The internal address advances after every word
            self.latched = Some((addr + 4, latch));
            Some(FlashCommand::WriteWord(addr, self.wdata))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writable(_: u32) -> Latch {
        Latch::Writable
    }

    fn unlock(msc: &mut MscModel) {
        msc.write(regs::LOCK, regs::LOCK_KEY, writable);
        msc.write(regs::WRITECTRL, WriteCtrl::WREN.bits(), writable);
    }

    #[test]
    fn test_locked_ignores_commands() {
        let mut msc = MscModel::new();
        assert!(msc.is_locked());

        msc.write(regs::WRITECTRL, 1, writable);
        assert!(!msc.write_enabled());
        msc.write(regs::ADDRB, 0x800, writable);
        assert_eq!(
            msc.write(regs::WRITECMD, WriteCmd::ERASEPAGE.bits(), writable),
            None
        );
    }

    #[test]
    fn test_erase_and_write() {
        let mut msc = MscModel::new();
        unlock(&mut msc);

        msc.write(regs::ADDRB, 0x800, writable);
        msc.write(regs::WRITECMD, WriteCmd::LADDRIM.bits(), writable);
        assert!(MscStatus::from_bits_retain(msc.read(regs::STATUS)).contains(MscStatus::WDATAREADY));
        assert_eq!(
            msc.write(regs::WRITECMD, WriteCmd::ERASEPAGE.bits(), writable),
            Some(FlashCommand::ErasePage(0x800))
        );

        msc.write(regs::WDATA, 0x1234_5678, writable);
        assert_eq!(
            msc.write(regs::WRITECMD, WriteCmd::WRITEONCE.bits(), writable),
            Some(FlashCommand::WriteWord(0x800, 0x1234_5678))
        );
        assert_eq!(
            msc.write(regs::WRITECMD, WriteCmd::WRITEONCE.bits(), writable),
            Some(FlashCommand::WriteWord(0x804, 0x1234_5678))
        );
    }

    #[test]
    fn test_latch_status() {
        let mut msc = MscModel::new();
        unlock(&mut msc);

        msc.write(regs::WRITECMD, WriteCmd::LADDRIM.bits(), |_| Latch::Locked);
        assert_eq!(msc.read(regs::STATUS), MscStatus::LOCKED.bits());
        assert_eq!(
            msc.write(regs::WRITECMD, WriteCmd::ERASEPAGE.bits(), writable),
            None
        );

        msc.write(regs::WRITECMD, WriteCmd::LADDRIM.bits(), |_| Latch::Invalid);
        assert_eq!(msc.read(regs::STATUS), MscStatus::INVADDR.bits());
    }

    #[test]
    fn test_busy_countdown() {
        let mut msc = MscModel::new();
        msc.busy_polls = 2;
        unlock(&mut msc);

        msc.write(regs::WRITECMD, WriteCmd::LADDRIM.bits(), writable);
        msc.write(regs::WRITECMD, WriteCmd::ERASEPAGE.bits(), writable);

        let busy = |v: u32| MscStatus::from_bits_retain(v).contains(MscStatus::BUSY);
        assert!(busy(msc.read(regs::STATUS)));
        assert!(busy(msc.read(regs::STATUS)));
        assert!(!busy(msc.read(regs::STATUS)));
        assert_eq!(msc.status_reads(), 3);
    }
}
