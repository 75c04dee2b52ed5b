//! Software model of the flash write program
//!
//! Instead of emulating Thumb instructions, the model follows the
//! program's register contract step by step against the simulated MSC,
//! interleaved with the host side of the ring buffer protocol.

use crate::target::DummyTarget;
use geckoflash_core::algorithm::{RingBuffer, FLASH_WRITE_PROGRAM};
use geckoflash_core::msc::regs::{self, MscStatus, WriteCmd, WriteCtrl};
use geckoflash_core::target::{AlgorithmExit, AlgorithmResult, RegisterBindings, WorkingArea};
use geckoflash_core::{Error, Result};

/// Status reads before a stuck controller is reported
const SPIN_LIMIT: u32 = 100_000;

enum Step {
    /// Ring empty, nothing done
    Idle,
    /// One word committed
    Wrote,
    /// Program hit its breakpoint
    Exited,
}

struct Program {
    regs: RegisterBindings,
    /// Mirrors r6: the last value loaded by the program
    r6: u32,
}

impl Program {
    fn prologue(&mut self, target: &mut DummyTarget) {
        target.msc_write(regs::LOCK, regs::LOCK_KEY);
        target.msc_write(regs::WRITECTRL, WriteCtrl::WREN.bits());
    }

    fn exit(&mut self) -> Step {
        self.regs.r0 = self.r6;
        Step::Exited
    }

    fn status(&mut self, target: &mut DummyTarget) -> MscStatus {
        self.r6 = target.msc.read(regs::STATUS);
        MscStatus::from_bits_retain(self.r6)
    }

    fn spin(
        &mut self,
        target: &mut DummyTarget,
        done: impl Fn(MscStatus) -> bool,
    ) -> Result<()> {
        for _ in 0..SPIN_LIMIT {
            if done(self.status(target)) {
                return Ok(());
            }
        }
        log::error!("write program stuck, MSC status 0x{:08X}", self.r6);
        Err(Error::Timeout { status: self.r6 })
    }

    fn step(&mut self, target: &mut DummyTarget) -> Result<Step> {
        let ring = self.regs.r2;

        self.r6 = target.ram_u32(ring)?;
        if self.r6 == 0 {
            return Ok(self.exit());
        }
        let rp = target.ram_u32(ring + 4)?;
        if rp == self.r6 {
            return Ok(Step::Idle);
        }

        target.msc_write(regs::ADDRB, self.regs.r4);
        target.msc_write(regs::WRITECMD, WriteCmd::LADDRIM.bits());
        if self
            .status(target)
            .intersects(MscStatus::LOCKED | MscStatus::INVADDR)
        {
            target.set_ram_u32(ring + 4, 0)?;
            return Ok(self.exit());
        }

        self.spin(target, |s| s.contains(MscStatus::WDATAREADY))?;
        let word = target.ram_u32(rp)?;
        target.msc_write(regs::WDATA, word);
        target.msc_write(regs::WRITECMD, WriteCmd::WRITEONCE.bits());
        let mut rp = rp + 4;
        self.regs.r4 += 4;
        self.spin(target, |s| !s.contains(MscStatus::BUSY))?;

        if rp >= self.regs.r3 {
            rp = ring + 8;
        }
        target.set_ram_u32(ring + 4, rp)?;

        self.regs.r1 = self.regs.r1.wrapping_sub(1);
        if self.regs.r1 == 0 {
            return Ok(self.exit());
        }
        Ok(Step::Wrote)
    }
}

/// Copy as much of `remaining` into the ring as fits and publish it
///
/// Returns the number of bytes published.
fn publish(
    target: &mut DummyTarget,
    buffer: &RingBuffer,
    remaining: &[u8],
    block_size: u32,
) -> Result<usize> {
    let wp = target.ram_u32(buffer.write_ptr_addr())?;
    let rp = target.ram_u32(buffer.read_ptr_addr())?;
    if rp == 0 {
        return Ok(0);
    }
    if !buffer.contains(rp) || !buffer.contains(wp) {
        log::error!("ring pointers out of range: wp 0x{:08X} rp 0x{:08X}", wp, rp);
        return Err(Error::TargetAccess {
            addr: buffer.read_ptr_addr(),
        });
    }

    let room = buffer.contiguous_writable(wp, rp, block_size) / block_size * block_size;
    let count = room.min(remaining.len() as u32);
    if count == 0 {
        return Ok(0);
    }

    // Data first, then the pointer that makes it visible
    target.write_ram(wp, &remaining[..count as usize])?;
    let next = buffer.advance(wp, count);
    target.set_ram_u32(buffer.write_ptr_addr(), next)?;

    let fill = buffer.readable(next, rp);
    target.stats.ring_high_water = target.stats.ring_high_water.max(fill);
    Ok(count as usize)
}

/// Run the write program in `code`, streaming `data` through `ring`
pub(crate) fn run(
    target: &mut DummyTarget,
    code: &WorkingArea,
    ring: &WorkingArea,
    data: &[u8],
    block_size: u32,
    registers: RegisterBindings,
) -> Result<AlgorithmResult> {
    let mut uploaded = vec![0u8; FLASH_WRITE_PROGRAM.len()];
    if target.read_bytes(code.address, &mut uploaded).is_err() || uploaded != FLASH_WRITE_PROGRAM {
        log::error!("no write program at 0x{:08X}", code.address);
        return Err(Error::TargetAccess { addr: code.address });
    }
    if registers.r0 != regs::MSC_BASE || registers.r2 != ring.address || registers.r3 != ring.end() {
        log::error!("write program registers do not match the ring: {:?}", registers);
        return Err(Error::TargetAccess { addr: registers.r0 });
    }
    if block_size == 0 || data.len() % block_size as usize != 0 {
        return Err(Error::InvalidAlignment {
            offset: data.len() as u32,
        });
    }

    target.stats.algorithm_runs += 1;
    let buffer = RingBuffer::new(ring);
    let mut program = Program {
        regs: registers,
        r6: 0,
    };
    program.prologue(target);

    let mut sent = 0;
    loop {
        let published = if sent < data.len() {
            publish(target, &buffer, &data[sent..], block_size)?
        } else {
            0
        };
        sent += published;

        match program.step(target)? {
            Step::Wrote => {}
            Step::Exited => break,
            Step::Idle if published == 0 => {
                log::error!("write program starved with {} bytes unsent", data.len() - sent);
                return Err(Error::Timeout { status: program.r6 });
            }
            Step::Idle => {}
        }
    }

    let rp = target.ram_u32(buffer.read_ptr_addr())?;
    let exit = if rp == 0 {
        AlgorithmExit::OperationFailed
    } else {
        AlgorithmExit::Completed
    };

    Ok(AlgorithmResult {
        exit,
        registers: program.regs,
    })
}
