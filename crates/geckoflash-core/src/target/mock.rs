//! Recording target for unit tests

use super::{AlgorithmResult, DebugTarget, RegisterBindings, WorkingArea};
use crate::error::{Error, Result};
use crate::msc::regs;
use std::collections::{BTreeMap, VecDeque};

/// Word-addressed register file that records every access
///
/// `STATUS` reads come from `status_sequence` first, then `status`.
/// `WRITECMD` always reads as zero. Working area requests are answered
/// from `alloc_results`, then with `ResourceUnavailable`.
pub struct MockTarget {
    pub words: BTreeMap<u32, u32>,
    pub status: u32,
    pub status_sequence: VecDeque<u32>,
    pub status_reads: usize,
    pub writes: Vec<(u32, u32)>,
    pub accesses: usize,
    pub delayed_us: u32,
    pub halted: bool,
    pub alloc_requests: Vec<u32>,
    pub alloc_results: VecDeque<Result<WorkingArea>>,
    pub freed: Vec<WorkingArea>,
}

impl MockTarget {
    pub fn new() -> Self {
        Self {
            words: BTreeMap::new(),
            status: 0,
            status_sequence: VecDeque::new(),
            status_reads: 0,
            writes: Vec::new(),
            accesses: 0,
            delayed_us: 0,
            halted: true,
            alloc_requests: Vec::new(),
            alloc_results: VecDeque::new(),
            freed: Vec::new(),
        }
    }

    pub fn word(&self, addr: u32) -> u32 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    pub fn set_u8(&mut self, addr: u32, value: u8) {
        let shift = (addr & 3) * 8;
        let word = self.words.entry(addr & !3).or_insert(0);
        *word = (*word & !(0xFF << shift)) | ((value as u32) << shift);
    }

    pub fn set_u16(&mut self, addr: u32, value: u16) {
        self.set_u8(addr, value as u8);
        self.set_u8(addr + 1, (value >> 8) as u8);
    }
}

impl DebugTarget for MockTarget {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        let word = self.read_u32(addr & !3)?;
        Ok((word >> ((addr & 3) * 8)) as u8)
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        let lo = self.read_u8(addr)? as u16;
        let hi = self.read_u8(addr + 1)? as u16;
        Ok(lo | (hi << 8))
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        self.accesses += 1;
        match addr {
            regs::STATUS => {
                self.status_reads += 1;
                Ok(self.status_sequence.pop_front().unwrap_or(self.status))
            }
            regs::WRITECMD => Ok(0),
            _ => Ok(self.word(addr)),
        }
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.accesses += 1;
        self.writes.push((addr, value));
        if addr != regs::WRITECMD {
            self.words.insert(addr, value);
        }
        Ok(())
    }

    fn read_memory(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_u8(addr + i as u32)?;
        }
        Ok(())
    }

    fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.accesses += 1;
        for (i, &byte) in data.iter().enumerate() {
            self.set_u8(addr + i as u32, byte);
        }
        Ok(())
    }

    fn is_halted(&mut self) -> Result<bool> {
        self.accesses += 1;
        Ok(self.halted)
    }

    fn alloc_working_area(&mut self, size: u32) -> Result<WorkingArea> {
        self.accesses += 1;
        self.alloc_requests.push(size);
        self.alloc_results
            .pop_front()
            .unwrap_or(Err(Error::ResourceUnavailable))
    }

    fn free_working_area(&mut self, area: WorkingArea) -> Result<()> {
        self.freed.push(area);
        Ok(())
    }

    fn run_async_algorithm(
        &mut self,
        _code: &WorkingArea,
        _ring: &WorkingArea,
        _data: &[u8],
        _block_size: u32,
        _registers: RegisterBindings,
    ) -> Result<AlgorithmResult> {
        Err(Error::ResourceUnavailable)
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += us;
    }
}
