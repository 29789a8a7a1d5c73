use std::path::Path;

use log::{debug, trace};

use crate::error::{Result, SimError};
use crate::image;
use crate::io::Console;
use crate::memory::Memory;
use crate::registers::{s_ext, Flag, Registers};

/// Instructions executed between checks for a user interrupt.
const INTERRUPT_CHECK_INTERVAL: u64 = 0x1000;

/// Whether the machine will execute another instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Running,
    Halted,
}

/// Instruction kind, selected by the top 4 bits of an instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Br,
    Add,
    Ld,
    St,
    Jsr,
    And,
    Ldr,
    Str,
    Rti,
    Not,
    Ldi,
    Sti,
    Jmp,
    Reserved,
    Lea,
    Trap,
}

impl Opcode {
    const TABLE: [Opcode; 16] = [
        Opcode::Br,       // 0x0
        Opcode::Add,      // 0x1
        Opcode::Ld,       // 0x2
        Opcode::St,       // 0x3
        Opcode::Jsr,      // 0x4
        Opcode::And,      // 0x5
        Opcode::Ldr,      // 0x6
        Opcode::Str,      // 0x7
        Opcode::Rti,      // 0x8
        Opcode::Not,      // 0x9
        Opcode::Ldi,      // 0xA
        Opcode::Sti,      // 0xB
        Opcode::Jmp,      // 0xC
        Opcode::Reserved, // 0xD
        Opcode::Lea,      // 0xE
        Opcode::Trap,     // 0xF
    ];

    #[inline]
    pub fn decode(instr: u16) -> Self {
        Self::TABLE[(instr >> 12) as usize]
    }
}

/// Represents complete program state during runtime.
pub struct RunState {
    pub(crate) mem: Memory,
    pub(crate) regs: Registers,
    status: Status,
}

impl RunState {
    /// Registers are cleared and PC is set to the start address.
    pub fn new(mem: Memory) -> Self {
        Self {
            mem,
            regs: Registers::new(),
            status: Status::Running,
        }
    }

    /// Load every image, in order, into otherwise empty memory.
    pub fn from_images<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut mem = Memory::new();
        image::load_all(paths, &mut mem)?;
        Ok(Self::new(mem))
    }

    /// Run until the program halts, returning the amount of instructions executed.
    ///
    /// Execution stops at the first fault, leaving state as the faulting instruction found it.
    pub fn run(&mut self, io: &mut dyn Console) -> Result<u64> {
        debug!("starting execution at 0x{:04x}", self.regs.pc());
        let mut count: u64 = 0;
        while self.status == Status::Running {
            if count % INTERRUPT_CHECK_INTERVAL == 0 {
                io.check_interrupt()?;
            }
            self.step(io)?;
            count += 1;
        }
        io.flush()?;
        debug!("halted after {} instructions", count);
        Ok(count)
    }

    /// Fetch, decode, and execute a single instruction.
    pub fn step(&mut self, io: &mut dyn Console) -> Result<Status> {
        if self.status == Status::Halted {
            return Ok(Status::Halted);
        }

        let addr = self.regs.pc();
        let instr = self.mem.read(addr, io)?;
        // PC incremented before instruction is performed
        self.regs.advance_pc();

        let opcode = Opcode::decode(instr);
        trace!("0x{addr:04x}: 0x{instr:04x} {opcode:?}");

        match opcode {
            Opcode::Br => self.br(instr),
            Opcode::Add => self.add(instr),
            Opcode::Ld => self.ld(instr, io)?,
            Opcode::St => self.st(instr),
            Opcode::Jsr => self.jsr(instr),
            Opcode::And => self.and(instr),
            Opcode::Ldr => self.ldr(instr, io)?,
            Opcode::Str => self.str(instr),
            Opcode::Not => self.not(instr),
            Opcode::Ldi => self.ldi(instr, io)?,
            Opcode::Sti => self.sti(instr, io)?,
            Opcode::Jmp => self.jmp(instr),
            Opcode::Lea => self.lea(instr),
            Opcode::Trap => self.trap(instr, addr, io)?,
            Opcode::Rti | Opcode::Reserved => {
                return Err(SimError::IllegalOpcode {
                    opcode: instr >> 12,
                    instr,
                    addr,
                })
            }
        }
        Ok(self.status)
    }

    pub(crate) fn halt(&mut self) {
        self.status = Status::Halted;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn pc(&self) -> u16 {
        self.regs.pc()
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.regs.set_pc(pc);
    }

    pub fn reg(&self, reg: u16) -> u16 {
        self.regs.get(reg)
    }

    pub fn set_reg(&mut self, reg: u16, val: u16) {
        self.regs.set(reg, val);
    }

    pub fn flag(&self) -> Flag {
        self.regs.flag()
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Second operand of `ADD` and `AND`: register, or immediate if bit 5 is set.
    #[inline]
    fn operand(&self, instr: u16) -> u16 {
        if instr & 0b100000 == 0 {
            self.regs.get(instr & 0b111)
        } else {
            s_ext(instr, 5)
        }
    }

    fn add(&mut self, instr: u16) {
        let dr = (instr >> 9) & 0b111;
        let sr = (instr >> 6) & 0b111;
        let res = self.regs.get(sr).wrapping_add(self.operand(instr));
        self.regs.set_with_flags(dr, res);
    }

    fn and(&mut self, instr: u16) {
        let dr = (instr >> 9) & 0b111;
        let sr = (instr >> 6) & 0b111;
        let res = self.regs.get(sr) & self.operand(instr);
        self.regs.set_with_flags(dr, res);
    }

    fn not(&mut self, instr: u16) {
        let dr = (instr >> 9) & 0b111;
        let sr = (instr >> 6) & 0b111;
        let val = !self.regs.get(sr);
        self.regs.set_with_flags(dr, val);
    }

    fn br(&mut self, instr: u16) {
        let mask = (instr >> 9) & 0b111;
        if self.regs.flag().matches(mask) {
            let target = self.regs.pc_relative(instr, 9);
            self.regs.set_pc(target);
        }
    }

    fn jmp(&mut self, instr: u16) {
        let br = (instr >> 6) & 0b111;
        let target = self.regs.get(br);
        self.regs.set_pc(target);
    }

    fn jsr(&mut self, instr: u16) {
        // Target is read before R7 is written, so `JSRR R7` jumps to the old R7
        let target = if instr & 0x800 == 0 {
            // reg
            self.regs.get((instr >> 6) & 0b111)
        } else {
            // offs
            self.regs.pc_relative(instr, 11)
        };
        let ret = self.regs.pc();
        self.regs.set(7, ret);
        self.regs.set_pc(target);
    }

    fn ld(&mut self, instr: u16, io: &mut dyn Console) -> Result<()> {
        let dr = (instr >> 9) & 0b111;
        let val = self.mem.read(self.regs.pc_relative(instr, 9), io)?;
        self.regs.set_with_flags(dr, val);
        Ok(())
    }

    fn ldi(&mut self, instr: u16, io: &mut dyn Console) -> Result<()> {
        let dr = (instr >> 9) & 0b111;
        let ptr = self.mem.read(self.regs.pc_relative(instr, 9), io)?;
        let val = self.mem.read(ptr, io)?;
        self.regs.set_with_flags(dr, val);
        Ok(())
    }

    fn ldr(&mut self, instr: u16, io: &mut dyn Console) -> Result<()> {
        let dr = (instr >> 9) & 0b111;
        let br = (instr >> 6) & 0b111;
        let addr = self.regs.get(br).wrapping_add(s_ext(instr, 6));
        let val = self.mem.read(addr, io)?;
        self.regs.set_with_flags(dr, val);
        Ok(())
    }

    fn lea(&mut self, instr: u16) {
        let dr = (instr >> 9) & 0b111;
        let val = self.regs.pc_relative(instr, 9);
        self.regs.set_with_flags(dr, val);
    }

    fn st(&mut self, instr: u16) {
        let sr = (instr >> 9) & 0b111;
        let val = self.regs.get(sr);
        self.mem.write(self.regs.pc_relative(instr, 9), val);
    }

    fn sti(&mut self, instr: u16, io: &mut dyn Console) -> Result<()> {
        let sr = (instr >> 9) & 0b111;
        let val = self.regs.get(sr);
        let ptr = self.mem.read(self.regs.pc_relative(instr, 9), io)?;
        self.mem.write(ptr, val);
        Ok(())
    }

    fn str(&mut self, instr: u16) {
        let sr = (instr >> 9) & 0b111;
        let br = (instr >> 6) & 0b111;
        let val = self.regs.get(sr);
        let addr = self.regs.get(br).wrapping_add(s_ext(instr, 6));
        self.mem.write(addr, val);
    }
}
