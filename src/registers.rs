use std::cmp::Ordering;
use std::fmt;

/// Address the program counter is reset to before every run.
pub const PC_START: u16 = 0x3000;

/// Condition code, set using the result of the previous flag-updating instruction.
///
/// Discriminants match the `nzp` bit layout of `BR` instructions, so a branch mask can be
/// tested against the current flag directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    N = 0b100,
    Z = 0b010,
    P = 0b001,
}

impl Flag {
    /// Derive the condition code for a value, interpreted as two's complement.
    pub fn from_value(val: u16) -> Self {
        match (val as i16).cmp(&0) {
            Ordering::Less => Flag::N,
            Ordering::Equal => Flag::Z,
            Ordering::Greater => Flag::P,
        }
    }

    /// Whether any bit of a 3-bit `nzp` mask matches this flag.
    pub fn matches(self, mask: u16) -> bool {
        self as u16 & mask != 0
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flag::N => "n",
            Flag::Z => "z",
            Flag::P => "p",
        };
        write!(f, "{}", name)
    }
}

/// Sign-extend the lowest `bits` bits of `val` to a full 16-bit word.
///
/// Bits above `bits` in the input are ignored.
#[inline]
pub fn s_ext(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits <= 16);
    if bits >= 16 {
        return val;
    }
    // Sign bit
    let sign = val & (1u16 << (bits - 1));
    // Bits lower than sign bit
    let magnitude = val & ((1u16 << bits) - 1);
    // Positive input: all bits unset; 0x0000
    // Negative input: sign bit and above will be set, lower bits will be reset
    //      Eg. bits=14 -> 0xE000
    let sign_extension = (!sign).wrapping_add(1); // sign * -1
    magnitude | sign_extension
}

/// 8 general purpose registers, program counter, and condition code.
#[derive(Clone, Debug)]
pub struct Registers {
    /// 8x 16-bit registers
    reg: [u16; 8],
    /// Program counter
    pc: u16,
    /// Condition code
    flag: Flag,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Self {
            reg: [0; 8],
            pc: PC_START,
            flag: Flag::Z,
        }
    }

    /// Only the lowest 3 bits of `index` are used.
    #[inline]
    pub fn get(&self, index: u16) -> u16 {
        self.reg[(index & 0b111) as usize]
    }

    #[inline]
    pub fn set(&mut self, index: u16, val: u16) {
        self.reg[(index & 0b111) as usize] = val;
    }

    /// Write a destination register and update the condition code from it.
    #[inline]
    pub fn set_with_flags(&mut self, index: u16, val: u16) {
        self.set(index, val);
        self.set_flags(val);
    }

    #[inline]
    pub fn set_flags(&mut self, val: u16) {
        self.flag = Flag::from_value(val);
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Move PC forward by one word, returning the address it pointed to.
    #[inline]
    pub fn advance_pc(&mut self) -> u16 {
        let addr = self.pc;
        self.pc = self.pc.wrapping_add(1);
        addr
    }

    /// Address relative to the (already incremented) program counter.
    #[inline]
    pub fn pc_relative(&self, instr: u16, bits: u32) -> u16 {
        self.pc.wrapping_add(s_ext(instr, bits))
    }
}
