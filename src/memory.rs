use crate::error::{Result, SimError};
use crate::io::Console;

/// LC3 can address 128KB of memory.
pub const MEMORY_MAX: usize = 0x10000;

/// Keyboard status register. Bit 15 is set when a character is ready.
pub const KBSR: u16 = 0xFE00;
/// Keyboard data register. Low byte holds the last character typed.
pub const KBDR: u16 = 0xFE02;

/// Flat word-addressed memory, with the keyboard registers mapped onto the console.
pub struct Memory {
    /// System memory - 128KB in size.
    mem: Box<[u16]>,
    /// Character taken from the console by a status read, waiting for a data read.
    latched: Option<u8>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            mem: vec![0; MEMORY_MAX].into_boxed_slice(),
            latched: None,
        }
    }

    /// Read a word, performing device I/O for the keyboard registers.
    pub fn read(&mut self, addr: u16, io: &mut dyn Console) -> Result<u16> {
        match addr {
            KBSR => {
                if self.latched.is_none() && io.poll()? {
                    self.latched = Some(io.read_byte()?);
                }
                Ok(if self.latched.is_some() { 0x8000 } else { 0 })
            }
            KBDR => {
                let ch = match self.latched.take() {
                    Some(ch) => ch,
                    None => io.read_byte()?,
                };
                Ok(ch as u16)
            }
            _ => Ok(self.get(addr)),
        }
    }

    /// Store a word. Writes to the keyboard registers are ignored.
    pub fn write(&mut self, addr: u16, val: u16) {
        if matches!(addr, KBSR | KBDR) {
            return;
        }
        self.set(addr, val);
    }

    /// Read a word without any device side effects.
    #[inline]
    pub fn get(&self, addr: u16) -> u16 {
        self.mem[addr as usize]
    }

    /// Store a word directly, bypassing device mapping.
    #[inline]
    pub fn set(&mut self, addr: u16, val: u16) {
        self.mem[addr as usize] = val;
    }

    /// Copy `words` into memory, starting at `orig`.
    ///
    /// Nothing is written if the words would run past the end of memory.
    pub fn load(&mut self, orig: u16, words: &[u16]) -> Result<()> {
        let start = orig as usize;
        let end = start + words.len();
        if end > MEMORY_MAX {
            return Err(SimError::ImageTooLarge {
                orig,
                words: words.len(),
            });
        }
        self.mem[start..end].copy_from_slice(words);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferedConsole;

    #[test]
    fn whole_address_space() {
        let mut mem = Memory::new();
        let mut io = BufferedConsole::default();
        mem.write(0xFFFF, 0x1234);
        mem.write(0x0000, 0x5678);
        assert_eq!(mem.read(0xFFFF, &mut io).unwrap(), 0x1234);
        assert_eq!(mem.read(0x0000, &mut io).unwrap(), 0x5678);
    }

    #[test]
    fn keyboard_status_without_input() {
        let mut mem = Memory::new();
        let mut io = BufferedConsole::default();
        assert_eq!(mem.read(KBSR, &mut io).unwrap(), 0);
    }

    #[test]
    fn keyboard_status_then_data() {
        let mut mem = Memory::new();
        let mut io = BufferedConsole::new("xy");
        assert_eq!(mem.read(KBSR, &mut io).unwrap(), 0x8000);
        // Status stays set until the data register is read
        assert_eq!(mem.read(KBSR, &mut io).unwrap(), 0x8000);
        assert_eq!(mem.read(KBDR, &mut io).unwrap(), b'x' as u16);
        assert_eq!(mem.read(KBSR, &mut io).unwrap(), 0x8000);
        assert_eq!(mem.read(KBDR, &mut io).unwrap(), b'y' as u16);
        assert_eq!(mem.read(KBSR, &mut io).unwrap(), 0);
    }

    #[test]
    fn keyboard_data_reads_directly() {
        let mut mem = Memory::new();
        let mut io = BufferedConsole::new("q");
        assert_eq!(mem.read(KBDR, &mut io).unwrap(), b'q' as u16);
        assert!(mem.read(KBDR, &mut io).is_err());
    }

    #[test]
    fn device_writes_ignored() {
        let mut mem = Memory::new();
        let mut io = BufferedConsole::default();
        mem.write(KBSR, 0xFFFF);
        mem.write(KBDR, 0x0041);
        assert_eq!(mem.get(KBSR), 0);
        assert_eq!(mem.read(KBSR, &mut io).unwrap(), 0);
    }

    #[test]
    fn load_at_origin() {
        let mut mem = Memory::new();
        mem.load(0xFFFE, &[1, 2]).unwrap();
        assert_eq!(mem.get(0xFFFE), 1);
        assert_eq!(mem.get(0xFFFF), 2);
    }

    #[test]
    fn load_past_end_rejected() {
        let mut mem = Memory::new();
        assert!(matches!(
            mem.load(0xFFFF, &[1, 2]),
            Err(SimError::ImageTooLarge {
                orig: 0xFFFF,
                words: 2
            })
        ));
        assert_eq!(mem.get(0xFFFF), 0);
    }
}
