use crate::error::{Result, SimError};
use crate::io::Console;
use crate::memory::MEMORY_MAX;
use crate::runtime::RunState;

/// Service routines reachable through the `TRAP` instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapVector {
    /// Read a character into R0, without echo.
    Getc = 0x20,
    /// Write the character in R0.
    Out = 0x21,
    /// Write the string of one character per word at R0.
    Puts = 0x22,
    /// Prompt for a character and echo it, storing it in R0.
    In = 0x23,
    /// Write the string of two characters per word at R0.
    Putsp = 0x24,
    Halt = 0x25,
}

impl TryFrom<u8> for TrapVector {
    type Error = u8;
    fn try_from(vector: u8) -> Result<Self, Self::Error> {
        Ok(match vector {
            0x20 => Self::Getc,
            0x21 => Self::Out,
            0x22 => Self::Puts,
            0x23 => Self::In,
            0x24 => Self::Putsp,
            0x25 => Self::Halt,
            _ => return Err(vector),
        })
    }
}

const IN_PROMPT: &str = "Enter a character: ";
const HALT_MESSAGE: &str = "HALT\n";

impl RunState {
    /// `addr` is the address of the `TRAP` instruction itself.
    pub(crate) fn trap(&mut self, instr: u16, addr: u16, io: &mut dyn Console) -> Result<()> {
        let vector = (instr & 0xFF) as u8;
        let vector = TrapVector::try_from(vector)
            .map_err(|vector| SimError::IllegalTrap { vector, addr })?;

        // Linkage, as a hardware trap would leave it
        let ret = self.regs.pc();
        self.regs.set(7, ret);

        match vector {
            TrapVector::Getc => {
                let ch = io.read_byte()?;
                self.regs.set(0, ch as u16);
            }
            TrapVector::Out => {
                let ch = (self.regs.get(0) & 0xFF) as u8;
                io.write_byte(ch)?;
                io.flush()?;
            }
            TrapVector::Puts => {
                let start = self.regs.get(0);
                for offset in 0..MEMORY_MAX {
                    let word = self.mem.get(start.wrapping_add(offset as u16));
                    if word == 0 {
                        break;
                    }
                    io.write_byte((word & 0xFF) as u8)?;
                }
                io.flush()?;
            }
            TrapVector::In => {
                io.write_str(IN_PROMPT)?;
                io.flush()?;
                let ch = io.read_byte()?;
                io.write_byte(ch)?;
                io.flush()?;
                self.regs.set(0, ch as u16);
            }
            TrapVector::Putsp => {
                let start = self.regs.get(0);
                'string: for offset in 0..MEMORY_MAX {
                    let word = self.mem.get(start.wrapping_add(offset as u16));
                    // Low byte first
                    for ch in [word & 0xFF, word >> 8] {
                        if ch == 0 {
                            break 'string;
                        }
                        io.write_byte(ch as u8)?;
                    }
                }
                io.flush()?;
            }
            TrapVector::Halt => {
                io.write_str(HALT_MESSAGE)?;
                io.flush()?;
                self.halt();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferedConsole;
    use crate::memory::Memory;
    use crate::registers::{Flag, PC_START};
    use crate::runtime::Status;

    fn state_with(program: &[u16]) -> RunState {
        let mut mem = Memory::new();
        mem.load(PC_START, program).unwrap();
        RunState::new(mem)
    }

    #[test]
    fn vectors() {
        assert_eq!(TrapVector::try_from(0x20u8), Ok(TrapVector::Getc));
        assert_eq!(TrapVector::try_from(0x25u8), Ok(TrapVector::Halt));
        assert_eq!(TrapVector::try_from(0x26u8), Err(0x26));
        assert_eq!(TrapVector::try_from(0x00u8), Err(0x00));
    }

    #[test]
    fn getc_no_echo() {
        let mut state = state_with(&[0xF020]);
        let mut io = BufferedConsole::new("z");
        state.step(&mut io).unwrap();
        assert_eq!(state.reg(0), b'z' as u16);
        assert_eq!(state.reg(7), 0x3001);
        assert!(io.output().is_empty());
        // Flags are left alone
        assert_eq!(state.flag(), Flag::Z);
    }

    #[test]
    fn out_low_byte() {
        let mut state = state_with(&[0xF021]);
        state.set_reg(0, 0x1241);
        let mut io = BufferedConsole::default();
        state.step(&mut io).unwrap();
        assert_eq!(io.output(), b"A");
    }

    #[test]
    fn puts_until_zero() {
        let mut state = state_with(&[0xF022]);
        let mut mem_text: Vec<u16> = b"Hello".iter().map(|&ch| ch as u16).collect();
        mem_text.push(0);
        mem_text.push(b'X' as u16);
        state.memory_mut().load(0x4000, &mem_text).unwrap();
        state.set_reg(0, 0x4000);
        let mut io = BufferedConsole::default();
        state.step(&mut io).unwrap();
        assert_eq!(io.output_string(), "Hello");
    }

    #[test]
    fn in_prompts_and_echoes() {
        let mut state = state_with(&[0xF023]);
        let mut io = BufferedConsole::new("7");
        state.step(&mut io).unwrap();
        assert_eq!(io.output_string(), "Enter a character: 7");
        assert_eq!(state.reg(0), b'7' as u16);
    }

    #[test]
    fn putsp_two_per_word() {
        let mut state = state_with(&[0xF024]);
        // "Hey" -> 'e''H', '\0''y'
        state.memory_mut().load(0x4000, &[0x6548, 0x0079, 0x4141]).unwrap();
        state.set_reg(0, 0x4000);
        let mut io = BufferedConsole::default();
        state.step(&mut io).unwrap();
        assert_eq!(io.output_string(), "Hey");
    }

    #[test]
    fn halt_stops_machine() {
        let mut state = state_with(&[0xF025]);
        let mut io = BufferedConsole::default();
        assert_eq!(state.step(&mut io).unwrap(), Status::Halted);
        assert_eq!(io.output_string(), "HALT\n");
    }

    #[test]
    fn unknown_vector() {
        let mut state = state_with(&[0x1021, 0xF0FF]);
        let mut io = BufferedConsole::default();
        let err = state.run(&mut io).unwrap_err();
        assert!(matches!(
            err,
            SimError::IllegalTrap {
                vector: 0xFF,
                addr: 0x3001
            }
        ));
        assert_eq!(state.status(), Status::Running);
        assert_eq!(state.reg(7), 0);
    }

    #[test]
    fn getc_without_input_fails() {
        let mut state = state_with(&[0xF020]);
        let mut io = BufferedConsole::default();
        assert!(matches!(state.step(&mut io), Err(SimError::Io(_))));
    }
}
