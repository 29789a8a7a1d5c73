use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::Path;

use colored::Colorize;

use crate::runtime::RunState;

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Suppress status messages. Returns the previous value.
pub fn set_minimal(new_value: bool) -> bool {
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

/// Print a right-aligned status line, eg. `     Running target hello.obj`.
///
/// Status lines go to stderr, leaving stdout to the program being run.
pub fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    if is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    eprintln!("{left:>12} {right}");
}

pub fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, right.as_str());
}

/// Register dump, one register per line.
pub fn format_registers(state: &RunState) -> String {
    let mut out = String::new();
    for i in 0..8 {
        let value = state.reg(i);
        let _ = writeln!(out, "R{}  0x{:04x}  {:-6}", i, value, value as i16);
    }
    let _ = writeln!(out, "PC  0x{:04x}", state.pc());
    let _ = writeln!(out, "CC  {}", state.flag());
    out
}

pub fn print_registers(state: &RunState) {
    if is_minimal() {
        return;
    }
    eprint!("{}", format_registers(state).as_str().dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    #[test]
    fn registers_dump() {
        let mut state = RunState::new(Memory::new());
        state.set_reg(1, 0xFFFF);
        let dump = format_registers(&state);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[1], "R1  0xffff      -1");
        assert_eq!(lines[8], "PC  0x3000");
        assert_eq!(lines[9], "CC  z");
    }

    #[test]
    fn minimal_toggle() {
        assert!(!set_minimal(true));
        assert!(is_minimal());
        assert!(set_minimal(false));
    }
}
