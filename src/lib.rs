// Machine state
mod memory;
pub use memory::{Memory, KBDR, KBSR, MEMORY_MAX};
mod registers;
pub use registers::{s_ext, Flag, Registers, PC_START};

// Execution
mod runtime;
pub use runtime::{Opcode, RunState, Status};
mod trap;
pub use trap::TrapVector;

// Host interface
pub mod image;
pub mod io;
mod term;

mod error;
pub use error::{Result, SimError};

pub mod env;
pub mod output;
