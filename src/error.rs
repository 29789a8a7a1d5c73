use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T, E = SimError> = std::result::Result<T, E>;

/// Every way a simulation can fail to start or stop running.
#[derive(Debug, Error, Diagnostic)]
pub enum SimError {
    // Host errors
    #[error("No program image was provided.")]
    #[diagnostic(
        code(usage::no_image),
        help("pass one or more `.obj` image files, eg. `lc3sim program.obj`")
    )]
    Usage,

    // Image loader errors
    #[error("Image file `{}` does not exist.", path.display())]
    #[diagnostic(code(image::missing), help("check the path to the image file"))]
    ImageMissing { path: PathBuf },

    #[error("Image file `{}` could not be read: {source}", path.display())]
    #[diagnostic(code(image::unreadable))]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Image is not aligned to 16 bits ({len} bytes).")]
    #[diagnostic(
        code(image::odd_length),
        help("images are a sequence of big-endian 16-bit words")
    )]
    ImageOddLength { len: usize },

    #[error("Image does not contain an origin address.")]
    #[diagnostic(
        code(image::empty),
        help("the first word of an image must be its load address")
    )]
    ImageEmpty,

    #[error("Image of {words} words cannot fit in memory from origin 0x{orig:04x}.")]
    #[diagnostic(
        code(image::too_large),
        help("the last word of an image must be at or below 0xFFFF")
    )]
    ImageTooLarge { orig: u16, words: usize },

    // Runtime errors
    #[error("Illegal opcode 0b{opcode:04b} (instruction 0x{instr:04x}) at address 0x{addr:04x}.")]
    #[diagnostic(
        code(runtime::illegal_opcode),
        help("`RTI` and the reserved opcode 0b1101 are not supported")
    )]
    IllegalOpcode { opcode: u16, instr: u16, addr: u16 },

    #[error("Unknown trap vector 0x{vector:02x} at address 0x{addr:04x}.")]
    #[diagnostic(
        code(runtime::illegal_trap),
        help("supported vectors are GETC, OUT, PUTS, IN, PUTSP and HALT (0x20 to 0x25)")
    )]
    IllegalTrap { vector: u8, addr: u16 },

    #[error("Console error: {0}")]
    #[diagnostic(code(io::console))]
    Io(#[from] io::Error),

    #[error("Execution interrupted.")]
    #[diagnostic(code(io::interrupted))]
    Interrupted,
}

impl SimError {
    /// Whether the error was raised while instructions were executing.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            Self::IllegalOpcode { .. } | Self::IllegalTrap { .. } | Self::Io(_) | Self::Interrupted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_fault() {
        let err = SimError::IllegalOpcode {
            opcode: 0b1101,
            instr: 0xD000,
            addr: 0x3000,
        };
        assert_eq!(
            err.to_string(),
            "Illegal opcode 0b1101 (instruction 0xd000) at address 0x3000."
        );
        assert!(err.is_runtime());

        let err = SimError::IllegalTrap {
            vector: 0x7F,
            addr: 0x3004,
        };
        assert_eq!(
            err.to_string(),
            "Unknown trap vector 0x7f at address 0x3004."
        );
        assert!(!SimError::ImageEmpty.is_runtime());
    }
}
