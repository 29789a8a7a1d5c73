use std::collections::VecDeque;
use std::io::{self, stdin, IsTerminal, Read, Write};
use std::thread;
use std::time::Duration;

use console::Term;
use crossbeam_channel as cbc;
use log::debug;

use crate::error::{Result, SimError};
use crate::term::{self, RawMode};

/// Character channel between the machine and the host.
///
/// Used by the memory-mapped keyboard registers and by the I/O trap routines.
pub trait Console {
    /// Whether a character can be read without blocking.
    fn poll(&mut self) -> Result<bool>;
    /// Read one character, blocking until one is available.
    fn read_byte(&mut self) -> Result<u8>;
    fn write_byte(&mut self, byte: u8) -> Result<()>;
    fn flush(&mut self) -> Result<()>;

    /// Fails with [`SimError::Interrupted`] if the user asked to stop the machine.
    ///
    /// Called periodically while instructions execute, so programs which never read input can
    /// still be stopped.
    fn check_interrupt(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_str(&mut self, string: &str) -> Result<()> {
        for byte in string.bytes() {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

/// Console with scripted input and captured output.
#[derive(Debug, Default, Clone)]
pub struct BufferedConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
    interrupted: bool,
}

impl BufferedConsole {
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: Vec::new(),
            interrupted: false,
        }
    }

    pub fn push_input(&mut self, input: impl AsRef<[u8]>) {
        self.input.extend(input.as_ref());
    }

    /// Stop the machine at its next interrupt check.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output decoded lossily, for assertions and display.
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Console for BufferedConsole {
    fn poll(&mut self) -> Result<bool> {
        Ok(!self.input.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.input.pop_front().ok_or_else(end_of_input)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.output.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn check_interrupt(&mut self) -> Result<()> {
        if std::mem::take(&mut self.interrupted) {
            return Err(SimError::Interrupted);
        }
        Ok(())
    }
}

/// Console attached to the process' standard streams.
///
/// If stdin is an interactive terminal, it is held in raw mode until this value is dropped, so
/// keystrokes are seen immediately and without echo. Otherwise stdin is read on a background
/// thread, so polling never waits on the pipe.
pub struct Terminal {
    out: Term,
    input: Input,
    /// Bytes of keys which have been typed but not read yet.
    pending: VecDeque<u8>,
}

enum Input {
    Raw { _guard: RawMode },
    Piped(PipedInput),
}

impl Terminal {
    pub fn new() -> Result<Self> {
        term::install_signal_handler();
        let input = if stdin().is_terminal() {
            Input::Raw {
                _guard: RawMode::enable()?,
            }
        } else {
            Input::Piped(PipedInput::spawn(stdin()))
        };
        Ok(Self {
            out: Term::stdout(),
            input,
            pending: VecDeque::new(),
        })
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.input, Input::Raw { .. })
    }

    fn buffer_char(&mut self, ch: char) {
        let mut bytes = [0u8; 4];
        self.pending
            .extend(ch.encode_utf8(&mut bytes).as_bytes().iter().copied());
    }
}

impl Console for Terminal {
    fn poll(&mut self) -> Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        match &mut self.input {
            Input::Raw { .. } => match term::poll_char()? {
                Some(ch) => {
                    self.buffer_char(ch);
                    Ok(true)
                }
                None => Ok(false),
            },
            Input::Piped(input) => {
                term::check_signal()?;
                match input.try_read() {
                    Some(byte) => {
                        self.pending.push_back(byte);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.pending.pop_front() {
            return Ok(byte);
        }
        match &mut self.input {
            Input::Raw { .. } => {
                let ch = term::read_char()?;
                self.buffer_char(ch);
                // `encode_utf8` always yields at least one byte
                Ok(self.pending.pop_front().unwrap_or(0))
            }
            Input::Piped(input) => loop {
                term::check_signal()?;
                if let Some(byte) = input.read_timeout(term::SIGNAL_CHECK_INTERVAL)? {
                    return Ok(byte);
                }
            },
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        let raw = self.is_raw();
        write_translated(&mut self.out, byte, raw)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn check_interrupt(&mut self) -> Result<()> {
        match self.input {
            // Keys typed meanwhile are kept for the program
            Input::Raw { .. } => {
                while let Some(ch) = term::poll_char()? {
                    self.buffer_char(ch);
                }
                Ok(())
            }
            Input::Piped(_) => term::check_signal(),
        }
    }
}

/// Raw mode disables output post-processing, so line feeds need an explicit carriage return.
fn write_translated(out: &mut impl Write, byte: u8, raw: bool) -> io::Result<()> {
    if byte == b'\n' && raw {
        out.write_all(b"\r")?;
    }
    out.write_all(&[byte])
}

/// Bytes from a reader, forwarded by a background thread.
///
/// The thread stops at end of input or on the first read error, disconnecting the channel.
pub struct PipedInput {
    rx: cbc::Receiver<u8>,
}

impl PipedInput {
    pub fn spawn<R: Read + Send + 'static>(mut reader: R) -> Self {
        let (tx, rx) = cbc::unbounded();
        thread::spawn(move || {
            let mut buf = [0; 1];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(buf[0]).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        debug!("stopped reading input: {err}");
                        break;
                    }
                }
            }
        });
        Self { rx }
    }

    #[cfg(test)]
    fn from_receiver(rx: cbc::Receiver<u8>) -> Self {
        Self { rx }
    }

    /// Next byte, if one has already arrived.
    pub fn try_read(&mut self) -> Option<u8> {
        self.rx.try_recv().ok()
    }

    /// Next byte, waiting at most `timeout` for one. End of input is an error.
    pub fn read_timeout(&mut self, timeout: Duration) -> Result<Option<u8>> {
        match self.rx.recv_timeout(timeout) {
            Ok(byte) => Ok(Some(byte)),
            Err(cbc::RecvTimeoutError::Timeout) => Ok(None),
            Err(cbc::RecvTimeoutError::Disconnected) => Err(end_of_input()),
        }
    }
}

fn end_of_input() -> SimError {
    SimError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "console input exhausted",
    ))
}
