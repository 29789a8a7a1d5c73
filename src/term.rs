use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEvent},
    terminal,
};
use log::{debug, warn};

use crate::error::{Result, SimError};

/// Similar to [`crossterm::event::KeyCode`] but only contains keys the machine can receive.
#[derive(Debug, PartialEq)]
pub enum Key {
    Enter,
    Backspace,
    Tab,
    Escape,
    Char(char),
    /// `Ctrl+C`
    Interrupt,
}

/// Keeps the terminal in raw mode for as long as it is alive.
///
/// Line buffering and local echo are disabled, so key presses are delivered one at a time.
/// Dropping the guard restores the previous mode, including while unwinding from a panic.
#[derive(Debug)]
pub struct RawMode {
    _private: (),
}

impl RawMode {
    /// Must only be held once at a time.
    pub fn enable() -> io::Result<Self> {
        debug_assert!(
            !terminal::is_raw_mode_enabled().is_ok_and(|is| is),
            "terminal should not be in raw mode to enable raw mode",
        );
        terminal::enable_raw_mode()?;
        debug!("terminal raw mode enabled");
        Ok(Self { _private: () })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        // Nothing useful can be done if this fails
        let _ = terminal::disable_raw_mode();
        debug!("terminal raw mode disabled");
    }
}

/// How long blocking reads wait before checking for a termination signal.
pub(crate) const SIGNAL_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Set from the signal handler, taken by [`check_signal`].
static SIGNALLED: AtomicBool = AtomicBool::new(false);

/// Record `SIGINT` and `SIGTERM` instead of exiting, so the run loop can stop and restore the
/// terminal.
///
/// Later calls are no-ops.
pub fn install_signal_handler() {
    match ctrlc::set_handler(|| SIGNALLED.store(true, Ordering::SeqCst)) {
        Ok(()) | Err(ctrlc::Error::MultipleHandlers) => (),
        Err(err) => warn!("failed to install signal handler: {err}"),
    }
}

/// Fails with [`SimError::Interrupted`] once for each received signal.
pub fn check_signal() -> Result<()> {
    if SIGNALLED.swap(false, Ordering::SeqCst) {
        return Err(SimError::Interrupted);
    }
    Ok(())
}

/// Read single character from interactive terminal, blocking until one is typed.
///
/// `Ctrl+C` or a termination signal stops the simulation with [`SimError::Interrupted`].
///
/// Caller must ensure terminal is in raw mode.
pub fn read_char() -> Result<char> {
    loop {
        check_signal()?;
        if !event::poll(SIGNAL_CHECK_INTERVAL)? {
            continue;
        }
        if let Ok(key) = event::read()?.try_into() {
            return key_to_char(key);
        }
    }
}

/// Read single character from interactive terminal, if one has already been typed.
pub fn poll_char() -> Result<Option<char>> {
    check_signal()?;
    while event::poll(Duration::ZERO)? {
        if let Ok(key) = event::read()?.try_into() {
            return key_to_char(key).map(Some);
        }
    }
    Ok(None)
}

fn key_to_char(key: Key) -> Result<char> {
    let ch = match key {
        Key::Interrupt => return Err(SimError::Interrupted),
        Key::Enter => '\n',
        Key::Backspace => '\x08',
        Key::Tab => '\t',
        Key::Escape => '\x1b',
        Key::Char(ch) => ch,
    };
    Ok(ch)
}

impl TryFrom<Event> for Key {
    type Error = ();
    fn try_from(event: Event) -> Result<Self, Self::Error> {
        if let Event::Key(event) = event {
            if let Ok(key) = event.try_into() {
                return Ok(key);
            }
        }
        Err(())
    }
}

impl TryFrom<KeyEvent> for Key {
    type Error = ();
    fn try_from(event: KeyEvent) -> Result<Self, Self::Error> {
        use event::{KeyCode, KeyEventKind, KeyModifiers as Mod};

        if matches!(event.kind, KeyEventKind::Release) {
            return Err(());
        }

        let key = match (event.modifiers, event.code) {
            (Mod::CONTROL, KeyCode::Char('c')) => Key::Interrupt,

            (_, KeyCode::Backspace) => Key::Backspace,
            (_, KeyCode::Tab) => Key::Tab,
            (_, KeyCode::Esc) => Key::Escape,
            (_, KeyCode::Enter) | (_, KeyCode::Char('\n')) => Key::Enter,

            // Normal character
            (Mod::NONE | Mod::SHIFT, KeyCode::Char(ch)) => Key::Char(ch),

            _ => return Err(()),
        };

        Ok(key)
    }
}
