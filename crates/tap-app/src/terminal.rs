use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{execute, queue};

/// Tracks whether the terminal currently needs restoring, so both the
/// `Drop` path and the panic hook can call the same idempotent restore
/// without double-writing escape sequences.
static ENTERED: AtomicBool = AtomicBool::new(false);

/// Best-effort terminal restoration: leaves the alternate screen, shows
/// the cursor, and disables raw mode. Safe to call from a panic hook,
/// where unwinding (and therefore `Drop`) may never run under this
/// workspace's `panic = "abort"` release profile.
pub fn restore_terminal_best_effort() {
    if !ENTERED.swap(false, Ordering::AcqRel) {
        return;
    }
    let mut out = io::stdout();
    let _ = execute!(out, Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
    let _ = out.flush();
}

/// Installs a panic hook that restores the terminal and removes whichever
/// cycle's scratch directory is active before the default hook prints the
/// panic message, so the message lands on a normal screen and no scratch
/// directory is left behind. Both cleanups are best-effort function calls
/// rather than relying on `Drop`, since this workspace's `panic = "abort"`
/// release profile never unwinds.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal_best_effort();
        crate::scratch::remove_active_scratch_best_effort();
        default_hook(info);
    }));
}

/// RAII guard over the terminal's raw-mode / alternate-screen state for
/// the whole process lifetime. There is one guard, created once in
/// `main`, not one per cycle — cycles share the terminal the same way
/// they share the input reader.
pub struct TerminalGuard;

impl TerminalGuard {
    /// Save the current mode, enter the alternate screen, hide the
    /// cursor, and switch to raw mode.
    ///
    /// # Errors
    /// Returns an error if any of the underlying terminal calls fail.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut out = io::stdout();
        queue!(out, EnterAlternateScreen, Hide)?;
        out.flush()?;
        ENTERED.store(true, Ordering::Release);
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal_best_effort();
    }
}
