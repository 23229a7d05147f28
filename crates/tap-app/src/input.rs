use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tap_core::{CancelScope, PlaybackState, UserAction};
use tap_store::FrameStore;

/// Frames to seek per left/right arrow press: `5 * targetFps`.
const SEEK_STEP_SECONDS: u64 = 5;

/// The state/cancel pair the currently running cycle exposes to the
/// input reader. The playlist loop swaps this in and out once per cycle;
/// the reader itself is spawned once for the whole process.
#[derive(Clone)]
pub struct ControlTarget {
    pub state: Arc<PlaybackState>,
    pub store: Arc<FrameStore>,
    pub cancel: CancelScope,
}

/// Shared handle between the input reader thread and the playlist loop.
///
/// `target` is `None` in the brief window between cycles (scratch
/// teardown, next probe); keystrokes that land there are dropped rather
/// than acting on a cancelled, about-to-be-dropped cycle. `quit_requested`
/// is sticky across that gap so a quit signaled between cycles (Ctrl-C
/// via the `ctrlc` handler, or `q` pressed just as a cycle ends) is not
/// lost. `cycle_failures` accumulates recoverable per-cycle failure
/// summaries (decoder errors, terminal write failures) across the whole
/// playlist loop, since the process-wide `TerminalGuard` means there is
/// no "after terminal restoration" point between cycles to print them to
/// real stderr — only once, after the guard finally drops.
#[derive(Clone)]
pub struct ControlHandle {
    target: Arc<Mutex<Option<ControlTarget>>>,
    quit_requested: Arc<AtomicBool>,
    cycle_failures: Arc<Mutex<Vec<String>>>,
}

impl ControlHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: Arc::new(Mutex::new(None)),
            quit_requested: Arc::new(AtomicBool::new(false)),
            cycle_failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Point the input reader (and any signal handler) at a new cycle.
    pub fn set_target(&self, target: ControlTarget) {
        #[allow(clippy::unwrap_used)]
        {
            *self.target.lock().unwrap() = Some(target);
        }
    }

    /// Detach the reader from the cycle that just ended, so keystrokes
    /// arriving during teardown don't act on a stale scope.
    pub fn clear_target(&self) {
        #[allow(clippy::unwrap_used)]
        {
            *self.target.lock().unwrap() = None;
        }
    }

    fn current(&self) -> Option<ControlTarget> {
        #[allow(clippy::unwrap_used)]
        self.target.lock().unwrap().clone()
    }

    /// Request process-wide shutdown: cancels whichever cycle is
    /// currently running (with `userAction = quit`) and latches a flag
    /// the playlist loop checks between cycles, so a quit requested with
    /// no cycle active is still honored once one starts (or the loop
    /// exits directly if none ever does).
    pub fn request_quit(&self) {
        self.quit_requested.store(true, Ordering::Release);
        if let Some(target) = self.current() {
            target.state.set_user_action(UserAction::Quit);
            target.cancel.cancel();
        }
    }

    /// `true` once `request_quit` has been called.
    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::Acquire)
    }

    /// Record a recoverable cycle-ending failure for later surfacing.
    /// Never logged immediately: while the process-wide `TerminalGuard`
    /// is active, anything written to stderr lands inside the live
    /// alternate-screen buffer and is overwritten by the engine's next
    /// redraw tick.
    pub fn record_cycle_failure(&self, message: String) {
        #[allow(clippy::unwrap_used)]
        self.cycle_failures.lock().unwrap().push(message);
    }

    /// Drain every failure recorded so far, for the playlist loop to
    /// print to real stderr once the terminal guard has dropped.
    pub fn take_cycle_failures(&self) -> Vec<String> {
        #[allow(clippy::unwrap_used)]
        std::mem::take(&mut *self.cycle_failures.lock().unwrap())
    }
}

impl Default for ControlHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the single process-lifetime raw-input reader. Reads up to 3
/// bytes per syscall — enough to capture a bare key or a full
/// `ESC [ <letter>` arrow sequence — and dispatches against whichever
/// cycle `handle` currently targets.
pub fn spawn_input_reader(handle: ControlHandle, target_fps: u32) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("input-reader".to_string())
        .spawn(move || run(&handle, target_fps))
        .expect("failed to spawn input reader thread")
}

fn run(handle: &ControlHandle, target_fps: u32) {
    let mut stdin = io::stdin();
    let seek_frames = SEEK_STEP_SECONDS * u64::from(target_fps.max(1));
    let mut buf = [0_u8; 3];
    loop {
        // Closing stdin (or a read error) is this reader's shutdown
        // sentinel.
        let n = match stdin.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let Some(target) = handle.current() else {
            continue;
        };
        dispatch(&buf[..n], &target, seek_frames);
    }
}

/// Interpret one input read against the key-binding table. Pulled out of
/// `run` so it's testable without real stdin.
fn dispatch(bytes: &[u8], target: &ControlTarget, seek_frames: u64) {
    match bytes {
        [0x20] => {
            target.state.toggle_pause();
        }
        [b'+'] => target.state.speed_up(),
        [b'-'] => target.state.speed_down(),
        [b'q'] | [0x03] => {
            target.state.set_user_action(UserAction::Quit);
            target.cancel.cancel();
        }
        [0x1b, b'[', b'A'] => {
            target.state.set_user_action(UserAction::Prev);
            target.cancel.cancel();
        }
        [0x1b, b'[', b'B'] => {
            target.state.set_user_action(UserAction::Next);
            target.cancel.cancel();
        }
        [0x1b, b'[', b'C'] => {
            target.state.seek_forward(seek_frames);
            // Frames between the old position and the new one will never
            // be consumed; advancing the floor past them frees their
            // slots instead of leaving the converter pool blocked on room
            // that a normal +1 advance would otherwise never release.
            target.store.advance_floor(target.state.current_frame());
        }
        [0x1b, b'[', b'D'] => target.state.seek_backward(seek_frames),
        _ => {}
    }
}
