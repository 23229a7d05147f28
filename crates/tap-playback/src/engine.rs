use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use tap_core::{CancelScope, PlaybackState, PlayerConfig, UserAction};
use tap_store::FrameStore;

use crate::status::{format_status_line, StateTag};
use crate::timing::{frame_period, remaining_sleep};

/// How often the paused/finished sub-loops re-check state. Cheap: both
/// just redraw the status line and park on the cancellation scope.
const IDLE_TICK: Duration = Duration::from_millis(100);

/// What a playback cycle resolved to when its loop returned control to
/// the playlist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Natural end of stream; the Finished sub-loop should run next.
    Finished,
    /// Track-change forward.
    Next,
    /// Track-change backward.
    Prev,
    /// Quit the whole process.
    Quit,
}

/// Natural end of a cycle: extraction has finished and playback has passed
/// the last frame that will ever land. With a known total this reduces to
/// comparing the current frame against it directly; with an unknown total
/// (including the zero-frames-extracted case, where the store's high-water
/// mark never leaves `None`) it falls back to the store's own high-water
/// mark instead.
fn cycle_finished(state: &PlaybackState, store: &FrameStore) -> bool {
    if !state.extraction_complete() {
        return false;
    }
    let total = state.total_frames();
    let current = state.current_frame();
    if total > 0 {
        return current > total;
    }
    match store.last_rendered_frame() {
        Some(last) => current > last,
        None => true,
    }
}

fn outcome_for_cancellation(state: &PlaybackState) -> CycleOutcome {
    match state.take_user_action() {
        UserAction::Next => CycleOutcome::Next,
        UserAction::Prev => CycleOutcome::Prev,
        // Cancellation without an explicit action defaults to quit at
        // the outermost control.
        UserAction::None | UserAction::Quit => CycleOutcome::Quit,
    }
}

fn draw_frame(out: &mut impl Write, frame: &[u8]) -> io::Result<()> {
    queue!(out, MoveTo(0, 0))?;
    out.write_all(frame)
}

fn draw_status(
    out: &mut impl Write,
    tag: StateTag,
    state: &PlaybackState,
    config: &PlayerConfig,
) -> io::Result<()> {
    let line = format_status_line(
        tag,
        state.current_frame(),
        state.total_frames(),
        config.target_fps,
        state.speed_multiplier(),
    );
    queue!(out, MoveTo(0, config.height), Clear(ClearType::CurrentLine))?;
    out.write_all(line.as_bytes())
}

/// The paced render loop that owns one playback cycle.
pub struct PlaybackEngine;

impl PlaybackEngine {
    /// Run the main loop contract until cancellation or natural end.
    pub fn run(
        state: &PlaybackState,
        store: &FrameStore,
        cancel: &CancelScope,
        config: &PlayerConfig,
        out: &mut impl Write,
    ) -> io::Result<CycleOutcome> {
        loop {
            if cancel.is_cancelled() {
                return Ok(outcome_for_cancellation(state));
            }

            if state.is_paused() {
                draw_status(out, StateTag::Paused, state, config)?;
                out.flush()?;
                cancel.park_for(IDLE_TICK);
                continue;
            }

            if cycle_finished(state, store) {
                return Ok(CycleOutcome::Finished);
            }

            let current = state.current_frame();
            if !store.ready_up_to(current) {
                draw_status(out, StateTag::Buffering, state, config)?;
                out.flush()?;
                if !store.wait(current, cancel) {
                    continue;
                }
            }

            let render_start = Instant::now();
            // `take` rather than `get`: consuming the slot advances the
            // store's floor and frees room for the converter pool, the
            // ring-buffer's backpressure release.
            if let Some(frame) = store.take(current, cancel) {
                draw_frame(out, &frame)?;
            }
            draw_status(out, StateTag::Playing, state, config)?;
            out.flush()?;

            let period = frame_period(config.target_fps, state.speed_multiplier());
            if let Some(remaining) = remaining_sleep(period, render_start.elapsed()) {
                cancel.park_for(remaining);
            }
            state.advance_frame();
        }
    }

    /// Post-playback sub-loop: displays `FINISHED` and waits for the
    /// control plane to record a track-change or quit action and cancel
    /// the cycle.
    pub fn run_finished_subloop(
        state: &PlaybackState,
        cancel: &CancelScope,
        config: &PlayerConfig,
        out: &mut impl Write,
    ) -> io::Result<CycleOutcome> {
        loop {
            if cancel.is_cancelled() {
                return Ok(outcome_for_cancellation(state));
            }
            draw_status(out, StateTag::Finished, state, config)?;
            out.flush()?;
            cancel.park_for(IDLE_TICK);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tap_core::config::{ColorMode, DitherMode, PlayMode, ScaleMode, SymbolSet};

    fn test_config(height: u16) -> PlayerConfig {
        PlayerConfig {
            target_fps: 100,
            scale_mode: ScaleMode::Fit,
            color_mode: ColorMode::Full,
            dither_mode: DitherMode::None,
            symbol_set: SymbolSet::Block,
            width: 10,
            height,
            worker_count: 1,
            buffer_frames: 10,
            loop_playlist: false,
            quiet: false,
            play_mode: PlayMode::Stream,
            ffmpeg_bin: "ffmpeg".into(),
            ffprobe_bin: "ffprobe".into(),
            chafa_bin: "chafa".into(),
        }
    }

    #[test]
    fn plays_through_to_natural_finish() {
        let config = test_config(5);
        let state = PlaybackState::new(2);
        let store = FrameStore::new(4, 1);
        let cancel = CancelScope::new();
        store.put(1, Some(Arc::from(*b"one")), &cancel);
        store.put(2, Some(Arc::from(*b"two")), &cancel);
        store.set_total_frames(2);
        store.mark_extraction_complete();
        state.set_total_frames(2);
        state.mark_extraction_complete();

        let mut sink = Vec::new();
        let outcome = PlaybackEngine::run(&state, &store, &cancel, &config, &mut sink)
            .expect("engine loop should not error against an in-memory sink");
        assert_eq!(outcome, CycleOutcome::Finished);
        assert_eq!(state.current_frame(), 3);
    }

    #[test]
    fn zero_frames_extracted_finishes_immediately() {
        let config = test_config(5);
        let state = PlaybackState::new(0);
        let store = FrameStore::new(4, 1);
        store.mark_extraction_complete();
        state.mark_extraction_complete();

        let mut sink = Vec::new();
        let outcome = PlaybackEngine::run(&state, &store, &CancelScope::new(), &config, &mut sink)
            .expect("engine loop should not error against an in-memory sink");
        assert_eq!(outcome, CycleOutcome::Finished);
    }

    #[test]
    fn unknown_total_finishes_once_playback_passes_the_last_rendered_frame() {
        let config = test_config(5);
        let state = PlaybackState::new(0);
        let store = FrameStore::new(4, 1);
        let cancel = CancelScope::new();
        store.put(1, Some(Arc::from(*b"one")), &cancel);
        store.mark_extraction_complete();
        state.mark_extraction_complete();

        let mut sink = Vec::new();
        let outcome = PlaybackEngine::run(&state, &store, &cancel, &config, &mut sink)
            .expect("engine loop should not error against an in-memory sink");
        assert_eq!(outcome, CycleOutcome::Finished);
        assert_eq!(state.current_frame(), 2);
    }

    #[test]
    fn cancellation_with_no_action_defaults_to_quit() {
        let config = test_config(5);
        let state = PlaybackState::new(0);
        let store = FrameStore::new(4, 1);
        let cancel = CancelScope::new();
        cancel.cancel();

        let mut sink = Vec::new();
        let outcome = PlaybackEngine::run(&state, &store, &cancel, &config, &mut sink)
            .expect("engine loop should not error against an in-memory sink");
        assert_eq!(outcome, CycleOutcome::Quit);
    }

    #[test]
    fn cancellation_with_pending_action_reports_it() {
        let config = test_config(5);
        let state = PlaybackState::new(0);
        state.set_user_action(UserAction::Next);
        let store = FrameStore::new(4, 1);
        let cancel = CancelScope::new();
        cancel.cancel();

        let mut sink = Vec::new();
        let outcome = PlaybackEngine::run(&state, &store, &cancel, &config, &mut sink)
            .expect("engine loop should not error against an in-memory sink");
        assert_eq!(outcome, CycleOutcome::Next);
    }

    #[test]
    fn finished_subloop_exits_once_cancelled_with_quit() {
        let config = test_config(5);
        let state = PlaybackState::new(1);
        let cancel = CancelScope::new();
        state.set_user_action(UserAction::Quit);
        cancel.cancel();

        let mut sink = Vec::new();
        let outcome = PlaybackEngine::run_finished_subloop(&state, &cancel, &config, &mut sink)
            .expect("finished sub-loop should not error against an in-memory sink");
        assert_eq!(outcome, CycleOutcome::Quit);
    }
}
