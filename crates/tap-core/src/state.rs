use std::sync::Mutex;

use crate::speed::{max_speed_index, DEFAULT_SPEED_INDEX, SPEED_LADDER};

/// Action the input reader recorded for the control loop to act on once
/// the current cycle's cancellation scope has unwound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UserAction {
    /// No action pending.
    #[default]
    None,
    /// Down arrow: advance the playlist cursor.
    Next,
    /// Up arrow: move the playlist cursor back.
    Prev,
    /// `q` or Ctrl-C: terminate the process.
    Quit,
}

struct Inner {
    current_frame: u64,
    total_frames: u64,
    extraction_complete: bool,
    is_paused: bool,
    speed_index: usize,
    user_action: UserAction,
}

/// Mutable playback state, mutated only under a single lock. One
/// instance per playback cycle.
pub struct PlaybackState {
    inner: Mutex<Inner>,
}

impl PlaybackState {
    /// Create a fresh state at frame 1, unpaused, `1.00x` speed.
    ///
    /// `total_frames` may be `0` if the estimated duration is unknown.
    #[must_use]
    pub fn new(total_frames: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current_frame: 1,
                total_frames,
                extraction_complete: false,
                is_paused: false,
                speed_index: DEFAULT_SPEED_INDEX,
                user_action: UserAction::None,
            }),
        }
    }

    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Toggle `is_paused` and return the new value.
    pub fn toggle_pause(&self) -> bool {
        let mut inner = self.lock();
        inner.is_paused = !inner.is_paused;
        inner.is_paused
    }

    /// `true` if playback is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.lock().is_paused
    }

    /// Increment `speed_index`, clamped to the ladder's max rung.
    pub fn speed_up(&self) {
        let mut inner = self.lock();
        inner.speed_index = inner.speed_index.saturating_add(1).min(max_speed_index());
    }

    /// Decrement `speed_index`, clamped to the ladder's min rung (`0`).
    pub fn speed_down(&self) {
        let mut inner = self.lock();
        inner.speed_index = inner.speed_index.saturating_sub(1);
    }

    /// Current speed multiplier from the fixed ladder.
    #[must_use]
    pub fn speed_multiplier(&self) -> f64 {
        let index = self.lock().speed_index;
        SPEED_LADDER[index]
    }

    /// Record a pending user action for the control loop to consume.
    pub fn set_user_action(&self, action: UserAction) {
        self.lock().user_action = action;
    }

    /// Take and reset the pending user action.
    pub fn take_user_action(&self) -> UserAction {
        let mut inner = self.lock();
        std::mem::take(&mut inner.user_action)
    }

    /// Next frame index to display (1-based).
    #[must_use]
    pub fn current_frame(&self) -> u64 {
        self.lock().current_frame
    }

    /// Advance `current_frame` by one.
    pub fn advance_frame(&self) {
        let mut inner = self.lock();
        inner.current_frame += 1;
    }

    /// Estimated total frame count; `0` if unknown.
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.lock().total_frames
    }

    /// Record the estimated total frame count once the decoder's probe
    /// resolves it (may still be `0` if duration was unreported).
    pub fn set_total_frames(&self, total: u64) {
        self.lock().total_frames = total;
    }

    /// Mark extraction as complete. Sticky for the lifetime of the cycle.
    pub fn mark_extraction_complete(&self) {
        self.lock().extraction_complete = true;
    }

    /// `true` once the decoder process has terminated.
    #[must_use]
    pub fn extraction_complete(&self) -> bool {
        self.lock().extraction_complete
    }

    /// `true` when the cycle has reached its natural end: extraction is
    /// complete, the total frame count is known, and playback has moved
    /// past the last valid frame index (`1..=totalFrames`).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        let inner = self.lock();
        inner.extraction_complete && inner.total_frames > 0 && inner.current_frame > inner.total_frames
    }

    /// Seek forward by `delta` frames, clamped to `[1, totalFrames - 1]`
    /// (or to `1` if `totalFrames` is still unknown).
    pub fn seek_forward(&self, delta: u64) {
        let mut inner = self.lock();
        let upper = if inner.total_frames > 0 {
            inner.total_frames.saturating_sub(1)
        } else {
            1
        };
        inner.current_frame = inner.current_frame.saturating_add(delta).min(upper).max(1);
    }

    /// Seek backward by `delta` frames, clamped to `>= 1`.
    pub fn seek_backward(&self, delta: u64) {
        let mut inner = self.lock();
        inner.current_frame = inner.current_frame.saturating_sub(delta).max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_toggled_twice_returns_to_initial() {
        let state = PlaybackState::new(100);
        assert!(!state.is_paused());
        state.toggle_pause();
        state.toggle_pause();
        assert!(!state.is_paused());
    }

    #[test]
    fn speed_clamps_at_ladder_bounds() {
        let state = PlaybackState::new(100);
        for _ in 0..10 {
            state.speed_up();
        }
        assert!((state.speed_multiplier() - 2.00).abs() < f64::EPSILON);
        for _ in 0..10 {
            state.speed_down();
        }
        assert!((state.speed_multiplier() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn speed_up_then_down_same_count_is_identity() {
        let state = PlaybackState::new(100);
        state.speed_up();
        state.speed_up();
        state.speed_down();
        state.speed_down();
        assert!((state.speed_multiplier() - 1.00).abs() < f64::EPSILON);
    }

    #[test]
    fn seek_forward_then_backward_is_identity_without_clamping() {
        let state = PlaybackState::new(150);
        // frame 75, well clear of both clamps
        for _ in 0..74 {
            state.advance_frame();
        }
        assert_eq!(state.current_frame(), 75);
        state.seek_forward(20);
        state.seek_backward(20);
        assert_eq!(state.current_frame(), 75);
    }

    #[test]
    fn seek_clamps_to_known_bounds() {
        let state = PlaybackState::new(150);
        state.seek_forward(10_000);
        assert_eq!(state.current_frame(), 149);
        state.seek_backward(10_000);
        assert_eq!(state.current_frame(), 1);
    }

    #[test]
    fn seek_forward_with_unknown_total_clamps_to_one() {
        let state = PlaybackState::new(0);
        state.seek_forward(75);
        assert_eq!(state.current_frame(), 1);
    }

    #[test]
    fn finished_requires_extraction_complete_and_known_total() {
        let state = PlaybackState::new(0);
        for _ in 0..1000 {
            state.advance_frame();
        }
        assert!(!state.is_finished());
        state.set_total_frames(30);
        state.mark_extraction_complete();
        assert!(state.is_finished());
    }

    #[test]
    fn user_action_round_trips_and_resets() {
        let state = PlaybackState::new(10);
        assert_eq!(state.take_user_action(), UserAction::None);
        state.set_user_action(UserAction::Quit);
        assert_eq!(state.take_user_action(), UserAction::Quit);
        assert_eq!(state.take_user_action(), UserAction::None);
    }
}
