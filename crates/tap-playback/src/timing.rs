use std::time::Duration;

/// `period = 1s / (targetFps · speedMultiplier)`.
#[must_use]
pub fn frame_period(target_fps: u32, speed_multiplier: f64) -> Duration {
    let rate = f64::from(target_fps) * speed_multiplier;
    if rate <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(1.0 / rate)
}

/// How long to sleep after rendering, given how long the render itself
/// took. `None` when the render already ran past the period — the
/// negative remainder is simply skipped, never slept as a positive one.
#[must_use]
pub fn remaining_sleep(period: Duration, render_elapsed: Duration) -> Option<Duration> {
    period.checked_sub(render_elapsed).filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_halves_when_speed_doubles() {
        let base = frame_period(15, 1.0);
        let doubled = frame_period(15, 2.0);
        assert!((doubled.as_secs_f64() - base.as_secs_f64() / 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_rate_yields_zero_period() {
        assert_eq!(frame_period(0, 1.0), Duration::ZERO);
        assert_eq!(frame_period(15, 0.0), Duration::ZERO);
    }

    #[test]
    fn remaining_sleep_is_none_once_render_exceeds_period() {
        let period = Duration::from_millis(40);
        assert_eq!(remaining_sleep(period, Duration::from_millis(50)), None);
    }

    #[test]
    fn remaining_sleep_is_the_leftover_when_render_is_fast() {
        let period = Duration::from_millis(40);
        let remaining = remaining_sleep(period, Duration::from_millis(10)).expect("some leftover");
        assert_eq!(remaining, Duration::from_millis(30));
    }
}
