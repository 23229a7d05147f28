/// The legend shown on the right of the status line, mirroring the
/// control plane's key bindings.
pub const CONTROLS_LEGEND: &str =
    "[space] pause  [+/-] speed  [↑/↓] track  [←/→] seek  [q] quit";

/// State tag shown at the start of the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateTag {
    Playing,
    Paused,
    Buffering,
    Finished,
}

impl StateTag {
    fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Buffering => "BUFFERING",
            Self::Finished => "FINISHED",
        }
    }
}

fn format_timecode(frame_index: u64, target_fps: u32) -> String {
    if target_fps == 0 {
        return "??:??".to_string();
    }
    let total_secs = frame_index / u64::from(target_fps);
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Build the one-line status bar redrawn on every playback tick: state
/// tag, elapsed/total timecode, speed, and the controls legend, each field
/// joined with `" | "`.
#[must_use]
pub fn format_status_line(
    tag: StateTag,
    current_frame: u64,
    total_frames: u64,
    target_fps: u32,
    speed_multiplier: f64,
) -> String {
    let current = format_timecode(current_frame, target_fps);
    let total = if total_frames == 0 {
        "??:??".to_string()
    } else {
        format_timecode(total_frames, target_fps)
    };
    format!(
        "{} | {current} / {total} | Speed: {speed_multiplier:.2}x | {CONTROLS_LEGEND}",
        tag.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_total_renders_question_marks() {
        let line = format_status_line(StateTag::Playing, 15, 0, 15, 1.0);
        assert!(line.contains("00:01 / ??:??"));
    }

    #[test]
    fn known_total_renders_both_timecodes() {
        let line = format_status_line(StateTag::Buffering, 30, 150, 15, 1.5);
        assert!(line.starts_with("BUFFERING | 00:02 / 00:10 | Speed: 1.50x"));
    }

    #[test]
    fn timecode_rolls_minutes_past_sixty_seconds() {
        assert_eq!(format_timecode(15 * 90, 15), "01:30");
    }

    #[test]
    fn zero_fps_never_divides_by_zero() {
        assert_eq!(format_timecode(100, 0), "??:??");
    }
}
