use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Metadata extracted from the source's primary video stream and
/// container, via `ffprobe`.
#[derive(Clone, Copy, Debug)]
pub struct VideoInfo {
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Native frames per second (e.g. 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
    /// Duration in seconds, if the container reports one. `None` is not
    /// fatal — the caller runs with `total_frames = 0`.
    pub duration_secs: Option<f64>,
}

/// Query `ffprobe` for the primary video stream's dimensions, frame rate,
/// and the container's duration.
///
/// Uses `ffprobe`'s plain `key=value` output (`-of
/// default=noprint_wrappers=1`) rather than `-of json` — a full JSON
/// parser would be overkill for three scalar fields read from a
/// one-shot CLI call.
///
/// # Errors
/// Returns an error if `ffprobe` cannot be spawned or the file contains
/// no decodable video stream. A missing/unparseable duration is *not* an
/// error — it surfaces as `duration_secs: None`.
pub fn probe_video(path: &Path, ffprobe_bin: &Path) -> Result<VideoInfo> {
    let path_str = path
        .to_str()
        .context("source path is not valid UTF-8")?;

    let output = Command::new(ffprobe_bin)
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate:format=duration",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("failed to spawn {}", ffprobe_bin.display()))?;

    let text = String::from_utf8_lossy(&output.stdout);

    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut fps: f64 = 30.0;
    let mut duration_secs: Option<f64> = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // "24/1", "30000/1001", etc.
            let val = val.trim();
            let mut parts = val.splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 {
                fps = num / den;
            }
        } else if let Some(val) = line.strip_prefix("duration=") {
            duration_secs = val.trim().parse::<f64>().ok().filter(|d| *d > 0.0);
        }
    }

    let (width, height) = match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => anyhow::bail!(
            "{} found no decodable video stream in {}",
            ffprobe_bin.display(),
            path.display()
        ),
    };

    log::info!(
        "probe_video: {width}x{height} @ {fps:.3}fps, duration={:?} — {}",
        duration_secs,
        path.display()
    );

    Ok(VideoInfo {
        width,
        height,
        fps,
        duration_secs,
    })
}

/// Estimate the total frame count at the target playback rate. `None`
/// duration yields `0`, the sentinel for "unknown" used throughout the
/// playback engine.
#[must_use]
pub fn estimate_total_frames(info: &VideoInfo, target_fps: u32) -> u64 {
    match info.duration_secs {
        Some(duration) if duration > 0.0 => (duration * f64::from(target_fps)).ceil() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        let info = VideoInfo {
            width: 1920,
            height: 1080,
            fps: 24.0,
            duration_secs: Some(2.0),
        };
        assert_eq!(estimate_total_frames(&info, 15), 30);
    }

    #[test]
    fn unknown_duration_yields_zero() {
        let info = VideoInfo {
            width: 1920,
            height: 1080,
            fps: 24.0,
            duration_secs: None,
        };
        assert_eq!(estimate_total_frames(&info, 15), 0);
    }

    #[test]
    fn probe_reports_error_on_missing_binary() {
        let result = probe_video(Path::new("video.mp4"), Path::new("/no/such/ffprobe-binary"));
        assert!(result.is_err());
    }
}
