use std::fs;
use std::process::{Command, Stdio};
use std::sync::{Arc, Once};
use std::thread;

use tap_core::{CancelScope, PlayerConfig};
use tap_store::FrameStore;

use crate::dispatcher::Job;

/// Translate bare `\n` into `\r\n`. The player spends its whole lifetime
/// in raw/cbreak terminal mode, which does not perform the usual
/// `\n` → `\r\n` translation a cooked tty gives you for free.
fn normalize_line_endings(text: &str) -> String {
    text.replace('\n', "\r\n")
}

fn convert_frame(chafa_bin: &std::path::Path, job: &Job, config: &PlayerConfig) -> Option<Vec<u8>> {
    let size = format!("{}x{}", config.width, config.height);
    let output = Command::new(chafa_bin)
        .args([
            "--size",
            &size,
            "--symbols",
            config.symbol_set.as_cli_token(),
            "--colors",
            config.color_mode.as_cli_token(),
            "--dither",
            config.dither_mode.as_cli_token(),
        ])
        .arg(&job.path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Some(normalize_line_endings(&text).into_bytes())
}

fn worker_loop(
    jobs: &flume::Receiver<Job>,
    store: &FrameStore,
    config: &PlayerConfig,
    cancel: &CancelScope,
    failure_logged: &Once,
) {
    for job in jobs.iter() {
        if cancel.is_cancelled() {
            return;
        }
        let rendered = convert_frame(&config.chafa_bin, &job, config);
        let _ = fs::remove_file(&job.path);
        match rendered {
            Some(bytes) => {
                store.put(job.index, Some(Arc::from(bytes)), cancel);
            }
            None => {
                store.put(job.index, None, cancel);
                if !cancel.is_cancelled() {
                    failure_logged.call_once(|| {
                        log::warn!(
                            "converter failed on frame {} (and possibly others this cycle)",
                            job.index
                        );
                    });
                }
            }
        }
    }
}

/// Fixed pool of worker threads that invoke the external converter once
/// per frame and write results into the shared [`FrameStore`].
pub struct ConverterPool {
    workers: Vec<thread::JoinHandle<()>>,
}

impl ConverterPool {
    /// Spawn `n_workers` worker threads pulling jobs from `jobs`.
    #[must_use]
    pub fn spawn(
        n_workers: usize,
        jobs: flume::Receiver<Job>,
        store: Arc<FrameStore>,
        config: Arc<PlayerConfig>,
        cancel: CancelScope,
    ) -> Self {
        let failure_logged = Arc::new(Once::new());
        let workers = (0..n_workers.max(1))
            .map(|i| {
                let jobs = jobs.clone();
                let store = Arc::clone(&store);
                let config = Arc::clone(&config);
                let cancel = cancel.clone();
                let failure_logged = Arc::clone(&failure_logged);
                thread::Builder::new()
                    .name(format!("converter-{i}"))
                    .spawn(move || worker_loop(&jobs, &store, &config, &cancel, &failure_logged))
                    .expect("failed to spawn converter worker thread")
            })
            .collect();
        Self { workers }
    }

    /// Block until every worker has drained the job channel and exited.
    pub fn join(self) {
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bare_lf_to_crlf() {
        let input = "line one\nline two\nline three";
        assert_eq!(normalize_line_endings(input), "line one\r\nline two\r\nline three");
    }

    #[test]
    fn normalizes_trailing_newline_without_double_crlf() {
        let input = "only line\n";
        assert_eq!(normalize_line_endings(input), "only line\r\n");
    }

    #[test]
    fn convert_frame_reports_none_on_missing_binary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image_path = dir.path().join("frame-00001.jpg");
        std::fs::write(&image_path, b"not really a jpeg").expect("write stub frame");
        let job = Job { index: 1, path: image_path };
        let config = test_config();
        let result = convert_frame(std::path::Path::new("/no/such/chafa-binary"), &job, &config);
        assert!(result.is_none());
    }

    fn test_config() -> PlayerConfig {
        use tap_core::{ColorMode, DitherMode, PlayMode, ScaleMode, SymbolSet};
        PlayerConfig {
            target_fps: 15,
            scale_mode: ScaleMode::Fit,
            color_mode: ColorMode::Full,
            dither_mode: DitherMode::None,
            symbol_set: SymbolSet::Block,
            width: 80,
            height: 24,
            worker_count: 1,
            buffer_frames: 300,
            loop_playlist: false,
            quiet: false,
            play_mode: PlayMode::Stream,
            ffmpeg_bin: "ffmpeg".into(),
            ffprobe_bin: "ffprobe".into(),
            chafa_bin: "chafa".into(),
        }
    }
}
