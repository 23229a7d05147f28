use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use tap_core::config::{PlayerConfig, ScaleMode};
use tap_core::state::PlaybackState;

use crate::stderr_ring::StderrRing;

/// Name template the decoder is told to write image artifacts under,
/// relative to the scratch images directory.
pub const OUTPUT_TEMPLATE: &str = tap_core::IMAGE_FILENAME_TEMPLATE;

/// Build the `-vf` scale (and, for `fill`, crop) clause for the decoder's
/// filter chain, targeting the `W·8 × H·16` pixel box.
#[must_use]
pub fn build_scale_filter(mode: ScaleMode, width: u32, height: u32) -> String {
    match mode {
        ScaleMode::Fit => {
            format!("scale={width}:{height}:force_original_aspect_ratio=decrease")
        }
        ScaleMode::Fill => format!(
            "scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height}"
        ),
        ScaleMode::Stretch => format!("scale={width}:{height}"),
    }
}

/// Build the full `ffmpeg` argument list for one decode cycle.
#[must_use]
pub fn build_ffmpeg_args(
    source: &str,
    output_template: &str,
    config: &PlayerConfig,
) -> Vec<String> {
    let (box_w, box_h) = config.pixel_box();
    let scale_clause = build_scale_filter(config.scale_mode, box_w, box_h);
    let filter = format!("fps={},{scale_clause}", config.target_fps);

    vec![
        "-nostdin".to_string(),
        "-v".to_string(),
        "warning".to_string(),
        "-i".to_string(),
        source.to_string(),
        "-vf".to_string(),
        filter,
        "-q:v".to_string(),
        "2".to_string(),
        "-y".to_string(),
        output_template.to_string(),
    ]
}

/// A running (or finished) decoder process plus its captured stderr tail.
pub struct DecoderHandle {
    child: Arc<Mutex<Child>>,
    killed_by_us: Arc<AtomicBool>,
    stderr: StderrRing,
    supervisor: Option<thread::JoinHandle<()>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl DecoderHandle {
    /// Spawn the decoder for one cycle. `images_dir` must already exist.
    ///
    /// # Errors
    /// Returns an error if the process fails to start. Fatal for the
    /// *cycle*, not necessarily the process — the caller decides whether
    /// to abort or advance the playlist.
    pub fn spawn(
        source: &Path,
        images_dir: &Path,
        config: &PlayerConfig,
        state: Arc<PlaybackState>,
    ) -> Result<Self> {
        let source_str = source
            .to_str()
            .context("source path is not valid UTF-8")?;
        let output_template = images_dir.join(OUTPUT_TEMPLATE);
        let output_template_str = output_template
            .to_str()
            .context("scratch path is not valid UTF-8")?;

        let args = build_ffmpeg_args(source_str, output_template_str, config);

        let mut child = Command::new(&config.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {}", config.ffmpeg_bin.display()))?;

        let stderr_pipe = child
            .stderr
            .take()
            .context("decoder stderr pipe unavailable")?;
        let stderr = StderrRing::spawn(stderr_pipe);

        let child = Arc::new(Mutex::new(child));
        let killed_by_us = Arc::new(AtomicBool::new(false));
        let failure = Arc::new(Mutex::new(None));

        let supervisor = {
            let child = Arc::clone(&child);
            let killed_by_us = Arc::clone(&killed_by_us);
            let stderr = stderr.clone();
            let failure = Arc::clone(&failure);
            thread::Builder::new()
                .name("decoder-supervisor".to_string())
                .spawn(move || {
                    #[allow(clippy::unwrap_used)]
                    let status = child.lock().unwrap().wait();
                    state.mark_extraction_complete();
                    match status {
                        Ok(exit) if exit.success() => {
                            log::info!("decoder finished cleanly");
                        }
                        _ if killed_by_us.load(Ordering::Acquire) => {
                            log::debug!("decoder cancelled");
                        }
                        Ok(exit) => {
                            // Logged at `debug`, not `warn`: while the
                            // process-wide terminal guard is active this
                            // would otherwise print into the live
                            // alternate-screen buffer and be gone within
                            // one frame period. The caller surfaces this
                            // properly via `take_failure` once the guard
                            // has dropped.
                            let message = format!("decoder exited with {exit}: {}", stderr.tail().trim());
                            log::debug!("{message}");
                            #[allow(clippy::unwrap_used)]
                            {
                                *failure.lock().unwrap() = Some(message);
                            }
                        }
                        Err(e) => {
                            let message = format!("failed to wait on decoder: {e}");
                            log::debug!("{message}");
                            #[allow(clippy::unwrap_used)]
                            {
                                *failure.lock().unwrap() = Some(message);
                            }
                        }
                    }
                })
                .ok()
        };

        Ok(Self {
            child,
            killed_by_us,
            stderr,
            supervisor,
            failure,
        })
    }

    /// Kill the decoder process. Suppresses the "decoder exited with an
    /// error" log path in the supervisor, since cancellation is not an
    /// error.
    pub fn kill(&self) {
        self.killed_by_us.store(true, Ordering::Release);
        #[allow(clippy::unwrap_used)]
        let mut guard = self.child.lock().unwrap();
        let _ = guard.kill();
    }

    /// The captured tail of the decoder's stderr, for surfacing after
    /// terminal restoration.
    #[must_use]
    pub fn stderr_tail(&self) -> String {
        self.stderr.tail()
    }

    /// Take the supervisor's failure summary (exit status plus stderr
    /// tail), if it exited non-zero and was not killed by us. `None` on a
    /// clean exit, on cancellation, or before the supervisor has observed
    /// exit at all. Call after `join` to guarantee the supervisor has run.
    #[must_use]
    pub fn take_failure(&self) -> Option<String> {
        #[allow(clippy::unwrap_used)]
        self.failure.lock().unwrap().take()
    }

    /// Block until the decoder's supervisor thread has observed exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.supervisor.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        self.kill();
    }
}
