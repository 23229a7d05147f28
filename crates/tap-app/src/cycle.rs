use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tap_convert::{ConverterPool, Dispatcher};
use tap_core::{CancelScope, PlaybackState, PlayerConfig};
use tap_decode::{estimate_total_frames, probe_video, DecoderHandle};
use tap_playback::{CycleOutcome, PlaybackEngine};
use tap_store::FrameStore;

use crate::input::{ControlHandle, ControlTarget};
use crate::scratch::ScratchDir;

/// How long to give the pipeline before the engine starts regardless of
/// whether a frame has landed yet.
const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Outcome of one full playback cycle: one video's lifetime from scratch
/// creation through scratch removal.
pub struct CycleResult {
    pub outcome: CycleOutcome,
}

/// Run one playback cycle for `source`: probe, decode, convert, play,
/// and tear down — the full decode→convert→store→playback pipeline under
/// one cancellation scope.
///
/// # Errors
/// Returns an error only for cycle-fatal conditions: the scratch
/// directory cannot be created, or the terminal write path fails.
pub fn run(
    source: &Path,
    config: &PlayerConfig,
    control: &ControlHandle,
    out: &mut impl Write,
) -> Result<CycleResult> {
    let info = probe_video(source, &config.ffprobe_bin);
    let total_frames = match info {
        Ok(info) => estimate_total_frames(&info, config.target_fps),
        Err(e) => {
            // Metadata is recoverable: proceed with an unknown total
            // rather than aborting the cycle.
            log::warn!("metadata probe failed for {}: {e}", source.display());
            0
        }
    };

    let scratch = ScratchDir::create().context("startup: could not create scratch directory")?;

    let state = Arc::new(PlaybackState::new(total_frames));
    let store = Arc::new(FrameStore::new(config.buffer_frames, 1));
    store.set_total_frames(total_frames);
    let cycle_cancel = CancelScope::new();

    control.set_target(ControlTarget {
        state: Arc::clone(&state),
        store: Arc::clone(&store),
        cancel: cycle_cancel.clone(),
    });

    let result = run_pipeline(source, scratch.images_dir(), config, &state, &store, &cycle_cancel, control, out);

    control.clear_target();
    drop(scratch); // removes the scratch directory tree

    result.map(|outcome| CycleResult { outcome })
}

#[allow(clippy::too_many_arguments)]
fn run_pipeline(
    source: &Path,
    images_dir: &Path,
    config: &PlayerConfig,
    state: &Arc<PlaybackState>,
    store: &Arc<FrameStore>,
    cycle_cancel: &CancelScope,
    control: &ControlHandle,
    out: &mut impl Write,
) -> Result<CycleOutcome> {
    let mut decoder = match DecoderHandle::spawn(source, images_dir, config, Arc::clone(state)) {
        Ok(decoder) => decoder,
        Err(e) => {
            // Fatal for this cycle only: record and let the pipeline run
            // with zero images, which resolves to the zero-frames
            // boundary case below. Recorded rather than logged at error
            // level for the same reason as the mid-cycle failure path
            // below: the terminal guard is still active for the rest of
            // the playlist.
            log::debug!("decoder failed to start for {}: {e}", source.display());
            control.record_cycle_failure(format!("{}: decoder failed to start: {e}", source.display()));
            state.mark_extraction_complete();
            store.mark_extraction_complete();
            let outcome = run_engine(state, store, config, cycle_cancel, out)?;
            return Ok(outcome);
        }
    };

    // Mirrors the decoder's completion from `PlaybackState` (which the
    // supervisor thread sets directly) onto the `FrameStore`'s own
    // tracking, which the store's readiness wait relies on. Kept as a
    // small bridge here rather than handing the store to `tap-decode`,
    // so the decoder driver stays ignorant of the frame store.
    let bridge = {
        let state = Arc::clone(state);
        let store = Arc::clone(store);
        let cancel = cycle_cancel.clone();
        thread::spawn(move || {
            while !state.extraction_complete() && !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(20));
            }
            store.mark_extraction_complete();
        })
    };

    let (job_tx, job_rx) = flume::bounded(100);
    let dispatcher = Dispatcher::spawn(
        images_dir.to_path_buf(),
        Arc::clone(state),
        job_tx,
        cycle_cancel.clone(),
    );
    let config_arc = Arc::new(config.clone());
    let pool = ConverterPool::spawn(
        config.worker_count,
        job_rx,
        Arc::clone(store),
        Arc::clone(&config_arc),
        cycle_cancel.clone(),
    );

    // Race the first frame's arrival against `STARTUP_GRACE`, whichever
    // comes first — not a plain `wait`, which would block indefinitely
    // if the pipeline is slower than that grace period.
    let startup_deadline = std::time::Instant::now() + STARTUP_GRACE;
    while !store.ready_up_to(1) && !cycle_cancel.is_cancelled() && std::time::Instant::now() < startup_deadline {
        cycle_cancel.park_for(Duration::from_millis(20));
    }

    let outcome = run_engine(state, store, config, cycle_cancel, out);

    cycle_cancel.cancel();
    decoder.kill();
    decoder.join();
    let _ = bridge.join();
    let _ = dispatcher.join();
    pool.join();
    // Recorded rather than logged here: the process-wide `TerminalGuard`
    // is still active for the rest of the playlist, so anything written
    // to stderr now would land inside the live alternate-screen buffer
    // and vanish on the engine's next redraw. `main` prints these once
    // the guard has actually dropped.
    if let Some(failure) = decoder.take_failure() {
        control.record_cycle_failure(format!("{}: {failure}", source.display()));
    }

    outcome
}

fn run_engine(
    state: &PlaybackState,
    store: &FrameStore,
    config: &PlayerConfig,
    cycle_cancel: &CancelScope,
    out: &mut impl Write,
) -> Result<CycleOutcome> {
    if config.play_mode == tap_core::config::PlayMode::Preload {
        // Block for every frame to land (or cancellation) before
        // starting the engine at all.
        let total = state.total_frames();
        if total > 0 {
            store.wait(total, cycle_cancel);
        } else {
            while !state.extraction_complete() && !cycle_cancel.is_cancelled() {
                cycle_cancel.park_for(Duration::from_millis(50));
            }
        }
    }

    let outcome = PlaybackEngine::run(state, store, cycle_cancel, config, out)
        .context("terminal write failed")?;

    if outcome == CycleOutcome::Finished {
        return PlaybackEngine::run_finished_subloop(state, cycle_cancel, config, out)
            .context("terminal write failed");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tap_core::config::{ColorMode, DitherMode, PlayMode, ScaleMode, SymbolSet};

    fn write_stub(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("write stub script");
        let mut perms = fs::metadata(&path).expect("stat stub script").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod stub script");
        path
    }

    /// Stands in for `ffmpeg`: writes two JPEG stubs under whatever
    /// directory its last argument (the output template) lives in, then
    /// exits cleanly — exercising the real `DecoderHandle` supervisor
    /// path without a real decoder binary.
    const FFMPEG_STUB: &str = "#!/bin/sh\nfor a in \"$@\"; do last=\"$a\"; done\nd=$(dirname \"$last\")\nprintf fake > \"$d/frame-00001.jpg\"\nprintf fake > \"$d/frame-00002.jpg\"\nexit 0\n";

    /// Stands in for `ffprobe`: reports a fixed duration matching exactly
    /// two frames at the test's 2 fps target, so the cycle's `totalFrames`
    /// lines up with what the ffmpeg stub actually produces.
    const FFPROBE_STUB: &str = "#!/bin/sh\nprintf 'width=64\\nheight=32\\nr_frame_rate=2/1\\nduration=1.000000\\n'\nexit 0\n";

    /// Stands in for `chafa`: echoes a tag naming the image it was given,
    /// so the rendered frame store.get() content is distinguishable.
    const CHAFA_STUB: &str = "#!/bin/sh\nfor a in \"$@\"; do last=\"$a\"; done\nprintf 'RENDERED:%s' \"$last\"\nexit 0\n";

    #[test]
    fn full_cycle_plays_to_finish_then_quits_on_request() {
        let bin_dir = tempfile::tempdir().expect("tempdir for stub binaries");
        let ffmpeg_bin = write_stub(bin_dir.path(), "ffmpeg", FFMPEG_STUB);
        let ffprobe_bin = write_stub(bin_dir.path(), "ffprobe", FFPROBE_STUB);
        let chafa_bin = write_stub(bin_dir.path(), "chafa", CHAFA_STUB);

        let source_dir = tempfile::tempdir().expect("tempdir for fake source video");
        let source = source_dir.path().join("clip.mp4");
        fs::write(&source, b"not a real video").expect("write fake source");

        let config = PlayerConfig {
            target_fps: 2,
            scale_mode: ScaleMode::Fit,
            color_mode: ColorMode::Full,
            dither_mode: DitherMode::None,
            symbol_set: SymbolSet::Block,
            width: 10,
            height: 5,
            worker_count: 2,
            buffer_frames: 10,
            loop_playlist: false,
            quiet: false,
            play_mode: PlayMode::Stream,
            ffmpeg_bin,
            ffprobe_bin,
            chafa_bin,
        };

        let control = ControlHandle::new();
        let quitter = control.clone();
        // Two frames at 2fps take ~1s to play through to the natural
        // `FINISHED` state; wait comfortably past that before quitting so
        // this exercises the finished sub-loop, not a mid-playback cancel.
        let quit_thread = thread::spawn(move || {
            thread::sleep(Duration::from_millis(1800));
            quitter.request_quit();
        });

        let mut sink = Vec::new();
        let result = run(&source, &config, &control, &mut sink).expect("cycle should not error");

        quit_thread.join().expect("quit thread panicked");
        assert_eq!(result.outcome, CycleOutcome::Quit);
        let rendered = String::from_utf8_lossy(&sink);
        assert!(rendered.contains("RENDERED:"));
        assert!(rendered.contains("FINISHED"));
        assert!(control.take_cycle_failures().is_empty(), "clean decoder exit records no failure");
    }

    #[test]
    fn decoder_exiting_non_zero_mid_cycle_is_recorded_not_logged_live() {
        let bin_dir = tempfile::tempdir().expect("tempdir for stub binaries");
        // Produces one frame, then exits non-zero, mirroring §7's
        // "decoder exits non-zero mid-cycle" extraction failure: the cycle
        // must still play what was extracted rather than aborting.
        let ffmpeg_bin = write_stub(
            bin_dir.path(),
            "ffmpeg",
            "#!/bin/sh\nfor a in \"$@\"; do last=\"$a\"; done\nd=$(dirname \"$last\")\nprintf fake > \"$d/frame-00001.jpg\"\necho boom 1>&2\nexit 1\n",
        );
        let ffprobe_bin = write_stub(bin_dir.path(), "ffprobe", FFPROBE_STUB);
        let chafa_bin = write_stub(bin_dir.path(), "chafa", CHAFA_STUB);

        let source_dir = tempfile::tempdir().expect("tempdir for fake source video");
        let source = source_dir.path().join("clip.mp4");
        fs::write(&source, b"not a real video").expect("write fake source");

        let config = PlayerConfig {
            target_fps: 2,
            scale_mode: ScaleMode::Fit,
            color_mode: ColorMode::Full,
            dither_mode: DitherMode::None,
            symbol_set: SymbolSet::Block,
            width: 10,
            height: 5,
            worker_count: 2,
            buffer_frames: 10,
            loop_playlist: false,
            quiet: false,
            play_mode: PlayMode::Stream,
            ffmpeg_bin,
            ffprobe_bin,
            chafa_bin,
        };

        let control = ControlHandle::new();
        let quitter = control.clone();
        let quit_thread = thread::spawn(move || {
            thread::sleep(Duration::from_millis(900));
            quitter.request_quit();
        });

        let mut sink = Vec::new();
        let result = run(&source, &config, &control, &mut sink).expect("cycle should not error");

        quit_thread.join().expect("quit thread panicked");
        assert_eq!(result.outcome, CycleOutcome::Quit);
        let rendered = String::from_utf8_lossy(&sink);
        assert!(rendered.contains("RENDERED:"), "the one extracted frame should still have played");

        let failures = control.take_cycle_failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("boom"));
    }
}
