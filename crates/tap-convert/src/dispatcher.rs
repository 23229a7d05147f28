use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tap_core::{frame_image_path, CancelScope, PlaybackState};

/// Coarse polling interval for the disk-existence check — the one place
/// the design accepts busy polling, since there is no cheaper
/// cross-process signal for "the decoder wrote another file".
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A render job handed from the dispatcher to the converter pool.
#[derive(Debug, Clone)]
pub struct Job {
    /// Frame index (1-based).
    pub index: u64,
    /// Path to the decoded image artifact.
    pub path: PathBuf,
}

/// Walks frame indices upward from 1, waiting for each image artifact to
/// appear on disk before enqueueing a render job. Terminates once the
/// decoder has finished and the next expected image never showed up.
pub struct Dispatcher;

impl Dispatcher {
    /// Spawn the dispatcher thread. `images_dir` is the scratch
    /// directory the decoder writes into.
    pub fn spawn(
        images_dir: PathBuf,
        state: Arc<PlaybackState>,
        jobs: flume::Sender<Job>,
        cancel: CancelScope,
    ) -> thread::JoinHandle<()> {
        thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || run(&images_dir, &state, &jobs, &cancel))
            .expect("failed to spawn dispatcher thread")
    }
}

fn run(images_dir: &std::path::Path, state: &PlaybackState, jobs: &flume::Sender<Job>, cancel: &CancelScope) {
    let mut index = 1u64;
    loop {
        if cancel.is_cancelled() {
            log::debug!("dispatcher: cancelled at frame {index}");
            return;
        }
        let path = frame_image_path(images_dir, index);
        if path.exists() {
            if jobs.send(Job { index, path }).is_err() {
                log::debug!("dispatcher: converter pool gone, stopping");
                return;
            }
            index += 1;
            continue;
        }
        if state.extraction_complete() {
            log::debug!("dispatcher: extraction complete, no frame {index}, stopping");
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;

    #[test]
    fn dispatches_jobs_as_files_appear_then_stops_at_gap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = Arc::new(PlaybackState::new(0));
        let (tx, rx) = flume::bounded(100);
        let cancel = CancelScope::new();

        fs::write(frame_image_path(dir.path(), 1), b"jpg").expect("write frame 1");
        fs::write(frame_image_path(dir.path(), 2), b"jpg").expect("write frame 2");
        state.mark_extraction_complete();

        let handle = Dispatcher::spawn(dir.path().to_path_buf(), state, tx, cancel);
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut jobs = Vec::new();
        while Instant::now() < deadline {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(job) => jobs.push(job),
                Err(_) => {
                    if handle.is_finished() {
                        break;
                    }
                }
            }
        }
        handle.join().expect("dispatcher thread panicked");
        assert_eq!(jobs.iter().map(|j| j.index).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn cancellation_stops_the_dispatcher_promptly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = Arc::new(PlaybackState::new(0));
        let (tx, _rx) = flume::bounded(100);
        let cancel = CancelScope::new();

        let handle = Dispatcher::spawn(dir.path().to_path_buf(), state, tx, cancel.clone());
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        handle.join().expect("dispatcher thread panicked");
    }
}
