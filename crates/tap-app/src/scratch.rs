use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Path of whichever cycle's scratch directory is currently active, for
/// the panic hook to remove directly. Mirrors `terminal::ENTERED`: under
/// this workspace's `panic = "abort"` release profile, a panic never
/// unwinds, so `ScratchDir`'s own `Drop` impl would simply never run.
static ACTIVE_SCRATCH_ROOT: Mutex<Option<PathBuf>> = Mutex::new(None);

/// A per-cycle scratch directory holding the decoder's numbered image
/// artifacts. Prefers memory-backed storage (`/dev/shm`) since every
/// artifact is deleted again within milliseconds of being written;
/// falls back to the system temp directory when `/dev/shm` is absent or
/// unwritable.
pub struct ScratchDir {
    root: TempDir,
    images_dir: PathBuf,
}

impl ScratchDir {
    /// Create a fresh scratch directory with an `images/` subdirectory.
    /// Removed in full when this value drops, at the end of the cycle.
    ///
    /// # Errors
    /// Returns an error if neither the memory-backed location nor the
    /// system temp fallback is writable.
    pub fn create() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("tapvid-")
            .tempdir_in(Path::new("/dev/shm"))
            .or_else(|_| tempfile::Builder::new().prefix("tapvid-").tempdir())
            .context("failed to create a scratch directory")?;

        let images_dir = root.path().join("images");
        std::fs::create_dir_all(&images_dir).context("failed to create scratch images directory")?;

        #[allow(clippy::unwrap_used)]
        {
            *ACTIVE_SCRATCH_ROOT.lock().unwrap() = Some(root.path().to_path_buf());
        }

        Ok(Self { root, images_dir })
    }

    /// Directory the decoder writes numbered frame images into.
    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Root of the scratch area, mostly useful for logging.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        #[allow(clippy::unwrap_used)]
        {
            *ACTIVE_SCRATCH_ROOT.lock().unwrap() = None;
        }
        // `root: TempDir` drops right after this, removing the tree.
    }
}

/// Best-effort removal of whichever cycle's scratch directory is active,
/// for use from the panic hook alongside terminal restoration — the one
/// place `ScratchDir::drop` is not guaranteed to run.
pub fn remove_active_scratch_best_effort() {
    #[allow(clippy::unwrap_used)]
    let path = ACTIVE_SCRATCH_ROOT.lock().unwrap().take();
    if let Some(path) = path {
        let _ = std::fs::remove_dir_all(path);
    }
}
