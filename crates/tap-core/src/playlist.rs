use std::path::{Path, PathBuf};

/// Extensions recognized as playable video, matched case-insensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "ts", "mpg", "mpeg",
];

/// Ordered sequence of media paths with a single mutable cursor.
///
/// Built once from the directory containing the invoking path, filtered
/// to `VIDEO_EXTENSIONS` and sorted lexicographically.
#[derive(Clone, Debug)]
pub struct Playlist {
    paths: Vec<PathBuf>,
    current_index: usize,
}

impl Playlist {
    /// Build a playlist from a single source path: if `source` is itself
    /// a playable video, the playlist is the lexicographically sorted
    /// video files in its parent directory, with the cursor starting on
    /// `source`. If `source`'s directory yields nothing (or has no
    /// parent), the playlist is just `source` on its own.
    #[must_use]
    pub fn from_source(source: &Path) -> Self {
        let dir = source.parent().filter(|p| !p.as_os_str().is_empty());
        let mut paths = dir
            .and_then(|d| std::fs::read_dir(d).ok())
            .map(|entries| {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| is_video_path(path))
                    .collect();
                found.sort();
                found
            })
            .unwrap_or_default();

        if paths.is_empty() {
            paths.push(source.to_path_buf());
        }

        let current_index = paths.iter().position(|p| p == source).unwrap_or(0);

        Self {
            paths,
            current_index,
        }
    }

    /// Number of entries in the playlist.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// `true` if the playlist has no entries (never happens via
    /// `from_source`, but kept for completeness).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Path the cursor currently points at.
    #[must_use]
    pub fn current(&self) -> &Path {
        &self.paths[self.current_index]
    }

    /// Advance the cursor to the next entry. Returns `false` (cursor
    /// unchanged) if already at the last entry and `loop_playlist` is
    /// `false`; with looping, wraps to the first entry.
    pub fn advance(&mut self, loop_playlist: bool) -> bool {
        if self.current_index + 1 < self.paths.len() {
            self.current_index += 1;
            true
        } else if loop_playlist && !self.paths.is_empty() {
            self.current_index = 0;
            true
        } else {
            false
        }
    }

    /// Move the cursor to the previous entry. Returns `false` (cursor
    /// unchanged) if already at the first entry.
    pub fn back(&mut self) -> bool {
        if self.current_index > 0 {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }
}

fn is_video_path(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}
