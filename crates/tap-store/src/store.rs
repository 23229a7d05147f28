use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tap_core::cancel::CancelScope;

/// How long each readiness/room-available wait parks before re-checking
/// cancellation. The store's own condvars are broadcast on every state
/// change, so this is a safety net against missed wakeups, not the
/// primary signaling path.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Inner {
    /// Rendered frame bytes, keyed by absolute frame index. `None` marks
    /// a frame the converter explicitly skipped.
    entries: HashMap<u64, Option<Arc<[u8]>>>,
    /// Highest index `k` such that every frame from the store's starting
    /// index through `k` has an entry. `None` means even the first frame
    /// has not landed yet.
    last_rendered_frame: Option<u64>,
    /// Lowest index still eligible for a `put` without blocking; frames
    /// below this have been consumed or skipped past and their slots
    /// freed.
    floor: u64,
    capacity: usize,
    total_frames: u64,
    extraction_complete: bool,
}

impl Inner {
    fn ready_up_to(&self, index: u64) -> bool {
        let contiguous_ready = self.last_rendered_frame.is_some_and(|lrf| lrf >= index);
        let past_known_end = self.extraction_complete && self.total_frames > 0 && index > self.total_frames;
        contiguous_ready || past_known_end
    }

    fn recompute_frontier(&mut self) {
        // `floor` only moves once contiguity already reached it, so before
        // the first fill it still holds the store's starting index —
        // whatever that is (frame indices are 1-based in this player).
        let mut next = self.last_rendered_frame.map_or(self.floor, |lrf| lrf + 1);
        while self.entries.contains_key(&next) {
            self.last_rendered_frame = Some(next);
            next += 1;
        }
    }
}

/// Bounded ordered buffer of rendered frames, addressed by frame index,
/// with readiness and room-available signaling.
pub struct FrameStore {
    inner: Mutex<Inner>,
    readiness: Condvar,
    room_available: Condvar,
}

impl FrameStore {
    /// `capacity` bounds how many frames may be buffered ahead of the
    /// playback floor at once (the `--buffer-frames` setting). `start_index`
    /// is the first frame index the store will ever see (`1` for the
    /// playback pipeline, where frame indices start at 1).
    #[must_use]
    pub fn new(capacity: usize, start_index: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                last_rendered_frame: None,
                floor: start_index,
                capacity: capacity.max(1),
                total_frames: 0,
                extraction_complete: false,
            }),
            readiness: Condvar::new(),
            room_available: Condvar::new(),
        }
    }

    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Record the estimated total frame count for this cycle (0 = unknown).
    pub fn set_total_frames(&self, total: u64) {
        self.lock().total_frames = total;
        self.readiness.notify_all();
    }

    /// Mark that the decode+convert pipeline will never produce another
    /// frame, waking any waiter parked on an index beyond what actually
    /// arrived.
    pub fn mark_extraction_complete(&self) {
        self.lock().extraction_complete = true;
        self.readiness.notify_all();
    }

    /// Write a rendered frame at `index`, backed by the readiness
    /// condvar on the same lock that guards the store so no wakeup is
    /// lost. Blocks while `index` sits beyond
    /// the current window, providing producer-side backpressure; gives
    /// up and drops the frame if cancelled first.
    pub fn put(&self, index: u64, data: Option<Arc<[u8]>>, cancel: &CancelScope) {
        let mut guard = self.lock();
        while index >= guard.floor + guard.capacity as u64 && !cancel.is_cancelled() {
            let (g, _) = {
                #[allow(clippy::unwrap_used)]
                self.room_available.wait_timeout(guard, POLL_INTERVAL).unwrap()
            };
            guard = g;
        }
        if cancel.is_cancelled() || index < guard.floor {
            return;
        }
        guard.entries.insert(index, data);
        guard.recompute_frontier();
        drop(guard);
        self.readiness.notify_all();
    }

    /// True if `index` is already resolvable without blocking (either
    /// rendered, or known to be past the end of the stream).
    #[must_use]
    pub fn ready_up_to(&self, index: u64) -> bool {
        self.lock().ready_up_to(index)
    }

    /// Park until `index` is ready or cancellation is observed. Returns
    /// whether the wait ended with readiness (as opposed to cancellation).
    pub fn wait(&self, index: u64, cancel: &CancelScope) -> bool {
        let mut guard = self.lock();
        while !guard.ready_up_to(index) && !cancel.is_cancelled() {
            let (g, _) = {
                #[allow(clippy::unwrap_used)]
                self.readiness.wait_timeout(guard, POLL_INTERVAL).unwrap()
            };
            guard = g;
        }
        guard.ready_up_to(index)
    }

    /// Fetch a frame that has already been established as ready, without
    /// removing it from the store. Returns `None` for a skipped frame or
    /// an index past the end of the stream.
    #[must_use]
    pub fn get(&self, index: u64) -> Option<Arc<[u8]>> {
        self.lock().entries.get(&index).cloned().flatten()
    }

    /// Wait for `index`, then consume it: fetches the frame and advances
    /// the retained floor past it, freeing its slot and notifying any
    /// producer blocked on room. This is the normal playback read path.
    pub fn take(&self, index: u64, cancel: &CancelScope) -> Option<Arc<[u8]>> {
        if !self.wait(index, cancel) {
            return None;
        }
        let frame = {
            let mut guard = self.lock();
            let frame = guard.entries.remove(&index).flatten();
            if index >= guard.floor {
                guard.floor = index + 1;
            }
            frame
        };
        self.room_available.notify_all();
        frame
    }

    /// Advance the retained floor directly to `new_floor`, discarding
    /// any buffered frames below it. Used on forward seek, where frames
    /// between the old and new position are dropped unread.
    pub fn advance_floor(&self, new_floor: u64) {
        {
            let mut guard = self.lock();
            if new_floor <= guard.floor {
                return;
            }
            guard.entries.retain(|index, _| *index >= new_floor);
            guard.floor = new_floor;
        }
        self.room_available.notify_all();
    }

    /// The current contiguous high-water mark, or `None` if the first
    /// frame hasn't landed yet.
    #[must_use]
    pub fn last_rendered_frame(&self) -> Option<u64> {
        self.lock().last_rendered_frame
    }
}
