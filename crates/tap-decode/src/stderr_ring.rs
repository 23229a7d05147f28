use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

/// Bound on how much decoder stderr we retain for error reporting.
const RING_CAPACITY_BYTES: usize = 4096;

/// A bounded tail of a child process's stderr, filled by a background
/// thread so reading it never blocks the decoder's stdout pipe.
#[derive(Clone)]
pub struct StderrRing {
    buf: Arc<Mutex<VecDeque<u8>>>,
}

impl StderrRing {
    /// Spawn a thread that drains `stderr` into a capped ring buffer
    /// until EOF or the pipe errors out.
    pub fn spawn(mut stderr: impl Read + Send + 'static) -> Self {
        let buf = Arc::new(Mutex::new(VecDeque::with_capacity(RING_CAPACITY_BYTES)));
        let writer = Arc::clone(&buf);
        thread::Builder::new()
            .name("decoder-stderr".to_string())
            .spawn(move || {
                let mut chunk = [0u8; 512];
                loop {
                    match stderr.read(&mut chunk) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => {
                            #[allow(clippy::unwrap_used)]
                            let mut guard = writer.lock().unwrap();
                            guard.extend(&chunk[..n]);
                            while guard.len() > RING_CAPACITY_BYTES {
                                guard.pop_front();
                            }
                        }
                    }
                }
            })
            .ok();
        Self { buf }
    }

    /// Snapshot the captured tail as lossy UTF-8.
    #[must_use]
    pub fn tail(&self) -> String {
        #[allow(clippy::unwrap_used)]
        let guard = self.buf.lock().unwrap();
        let bytes: Vec<u8> = guard.iter().copied().collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn captures_small_output() {
        let ring = StderrRing::spawn(Cursor::new(b"frame error on 12\n".to_vec()));
        thread::sleep(Duration::from_millis(50));
        assert!(ring.tail().contains("frame error"));
    }

    #[test]
    fn caps_to_ring_capacity() {
        let big = vec![b'x'; RING_CAPACITY_BYTES * 3];
        let ring = StderrRing::spawn(Cursor::new(big));
        thread::sleep(Duration::from_millis(100));
        assert!(ring.tail().len() <= RING_CAPACITY_BYTES);
    }
}
