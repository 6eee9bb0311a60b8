// Feed queue: moves frames from the current source into the playout ring

use crate::sink::{CompletionCallback, GainControl};
use boombap_core::{EngineError, Result, SampleFrame, SILENCE};
use boombap_decode::FrameSource;
use boombap_ringbuffer::FrameRing;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Frames pulled from the source per iteration
const PULL_FRAMES: usize = 512;
/// Wait between write attempts when the ring is full
const FULL_BACKOFF: Duration = Duration::from_millis(5);
/// Upper bound on waiting for the device to play out an ended source
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
/// Ring size before the first `resize`
const DEFAULT_CAPACITY_FRAMES: usize = 44_100;

struct Playout {
    ring: FrameRing,
    // Bumped on every enqueue and silence. A feed thread writes only while
    // its generation is current, checked under the same lock as the write.
    generation: u64,
    active: Option<CompletionCallback>,
}

/// Single-slot feeder shared by the sink implementations.
///
/// One feed thread per enqueued source pulls frames and writes them into the
/// ring. The device side calls [`FeedQueue::render`].
pub struct FeedQueue {
    playout: Mutex<Playout>,
    gain: GainControl,
}

impl FeedQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_FRAMES)
    }

    pub fn with_capacity(capacity_frames: usize) -> Self {
        Self {
            playout: Mutex::new(Playout {
                ring: FrameRing::new(capacity_frames),
                generation: 0,
                active: None,
            }),
            gain: GainControl::default(),
        }
    }

    pub fn gain(&self) -> &GainControl {
        &self.gain
    }

    pub fn capacity(&self) -> usize {
        self.playout.lock().ring.capacity()
    }

    /// Resize the ring. Buffered frames are discarded.
    pub fn resize(&self, capacity_frames: usize) {
        let mut playout = self.playout.lock();
        if playout.ring.capacity() != capacity_frames {
            log::debug!(
                "Resizing playout ring {} -> {} frames",
                playout.ring.capacity(),
                capacity_frames
            );
            playout.ring.resize(capacity_frames);
        }
    }

    /// Whether a source is currently enqueued
    pub fn is_active(&self) -> bool {
        self.playout.lock().active.is_some()
    }

    /// Replace whatever is playing with `source`
    pub fn enqueue(
        self: &Arc<Self>,
        source: Box<dyn FrameSource>,
        on_complete: CompletionCallback,
    ) -> Result<()> {
        let (generation, superseded) = {
            let mut playout = self.playout.lock();
            playout.generation += 1;
            playout.ring.clear();
            let superseded = playout.active.replace(on_complete);
            (playout.generation, superseded)
        };
        if let Some(callback) = superseded {
            callback();
        }

        let queue = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("boombap-feed".to_string())
            .spawn(move || queue.feed(generation, source));

        if let Err(e) = spawned {
            log::error!("Failed to spawn feed thread: {}", e);
            if let Some(callback) = self.release(generation) {
                callback();
            }
            return Err(EngineError::Device(format!("failed to spawn feed thread: {}", e)));
        }
        Ok(())
    }

    /// Discard buffered frames and detach the current source. Idempotent.
    pub fn silence(&self) {
        let superseded = {
            let mut playout = self.playout.lock();
            playout.generation += 1;
            playout.ring.clear();
            playout.active.take()
        };
        if let Some(callback) = superseded {
            log::debug!("Silenced active source");
            callback();
        }
    }

    /// Fill an interleaved stereo device buffer. Frames the ring cannot
    /// supply are zero. Returns the number of frames taken from the ring.
    pub fn render(&self, output: &mut [f32]) -> usize {
        let gain = self.gain.get();
        let frames = self.playout.lock().ring.read_interleaved(output, gain);
        output[frames * 2..].fill(0.0);
        frames
    }

    fn feed(&self, generation: u64, mut source: Box<dyn FrameSource>) {
        let mut chunk = vec![SILENCE; PULL_FRAMES];
        let mut total = 0u64;

        loop {
            if !self.is_current(generation) {
                log::debug!("[feed {}] superseded after {} frames", generation, total);
                return;
            }

            let pulled = source.pull(&mut chunk);
            if pulled == 0 {
                break;
            }

            let mut written = 0;
            while written < pulled {
                match self.write_current(generation, &chunk[written..pulled]) {
                    None => {
                        log::debug!("[feed {}] superseded after {} frames", generation, total);
                        return;
                    }
                    Some(0) => thread::sleep(FULL_BACKOFF),
                    Some(n) => written += n,
                }
            }
            total += pulled as u64;
        }

        // Closes the decoder and, through it, the connection
        drop(source);
        log::debug!("[feed {}] exhausted after {} frames", generation, total);

        if !self.wait_drained(generation) {
            return;
        }
        if let Some(callback) = self.release(generation) {
            callback();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.playout.lock().generation == generation
    }

    fn write_current(&self, generation: u64, frames: &[SampleFrame]) -> Option<usize> {
        let mut playout = self.playout.lock();
        if playout.generation != generation {
            return None;
        }
        Some(playout.ring.write(frames))
    }

    /// Returns false if superseded while waiting
    fn wait_drained(&self, generation: u64) -> bool {
        let deadline = Instant::now() + DRAIN_TIMEOUT;
        loop {
            {
                let playout = self.playout.lock();
                if playout.generation != generation {
                    return false;
                }
                if playout.ring.available_read() == 0 {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                log::debug!("[feed {}] drain timed out", generation);
                return true;
            }
            thread::sleep(FULL_BACKOFF);
        }
    }

    fn release(&self, generation: u64) -> Option<CompletionCallback> {
        let mut playout = self.playout.lock();
        if playout.generation == generation {
            playout.active.take()
        } else {
            None
        }
    }
}

impl Default for FeedQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use boombap_core::AudioFormat;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Emits `remaining` frames of `value`, then ends
    pub(crate) struct ConstantSource {
        pub value: f32,
        pub remaining: usize,
    }

    impl FrameSource for ConstantSource {
        fn format(&self) -> AudioFormat {
            AudioFormat::stereo16(44_100)
        }

        fn pull(&mut self, frames: &mut [SampleFrame]) -> usize {
            let n = frames.len().min(self.remaining);
            frames[..n].fill([self.value, self.value]);
            self.remaining -= n;
            n
        }
    }

    fn counter() -> (Arc<AtomicUsize>, CompletionCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn wait_until(mut f: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if f() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_idle_renders_zeros() {
        let queue = FeedQueue::with_capacity(64);
        let mut out = [1.0f32; 32];
        assert_eq!(queue.render(&mut out), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_applies_live_gain() {
        let queue = Arc::new(FeedQueue::with_capacity(4096));
        queue.gain().set(1.0);
        let (_, done) = counter();
        let source = ConstantSource { value: 0.8, remaining: usize::MAX };
        queue.enqueue(Box::new(source), done).unwrap();

        assert!(wait_until(|| {
            let mut out = [0.0f32; 8];
            queue.render(&mut out) == 4 && out.iter().all(|&s| (s - 0.8).abs() < 1e-6)
        }));

        queue.gain().set(0.5);
        assert!(wait_until(|| {
            let mut out = [0.0f32; 8];
            queue.render(&mut out) == 4 && out.iter().all(|&s| (s - 0.4).abs() < 1e-6)
        }));
        queue.silence();
    }

    #[test]
    fn test_natural_end_completes_once() {
        let queue = Arc::new(FeedQueue::with_capacity(4096));
        let (count, done) = counter();
        let source = ConstantSource { value: 0.1, remaining: 1000 };
        queue.enqueue(Box::new(source), done).unwrap();

        let mut rendered = 0;
        assert!(wait_until(|| {
            let mut out = [0.0f32; 256];
            rendered += queue.render(&mut out);
            count.load(Ordering::SeqCst) == 1
        }));
        assert_eq!(rendered, 1000);
        assert!(!queue.is_active());

        // Nothing can fire it again
        queue.silence();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_silence_completes_once_and_is_idempotent() {
        let queue = Arc::new(FeedQueue::with_capacity(256));
        queue.silence();

        let (count, done) = counter();
        let source = ConstantSource { value: 0.3, remaining: usize::MAX };
        queue.enqueue(Box::new(source), done).unwrap();
        assert!(queue.is_active());

        queue.silence();
        queue.silence();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!queue.is_active());

        let mut out = [1.0f32; 64];
        assert_eq!(queue.render(&mut out), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_superseded_source_never_leaks_frames() {
        let queue = Arc::new(FeedQueue::with_capacity(512));
        let (first_count, first_done) = counter();
        let (tx, rx) = mpsc::channel();
        queue
            .enqueue(Box::new(ConstantSource { value: 0.25, remaining: usize::MAX }), first_done)
            .unwrap();
        thread::sleep(Duration::from_millis(20));

        queue
            .enqueue(
                Box::new(ConstantSource { value: 0.75, remaining: usize::MAX }),
                Box::new(move || {
                    let _ = tx.send(());
                }),
            )
            .unwrap();
        assert_eq!(first_count.load(Ordering::SeqCst), 1);

        queue.gain().set(1.0);
        for _ in 0..200 {
            let mut out = [0.0f32; 128];
            let frames = queue.render(&mut out);
            assert!(out[..frames * 2].iter().all(|&s| (s - 0.75).abs() < 1e-6));
            thread::sleep(Duration::from_millis(1));
        }

        queue.silence();
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_resize_discards_buffered_frames() {
        let queue = FeedQueue::with_capacity(64);
        queue.playout.lock().ring.write(&[[0.5, 0.5]; 32]);
        queue.resize(128);
        assert_eq!(queue.capacity(), 128);

        let mut out = [1.0f32; 16];
        assert_eq!(queue.render(&mut out), 0);
    }
}
