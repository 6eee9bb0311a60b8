// Caller-driven sink: frames leave only when the owner calls render()

use crate::feed::FeedQueue;
use crate::sink::{CompletionCallback, GainControl, OutputSink};
use boombap_core::{AudioFormat, Result};
use boombap_decode::FrameSource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Device periods held in the ring
pub(crate) const RING_PERIODS: usize = 4;

/// Output sink without a device.
///
/// Useful for headless hosts and tests: the owner pulls interleaved stereo
/// samples at whatever pace it likes.
pub struct PullSink {
    queue: Arc<FeedQueue>,
    format: Mutex<Option<AudioFormat>>,
}

impl PullSink {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(FeedQueue::new()),
            format: Mutex::new(None),
        }
    }

    /// Fill `output` with interleaved L/R samples. Returns frames produced
    /// from the current source; the remainder is silence.
    pub fn render(&self, output: &mut [f32]) -> usize {
        self.queue.render(output)
    }

    /// Last configured format
    pub fn format(&self) -> Option<AudioFormat> {
        *self.format.lock()
    }

    pub fn is_active(&self) -> bool {
        self.queue.is_active()
    }
}

impl Default for PullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for PullSink {
    fn configure(&self, format: AudioFormat, buffer: Duration) -> Result<()> {
        let mut current = self.format.lock();
        if *current != Some(format) {
            self.queue.resize(format.frames_for(buffer) * RING_PERIODS);
            *current = Some(format);
        }
        Ok(())
    }

    fn enqueue(&self, source: Box<dyn FrameSource>, on_complete: CompletionCallback) -> Result<()> {
        self.queue.enqueue(source, on_complete)
    }

    fn silence(&self) {
        self.queue.silence();
    }

    fn gain(&self) -> &GainControl {
        self.queue.gain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::tests::ConstantSource;

    #[test]
    fn test_configure_sizes_ring_from_buffer_duration() {
        let sink = PullSink::new();
        let format = AudioFormat::stereo16(44_100);
        sink.configure(format, Duration::from_millis(100)).unwrap();
        assert_eq!(sink.format(), Some(format));
        assert_eq!(sink.queue.capacity(), 4_410 * RING_PERIODS);
    }

    #[test]
    fn test_render_through_trait_object() {
        let sink = Arc::new(PullSink::new());
        let output: Arc<dyn OutputSink> = sink.clone();
        output.gain().set(1.0);
        output
            .enqueue(Box::new(ConstantSource { value: 0.5, remaining: 64 }), Box::new(|| {}))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let mut frames = 0;
        let mut out = [0.0f32; 256];
        while frames < 64 && std::time::Instant::now() < deadline {
            frames += sink.render(&mut out);
        }
        assert_eq!(frames, 64);
    }
}
