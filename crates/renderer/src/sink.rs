// Output sink abstraction

use boombap_core::{AudioFormat, Result};
use boombap_decode::FrameSource;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Fired exactly once per enqueued source, on natural exhaustion or when
/// the source is superseded by `silence()`
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Audio device abstraction consuming frames at a fixed rate.
///
/// The sink carries frames from at most one source at a time.
pub trait OutputSink: Send + Sync {
    /// Prepare the device for `format` with a buffer of roughly `buffer` audio
    fn configure(&self, format: AudioFormat, buffer: Duration) -> Result<()>;

    /// Start feeding `source`. Any source already playing is silenced first.
    fn enqueue(&self, source: Box<dyn FrameSource>, on_complete: CompletionCallback) -> Result<()>;

    /// Stop and discard whatever is enqueued. Idempotent.
    fn silence(&self);

    /// Live gain applied to every rendered sample
    fn gain(&self) -> &GainControl;
}

/// Gain in [0.0, 1.0], stored as f32 bits so the device callback reads it lock-free
#[derive(Debug)]
pub struct GainControl {
    bits: AtomicU32,
}

impl GainControl {
    pub fn new(gain: f32) -> Self {
        Self {
            bits: AtomicU32::new(clamp_gain(gain).to_bits()),
        }
    }

    /// Set the gain, clamped to [0.0, 1.0]. Returns the stored value.
    pub fn set(&self, gain: f32) -> f32 {
        let gain = clamp_gain(gain);
        self.bits.store(gain.to_bits(), Ordering::Relaxed);
        gain
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for GainControl {
    fn default() -> Self {
        Self::new(0.5)
    }
}

fn clamp_gain(gain: f32) -> f32 {
    if gain.is_nan() {
        0.0
    } else {
        gain.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_clamps() {
        let gain = GainControl::default();
        assert_eq!(gain.get(), 0.5);
        assert_eq!(gain.set(1.5), 1.0);
        assert_eq!(gain.set(-0.2), 0.0);
        assert_eq!(gain.set(f32::NAN), 0.0);
        assert_eq!(gain.set(0.25), 0.25);
        assert_eq!(gain.get(), 0.25);
    }
}
