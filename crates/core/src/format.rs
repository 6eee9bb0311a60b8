// Decoded audio format and sample frame types

use std::time::Duration;

/// One instant of stereo audio, left then right, normalized to [-1.0, 1.0]
pub type SampleFrame = [f32; 2];

/// Silent frame
pub const SILENCE: SampleFrame = [0.0, 0.0];

/// Format declared by a decoder before its first frame is pulled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Always 2: decoders normalize to stereo
    pub channels: u16,
    /// Always 2: the stream is carried as 16-bit samples
    pub bytes_per_sample: u16,
}

impl AudioFormat {
    pub const CHANNELS: u16 = 2;
    pub const BYTES_PER_SAMPLE: u16 = 2;

    /// Stereo 16-bit format at the given rate
    pub fn stereo16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: Self::CHANNELS,
            bytes_per_sample: Self::BYTES_PER_SAMPLE,
        }
    }

    /// Number of frames covering `duration` at this rate, at least one
    pub fn frames_for(&self, duration: Duration) -> usize {
        let frames = (self.sample_rate as u128 * duration.as_nanos()) / 1_000_000_000;
        (frames as usize).max(1)
    }

    /// Bytes one frame occupies in the 16-bit wire representation
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.bytes_per_sample as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_for_hundred_millis() {
        let format = AudioFormat::stereo16(44_100);
        assert_eq!(format.frames_for(Duration::from_millis(100)), 4_410);

        let format = AudioFormat::stereo16(48_000);
        assert_eq!(format.frames_for(Duration::from_millis(100)), 4_800);
    }

    #[test]
    fn test_frames_for_never_zero() {
        let format = AudioFormat::stereo16(8_000);
        assert_eq!(format.frames_for(Duration::ZERO), 1);
    }

    #[test]
    fn test_stereo16_layout() {
        let format = AudioFormat::stereo16(22_050);
        assert_eq!(format.channels, 2);
        assert_eq!(format.bytes_per_sample, 2);
        assert_eq!(format.bytes_per_frame(), 4);
    }
}
