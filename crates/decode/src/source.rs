// Frame producer contract shared by every decoder variant

use boombap_core::{AudioFormat, EngineError, SampleFrame};
use std::io::{self, Read};

/// Lazy, forward-only, non-restartable sequence of stereo frames.
///
/// `format` is fixed before the first pull. `pull` fills the front of
/// `frames` and returns how many were written; 0 means the sequence is over.
/// End of stream and read failures both end the sequence, neither panics.
pub trait FrameSource: Send {
    fn format(&self) -> AudioFormat;

    fn pull(&mut self, frames: &mut [SampleFrame]) -> usize;
}

impl FrameSource for Box<dyn FrameSource> {
    fn format(&self) -> AudioFormat {
        (**self).format()
    }

    fn pull(&mut self, frames: &mut [SampleFrame]) -> usize {
        (**self).pull(frames)
    }
}

/// Normalize one little-endian signed 16-bit sample
#[inline]
pub fn pcm16_to_f32(lo: u8, hi: u8) -> f32 {
    i16::from_le_bytes([lo, hi]) as f32 / 32768.0
}

/// Frames read from a byte stream of interleaved 16-bit little-endian stereo PCM.
///
/// Each pull asks the reader for exactly 4 bytes per requested frame. A fill
/// that comes up short (end of data or a read error) delivers the complete
/// frames it got and ends the sequence.
pub struct PcmFrameSource<R> {
    reader: R,
    format: AudioFormat,
    scratch: Vec<u8>,
    ended: bool,
}

impl<R: Read + Send> PcmFrameSource<R> {
    pub fn new(reader: R, format: AudioFormat) -> Self {
        Self {
            reader,
            format,
            scratch: Vec::new(),
            ended: false,
        }
    }
}

impl<R: Read + Send> FrameSource for PcmFrameSource<R> {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn pull(&mut self, frames: &mut [SampleFrame]) -> usize {
        if self.ended || frames.is_empty() {
            return 0;
        }

        let frame_bytes = self.format.bytes_per_frame();
        let wanted = frames.len() * frame_bytes;
        self.scratch.resize(wanted, 0);
        let filled = match fill(&mut self.reader, &mut self.scratch) {
            Ok(filled) => filled,
            Err((filled, e)) => {
                let error = EngineError::DecodeRead(e.to_string());
                log::debug!("PCM {} after {} bytes", error, filled);
                filled
            }
        };
        if filled < wanted {
            self.ended = true;
        }

        let count = filled / frame_bytes;
        let whole = &self.scratch[..count * frame_bytes];
        for (frame, bytes) in frames.iter_mut().zip(whole.chunks_exact(frame_bytes)) {
            *frame = [
                pcm16_to_f32(bytes[0], bytes[1]),
                pcm16_to_f32(bytes[2], bytes[3]),
            ];
        }
        count
    }
}

/// Read until `buf` is full or the reader stops. Errors keep the byte count.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, (usize, io::Error)> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err((filled, e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boombap_core::SILENCE;
    use std::io::Cursor;

    #[test]
    fn test_pcm16_conversion_full_range() {
        for hi in 0..=255u8 {
            for lo in 0..=255u8 {
                let expected = ((hi as u16) << 8 | lo as u16) as i16 as f32 / 32768.0;
                let sample = pcm16_to_f32(lo, hi);
                assert_eq!(sample, expected);
                assert!((-1.0..1.0).contains(&sample));
            }
        }
        assert_eq!(pcm16_to_f32(0x00, 0x80), -1.0);
        assert_eq!(pcm16_to_f32(0xff, 0x7f), 32767.0 / 32768.0);
        assert_eq!(pcm16_to_f32(0x00, 0x00), 0.0);
    }

    #[test]
    fn test_pull_converts_left_then_right() {
        // L = 0x4000 (0.5), R = 0xC000 (-0.5)
        let bytes = vec![0x00, 0x40, 0x00, 0xC0, 0x00, 0x00, 0xFF, 0x7F];
        let mut source = PcmFrameSource::new(Cursor::new(bytes), AudioFormat::stereo16(44_100));

        let mut frames = [SILENCE; 2];
        assert_eq!(source.pull(&mut frames), 2);
        assert_eq!(frames[0], [0.5, -0.5]);
        assert_eq!(frames[1], [0.0, 32767.0 / 32768.0]);
    }

    #[test]
    fn test_short_fill_ends_sequence() {
        // Two full frames and a dangling half frame
        let bytes = vec![0u8; 10];
        let mut source = PcmFrameSource::new(Cursor::new(bytes), AudioFormat::stereo16(44_100));

        let mut frames = [SILENCE; 8];
        assert_eq!(source.pull(&mut frames), 2);
        assert_eq!(source.pull(&mut frames), 0);
        assert_eq!(source.pull(&mut frames), 0);
    }

    #[test]
    fn test_exact_fill_keeps_going() {
        let bytes = vec![0u8; 16];
        let mut source = PcmFrameSource::new(Cursor::new(bytes), AudioFormat::stereo16(44_100));

        let mut frames = [SILENCE; 2];
        assert_eq!(source.pull(&mut frames), 2);
        assert_eq!(source.pull(&mut frames), 2);
        // Reader is exhausted now
        assert_eq!(source.pull(&mut frames), 0);
    }

    /// Hands out data in small slices, then fails
    struct DribbleThenFail {
        remaining: usize,
    }

    impl Read for DribbleThenFail {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            let n = buf.len().min(3).min(self.remaining);
            buf[..n].fill(0);
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_partial_reads_are_assembled_and_error_ends() {
        let mut source = PcmFrameSource::new(
            DribbleThenFail { remaining: 13 },
            AudioFormat::stereo16(22_050),
        );

        let mut frames = [SILENCE; 2];
        // 8 bytes assembled from 3-byte reads
        assert_eq!(source.pull(&mut frames), 2);
        // 5 bytes left, then the error: one frame, then the end
        assert_eq!(source.pull(&mut frames), 1);
        assert_eq!(source.pull(&mut frames), 0);
    }
}
