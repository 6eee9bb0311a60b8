// MPEG Layer III variant: streaming decoder exposed as 16-bit PCM bytes

use crate::codec::Codec;
use crate::demux::PacketStream;
use crate::source::{FrameSource, PcmFrameSource};
use boombap_core::{AudioFormat, Result, SampleFrame};
use std::io::{self, Read};

/// Streaming MP3 decoder read as interleaved s16le stereo bytes
pub struct Mp3PcmStream {
    packets: PacketStream,
    pending: Vec<u8>,
    offset: usize,
    finished: bool,
}

impl Mp3PcmStream {
    /// Fails when the stream header cannot be read
    pub fn new(body: Box<dyn Read + Send + Sync>) -> Result<Self> {
        let packets = PacketStream::open(body, Codec::Mp3)?;
        Ok(Self {
            packets,
            pending: Vec::new(),
            offset: 0,
            finished: false,
        })
    }

    /// Rate declared by the stream
    pub fn sample_rate(&self) -> u32 {
        self.packets.sample_rate()
    }

    fn refill(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.offset = 0;

        let pending = &mut self.pending;
        let more = self.packets.decode_next::<i16, _>(|left, right| {
            pending.extend_from_slice(&left.to_le_bytes());
            pending.extend_from_slice(&right.to_le_bytes());
        });
        match more {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.finished = true;
                Ok(())
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }
}

impl Read for Mp3PcmStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.offset >= self.pending.len() {
            if self.finished {
                return Ok(0);
            }
            self.refill()?;
        }

        let available = &self.pending[self.offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.offset += n;
        Ok(n)
    }
}

/// Pull-based MP3 frame source: 4 PCM bytes per pulled frame
pub struct Mp3Source {
    inner: PcmFrameSource<Mp3PcmStream>,
}

impl Mp3Source {
    pub fn new(body: Box<dyn Read + Send + Sync>) -> Result<Self> {
        let stream = Mp3PcmStream::new(body)?;
        let format = AudioFormat::stereo16(stream.sample_rate());
        Ok(Self {
            inner: PcmFrameSource::new(stream, format),
        })
    }
}

impl FrameSource for Mp3Source {
    fn format(&self) -> AudioFormat {
        self.inner.format()
    }

    fn pull(&mut self, frames: &mut [SampleFrame]) -> usize {
        self.inner.pull(frames)
    }
}
