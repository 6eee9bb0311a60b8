// Vorbis-in-Ogg variant: headers parsed eagerly, frames decoded packet by packet

use crate::codec::Codec;
use crate::demux::PacketStream;
use crate::source::FrameSource;
use boombap_core::{AudioFormat, EngineError, Result, SampleFrame};
use std::io::Read;

pub struct VorbisSource {
    packets: PacketStream,
    format: AudioFormat,
    pending: Vec<SampleFrame>,
    offset: usize,
    finished: bool,
}

impl VorbisSource {
    /// Parse the Ogg container and Vorbis codec headers.
    /// The returned source is ready to pull from.
    pub fn new(body: Box<dyn Read + Send + Sync>) -> Result<Self> {
        let packets = PacketStream::open(body, Codec::Vorbis)?;
        let format = AudioFormat::stereo16(packets.sample_rate());
        Ok(Self {
            packets,
            format,
            pending: Vec::new(),
            offset: 0,
            finished: false,
        })
    }

    fn refill(&mut self) {
        self.pending.clear();
        self.offset = 0;

        let pending = &mut self.pending;
        match self
            .packets
            .decode_next::<f32, _>(|left, right| pending.push([left, right]))
        {
            Ok(true) => {}
            Ok(false) => self.finished = true,
            Err(e) => {
                log::debug!("Vorbis {}, ending", EngineError::DecodeRead(e.to_string()));
                self.finished = true;
            }
        }
    }
}

impl FrameSource for VorbisSource {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn pull(&mut self, frames: &mut [SampleFrame]) -> usize {
        let mut written = 0;
        while written < frames.len() {
            if self.offset >= self.pending.len() {
                if self.finished {
                    break;
                }
                self.refill();
                continue;
            }
            let available = &self.pending[self.offset..];
            let n = available.len().min(frames.len() - written);
            frames[written..written + n].copy_from_slice(&available[..n]);
            self.offset += n;
            written += n;
        }
        written
    }
}
