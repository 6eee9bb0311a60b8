// Packet stream over a non-seekable network body using Symphonia

use crate::codec::Codec;
use boombap_core::{EngineError, Result};
use std::io::{self, Read};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::conv::ConvertibleSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Container reader plus codec decoder for the stream's first `codec` track
pub struct PacketStream {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    codec: Codec,
}

impl PacketStream {
    /// Probe the container and build the codec decoder.
    /// Every header failure is reported as `DecoderInit` for `codec`,
    /// including a container whose tracks carry some other codec.
    pub fn open(body: Box<dyn Read + Send + Sync>, codec: Codec) -> Result<Self> {
        let init_error = |message: String| EngineError::DecoderInit {
            codec: codec.name(),
            message,
        };

        let source = ReadOnlySource::new(body);
        let media_source_stream = MediaSourceStream::new(Box::new(source), Default::default());

        let probe_result = symphonia::default::get_probe()
            .format(
                &hint_for(codec),
                media_source_stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| init_error(format!("failed to probe stream: {}", e)))?;

        let format_reader = probe_result.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec == codec.codec_type())
            .ok_or_else(|| init_error(format!("stream has no {} track", codec)))?;
        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| init_error("sample rate not specified".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| init_error(format!("failed to create decoder: {}", e)))?;

        log::info!("Opened {} stream: {}Hz, track {}", codec, sample_rate, track_id);

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            sample_rate,
            codec,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode the next packet of our track and hand each frame to `emit` as a
    /// stereo pair: mono is duplicated, channels past the second are dropped.
    ///
    /// Returns `Ok(false)` at end of stream. Corrupt packets are skipped.
    pub fn decode_next<S, F>(&mut self, mut emit: F) -> io::Result<bool>
    where
        S: Sample + ConvertibleSample,
        F: FnMut(S, S),
    {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(SymphoniaError::IoError(e)) => return Err(e),
                Err(SymphoniaError::ResetRequired) => {
                    log::info!("{} stream requested a decoder reset, ending", self.codec);
                    return Ok(false);
                }
                Err(e) => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string()));
                }
            };

            // Only decode packets for our track
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(message)) => {
                    log::debug!("Skipping corrupt {} packet: {}", self.codec, message);
                    continue;
                }
                Err(SymphoniaError::IoError(e)) => return Err(e),
                Err(e) => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string()));
                }
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            if channels == 0 || decoded.frames() == 0 {
                continue;
            }

            let mut samples = SampleBuffer::<S>::new(decoded.capacity() as u64, spec);
            samples.copy_interleaved_ref(decoded);

            for frame in samples.samples().chunks_exact(channels) {
                let left = frame[0];
                let right = if channels > 1 { frame[1] } else { frame[0] };
                emit(left, right);
            }
            return Ok(true);
        }
    }
}

/// Hint for the declared codec, so the probe tries the right container first
fn hint_for(codec: Codec) -> Hint {
    let mut hint = Hint::new();
    hint.mime_type(codec.content_type());
    hint.with_extension(codec.extension());
    hint
}
