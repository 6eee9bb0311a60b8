// Stream decoders: Vorbis-in-Ogg and MPEG Layer III, both producing stereo f32 frames

pub mod codec;
pub mod demux;
pub mod mp3;
pub mod source;
pub mod vorbis;

pub use codec::{Codec, CodecDispatch, DecoderFactory, StreamBody};
pub use mp3::{Mp3PcmStream, Mp3Source};
pub use source::{pcm16_to_f32, FrameSource, PcmFrameSource};
pub use vorbis::VorbisSource;
