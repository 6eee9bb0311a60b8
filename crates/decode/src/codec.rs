// Decoder selection from the stream's declared content type

use crate::mp3::Mp3Source;
use crate::source::FrameSource;
use crate::vorbis::VorbisSource;
use boombap_core::{EngineError, Result};
use std::fmt;
use std::io::Read;
use symphonia::core::codecs::{CodecType, CODEC_TYPE_MP3, CODEC_TYPE_VORBIS};

/// Open network body handed to a decoder
pub type StreamBody = Box<dyn Read + Send + Sync>;

/// Supported stream encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// `audio/ogg`
    Vorbis,
    /// `audio/mpeg`
    Mp3,
}

impl Codec {
    const ALL: [Codec; 2] = [Codec::Vorbis, Codec::Mp3];

    /// Exact, case-sensitive match on the raw header value
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|codec| content_type == Some(codec.content_type()))
            .ok_or_else(|| EngineError::UnsupportedFormat {
                content_type: content_type.map(str::to_string),
            })
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Codec::Vorbis => "audio/ogg",
            Codec::Mp3 => "audio/mpeg",
        }
    }

    /// File extension the probe is hinted with
    pub fn extension(&self) -> &'static str {
        match self {
            Codec::Vorbis => "ogg",
            Codec::Mp3 => "mp3",
        }
    }

    /// Short name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Vorbis => "vorbis",
            Codec::Mp3 => "mp3",
        }
    }

    /// Symphonia codec a track must carry to be decoded as this codec
    pub fn codec_type(&self) -> CodecType {
        match self {
            Codec::Vorbis => CODEC_TYPE_VORBIS,
            Codec::Mp3 => CODEC_TYPE_MP3,
        }
    }

    /// Build the decoder for this codec over `body`
    pub fn open(self, body: StreamBody) -> Result<Box<dyn FrameSource>> {
        Ok(match self {
            Codec::Vorbis => Box::new(VorbisSource::new(body)?),
            Codec::Mp3 => Box::new(Mp3Source::new(body)?),
        })
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Turns a fetched stream into a frame source
pub trait DecoderFactory: Send + Sync {
    fn open(&self, content_type: Option<&str>, body: StreamBody) -> Result<Box<dyn FrameSource>>;
}

/// Default factory: dispatch on the content type to one of the built-in codecs
#[derive(Debug, Default, Clone, Copy)]
pub struct CodecDispatch;

impl DecoderFactory for CodecDispatch {
    fn open(&self, content_type: Option<&str>, body: StreamBody) -> Result<Box<dyn FrameSource>> {
        // Unsupported types fail before the body is touched
        let codec = Codec::from_content_type(content_type)?;
        log::debug!("Content type {:?} selects {} decoder", content_type, codec);
        codec.open(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_content_type_dispatch() {
        assert_eq!(Codec::from_content_type(Some("audio/ogg")).unwrap(), Codec::Vorbis);
        assert_eq!(Codec::from_content_type(Some("audio/mpeg")).unwrap(), Codec::Mp3);
        assert_eq!(
            Codec::from_content_type(Some(Codec::Vorbis.content_type())).unwrap(),
            Codec::Vorbis
        );
        assert_eq!(Codec::Mp3.to_string(), "mp3");
    }

    #[test]
    fn test_content_type_must_match_exactly() {
        for content_type in ["audio/MPEG", "audio/mpeg; charset=utf-8", " audio/ogg", "text/html", ""] {
            match Codec::from_content_type(Some(content_type)) {
                Err(EngineError::UnsupportedFormat { content_type: Some(ct) }) => {
                    assert_eq!(ct, content_type)
                }
                other => panic!("{:?} should be unsupported, got {:?}", content_type, other),
            }
        }
        assert!(matches!(
            Codec::from_content_type(None),
            Err(EngineError::UnsupportedFormat { content_type: None })
        ));
    }

    struct TouchDetector {
        touched: Arc<AtomicBool>,
    }

    impl Read for TouchDetector {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.touched.store(true, Ordering::SeqCst);
            Ok(0)
        }
    }

    #[test]
    fn test_unsupported_type_never_reads_body() {
        let touched = Arc::new(AtomicBool::new(false));
        let body = Box::new(TouchDetector { touched: touched.clone() });

        let result = CodecDispatch.open(Some("text/html"), body);
        assert!(matches!(result, Err(EngineError::UnsupportedFormat { .. })));
        assert!(!touched.load(Ordering::SeqCst));
    }

    #[test]
    fn test_mpeg_body_labelled_ogg_fails_init() {
        let body = crate::mp3::tests::silent_mp3(20);
        let result = CodecDispatch.open(Some("audio/ogg"), Box::new(Cursor::new(body)));
        assert!(matches!(result, Err(EngineError::DecoderInit { codec: "vorbis", .. })));
    }

    #[test]
    fn test_dispatch_reports_codec_init_failure() {
        let result = CodecDispatch.open(Some("audio/ogg"), Box::new(Cursor::new(Vec::new())));
        assert!(matches!(result, Err(EngineError::DecoderInit { codec: "vorbis", .. })));
    }
}
