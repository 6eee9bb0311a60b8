// Error taxonomy for the stream playback engine

use thiserror::Error;

/// Every failure the engine can report.
///
/// Session failures never escape the controller as panics or `Err` returns;
/// they are absorbed and published once through
/// [`CallbackEvent::Error`](crate::CallbackEvent::Error).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The playlist document could not be fetched or read
    #[error("failed to fetch playlist {url}: {message}")]
    PlaylistFetch { url: String, message: String },

    /// The playlist was readable but held no `File<N>=` entry
    #[error("playlist {url} contains no File= entries")]
    MalformedPlaylist { url: String },

    /// The resolved stream URL could not be fetched
    #[error("failed to fetch stream {url}: {message}")]
    StreamFetch { url: String, message: String },

    /// Content type missing or not one of the supported codecs
    #[error("unsupported stream content type: {}", content_type.as_deref().unwrap_or("<missing>"))]
    UnsupportedFormat { content_type: Option<String> },

    /// Container or codec headers could not be parsed
    #[error("failed to initialize {codec} decoder: {message}")]
    DecoderInit { codec: &'static str, message: String },

    /// A read failed mid-stream. Decoders treat this as end of stream.
    #[error("decode read failed: {0}")]
    DecodeRead(String),

    /// Station index outside the catalog
    #[error("station index {index} out of range (catalog has {len} stations)")]
    StationOutOfRange { index: usize, len: usize },

    /// Audio output device could not be opened or driven
    #[error("output device error: {0}")]
    Device(String),

    /// The session was stopped or superseded before it could start playing
    #[error("session cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Short, stable name of the error kind, handy for status lines
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::PlaylistFetch { .. } => "playlist-fetch",
            EngineError::MalformedPlaylist { .. } => "malformed-playlist",
            EngineError::StreamFetch { .. } => "stream-fetch",
            EngineError::UnsupportedFormat { .. } => "unsupported-format",
            EngineError::DecoderInit { .. } => "decoder-init",
            EngineError::DecodeRead(_) => "decode-read",
            EngineError::StationOutOfRange { .. } => "station-out-of-range",
            EngineError::Device(_) => "device",
            EngineError::Cancelled => "cancelled",
            EngineError::Io(_) => "io",
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
