// Core types shared by every stage of the stream playback engine

pub mod callback;
pub mod cancel;
pub mod config;
pub mod error;
pub mod format;
pub mod state;

// Re-export commonly used types
pub use callback::{CallbackEvent, CallbackManager, PlayerCallback};
pub use cancel::CancellationToken;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use format::{AudioFormat, SampleFrame, SILENCE};
pub use state::{PlayerSnapshot, PlayerState, PlayerStateContainer, SessionId};
