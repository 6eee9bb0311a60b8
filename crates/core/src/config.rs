// Engine configuration

use std::time::Duration;

/// Tunables for the playback engine.
///
/// There is no configuration file; callers start from `Default` and
/// override fields as needed.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Output device buffer, expressed as audio duration
    pub buffer_duration: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub user_agent: String,
    pub max_redirects: u32,
    /// Retries for transport failures (HTTP status errors are not retried)
    pub max_retries: u32,
    /// Upper bound on the playlist document size
    pub max_playlist_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_duration: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(30),
            user_agent: format!("Mozilla/5.0 (compatible; Boombap/{})", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
            max_retries: 2,
            max_playlist_bytes: 64 * 1024,
        }
    }
}
