// HTTP client configuration and utilities

use boombap_core::EngineConfig;
use std::fmt;
use std::io::Read;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a single GET
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, DNS or protocol failure
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success status
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Open response whose body has not been read yet
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Content-Type` header value, unmodified
    pub content_type: Option<String>,
    pub body: Box<dyn Read + Send + Sync>,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Source of HTTP GET responses.
/// `HttpClient` is the network implementation; tests substitute in-memory ones.
pub trait StreamFetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Create a configured HTTP agent with proper timeouts and settings
pub fn create_http_agent(config: &EngineConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(config.connect_timeout)
        .timeout_read(config.read_timeout)
        .timeout_write(config.write_timeout)
        .user_agent(&config.user_agent)
        .redirects(config.max_redirects)
        .build()
}

/// HTTP client wrapper
pub struct HttpClient {
    agent: ureq::Agent,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            agent: create_http_agent(config),
            max_retries: config.max_retries,
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl StreamFetcher for HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = retry_request(&self.agent, url, self.max_retries)?;
        let status = response.status();
        let content_type = response.header("Content-Type").map(str::to_string);
        log::debug!("GET {} -> {} ({:?})", url, status, content_type);

        Ok(HttpResponse {
            status,
            content_type,
            body: response.into_reader(),
        })
    }
}

/// Retry a request with exponential backoff.
/// Only transport failures are retried; an HTTP error status is final.
pub fn retry_request(
    agent: &ureq::Agent,
    url: &str,
    max_retries: u32,
) -> Result<ureq::Response, FetchError> {
    let mut attempt = 0;

    loop {
        match agent.get(url).call() {
            Ok(response) => return Ok(response),
            Err(ureq::Error::Status(status, _)) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                if attempt >= max_retries {
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        message: transport.to_string(),
                    });
                }
                let delay = backoff_delay(attempt);
                log::warn!(
                    "Request to {} failed (attempt {}): {}, retrying after {:?}",
                    url,
                    attempt + 1,
                    transport,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

/// 500ms, 1s, 2s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(500 * 2u64.pow(attempt.min(6)))
}
