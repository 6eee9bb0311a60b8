// Resolve + fetch + decode: playlist URL in, ready frame source out

use boombap_core::{CancellationToken, EngineConfig, EngineError, Result};
use boombap_decode::{DecoderFactory, FrameSource};
use boombap_transport_http::{Connection, FetchError, HttpResponse, StreamFetcher};
use std::io::Read;

/// Open the stream a playlist points at.
///
/// Every blocking step runs on the caller's thread. The token is checked
/// between steps, and the stream body is wrapped in a [`Connection`] bound to
/// it so a cancelled session also stops reading mid-decode.
pub fn open_stream(
    fetcher: &dyn StreamFetcher,
    decoders: &dyn DecoderFactory,
    config: &EngineConfig,
    playlist_url: &str,
    token: &CancellationToken,
) -> Result<Box<dyn FrameSource>> {
    let stream_url = resolve_playlist(fetcher, config, playlist_url)?;
    ensure_live(token)?;
    log::info!("Playlist {} resolved to {}", playlist_url, stream_url);

    let response = fetch(fetcher, &stream_url).map_err(|e| EngineError::StreamFetch {
        url: stream_url.clone(),
        message: e.to_string(),
    })?;
    ensure_live(token)?;

    let content_type = response.content_type;
    let connection = Connection::new(response.body, token.clone());
    let source = decoders.open(content_type.as_deref(), Box::new(connection))?;
    ensure_live(token)?;

    let format = source.format();
    log::info!(
        "Stream {} opened: {:?}, {} Hz",
        stream_url,
        content_type,
        format.sample_rate
    );
    Ok(source)
}

/// First `File<N>=` URL of the playlist document
fn resolve_playlist(fetcher: &dyn StreamFetcher, config: &EngineConfig, url: &str) -> Result<String> {
    let fetch_failed = |message: String| EngineError::PlaylistFetch {
        url: url.to_string(),
        message,
    };

    let response = fetch(fetcher, url).map_err(|e| fetch_failed(e.to_string()))?;
    let body = response.body.take(config.max_playlist_bytes);
    let entries = boombap_playlist::resolve(body).map_err(|e| fetch_failed(e.to_string()))?;

    if entries.len() > 1 {
        log::debug!("Playlist {} lists {} entries, using the first", url, entries.len());
    }
    entries
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::MalformedPlaylist { url: url.to_string() })
}

fn fetch(fetcher: &dyn StreamFetcher, url: &str) -> std::result::Result<HttpResponse, FetchError> {
    let response = fetcher.get(url)?;
    if !(200..300).contains(&response.status) {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response)
}

fn ensure_live(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::{FakeDecoders, FakeFetcher};
    use boombap_decode::CodecDispatch;

    fn open(fetcher: &FakeFetcher, url: &str) -> Result<Box<dyn FrameSource>> {
        open_stream(
            fetcher,
            &FakeDecoders,
            &EngineConfig::default(),
            url,
            &CancellationToken::new(),
        )
    }

    #[test]
    fn test_first_entry_is_used() {
        let fetcher = FakeFetcher::new()
            .with("http://pls/a", "audio/x-pls", b"[playlist]\nFile1=http://s/one\nFile2=http://s/two\n")
            .with("http://s/one", "audio/x-test-0.3", b"")
            .with("http://s/two", "text/html", b"");

        let mut source = open(&fetcher, "http://pls/a").unwrap();
        let mut frames = [[0.0f32; 2]; 4];
        assert_eq!(source.pull(&mut frames), 4);
        assert_eq!(frames[0], [0.3, 0.3]);
    }

    #[test]
    fn test_empty_playlist_is_malformed() {
        let fetcher = FakeFetcher::new().with("http://pls/a", "audio/x-pls", b"[playlist]\nNumberOfEntries=0\n");
        match open(&fetcher, "http://pls/a") {
            Err(EngineError::MalformedPlaylist { url }) => assert_eq!(url, "http://pls/a"),
            other => panic!("expected MalformedPlaylist, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_fetch_failures_are_attributed() {
        let fetcher = FakeFetcher::new().with("http://pls/a", "audio/x-pls", b"File1=http://s/missing\n");
        assert!(matches!(
            open(&fetcher, "http://pls/missing"),
            Err(EngineError::PlaylistFetch { .. })
        ));
        match open(&fetcher, "http://pls/a") {
            Err(EngineError::StreamFetch { url, .. }) => assert_eq!(url, "http://s/missing"),
            other => panic!("expected StreamFetch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_error_status_is_a_fetch_failure() {
        let fetcher = FakeFetcher::new()
            .with("http://pls/a", "audio/x-pls", b"File1=http://s/gone\n")
            .with_status("http://s/gone", 404);
        assert!(matches!(
            open(&fetcher, "http://pls/a"),
            Err(EngineError::StreamFetch { .. })
        ));
    }

    #[test]
    fn test_unsupported_content_type() {
        let fetcher = FakeFetcher::new()
            .with("http://pls/a", "audio/x-pls", b"File1=http://s/page\n")
            .with("http://s/page", "text/html", b"<html></html>");
        let result = open_stream(
            &fetcher,
            &CodecDispatch,
            &EngineConfig::default(),
            "http://pls/a",
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(EngineError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_cancelled_token_stops_pipeline() {
        let fetcher = FakeFetcher::new()
            .with("http://pls/a", "audio/x-pls", b"File1=http://s/one\n")
            .with("http://s/one", "audio/x-test-0.3", b"");
        let token = CancellationToken::new();
        token.cancel();
        let result = open_stream(&fetcher, &FakeDecoders, &EngineConfig::default(), "http://pls/a", &token);
        assert!(matches!(result, Err(EngineError::Cancelled)));
        // The stream itself was never requested
        assert_eq!(fetcher.requests(), vec!["http://pls/a".to_string()]);
    }
}
