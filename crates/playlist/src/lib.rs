// Playlist indirection resolver
// Extracts the stream URLs listed as `File<N>=<url>` lines

use std::io::{self, BufRead, BufReader, Read};

const ENTRY_PREFIX: &str = "File";

/// Every `File<N>=` value in the document, in line order.
///
/// A line qualifies when it starts with `File` (case-sensitive, no leading
/// whitespace) and contains `=`; the text after the first `=` is taken as is.
/// Other lines are ignored. An empty result is not an error here: the caller
/// decides what "no playable stream" means. Read failures propagate.
pub fn resolve<R: Read>(reader: R) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(reader);
    let mut urls = Vec::new();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(strip_line_ending(&raw));
        if let Some(url) = parse_entry(&line) {
            urls.push(url.to_string());
        }
    }

    log::debug!("Playlist resolved to {} entries", urls.len());
    Ok(urls)
}

/// First stream URL of the document, the only one playback uses
pub fn first_stream_url<R: Read>(reader: R) -> io::Result<Option<String>> {
    Ok(resolve(reader)?.into_iter().next())
}

/// Value of a `File<N>=` line, or `None` for any other line
pub fn parse_entry(line: &str) -> Option<&str> {
    if !line.starts_with(ENTRY_PREFIX) {
        return None;
    }
    line.split_once('=').map(|(_, value)| value)
}

fn strip_line_ending(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SOMA_PLS: &str = "[playlist]\n\
        numberofentries=3\n\
        File1=https://ice1.somafm.com/groovesalad-256-mp3\n\
        Title1=SomaFM: Groove Salad (#1): A nicely chilled plate of ambient/downtempo beats and grooves.\n\
        Length1=-1\n\
        File2=https://ice2.somafm.com/groovesalad-256-mp3\n\
        Title2=SomaFM: Groove Salad (#2)\n\
        Length2=-1\n\
        File3=https://ice4.somafm.com/groovesalad-256-mp3\n\
        Version=2\n";

    #[test]
    fn test_resolve_keeps_line_order() {
        let urls = resolve(Cursor::new(SOMA_PLS)).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://ice1.somafm.com/groovesalad-256-mp3",
                "https://ice2.somafm.com/groovesalad-256-mp3",
                "https://ice4.somafm.com/groovesalad-256-mp3",
            ]
        );
    }

    #[test]
    fn test_first_stream_url() {
        let first = first_stream_url(Cursor::new(SOMA_PLS)).unwrap();
        assert_eq!(first.as_deref(), Some("https://ice1.somafm.com/groovesalad-256-mp3"));
    }

    #[test]
    fn test_no_entries_is_empty_not_error() {
        let doc = "[playlist]\nnumberofentries=0\nVersion=2\n";
        assert!(resolve(Cursor::new(doc)).unwrap().is_empty());
        assert!(first_stream_url(Cursor::new("")).unwrap().is_none());
    }

    #[test]
    fn test_value_is_not_trimmed() {
        let urls = resolve(Cursor::new("File1=http://a/b  \r\nFile2=x=y\n")).unwrap();
        // Line ending stripped, trailing spaces kept, split on the first '=' only
        assert_eq!(urls, vec!["http://a/b  ", "x=y"]);
    }

    #[test]
    fn test_prefix_rules() {
        assert_eq!(parse_entry("File1=http://a"), Some("http://a"));
        assert_eq!(parse_entry("Files=http://a"), Some("http://a"));
        assert_eq!(parse_entry(" File1=http://a"), None);
        assert_eq!(parse_entry("file1=http://a"), None);
        assert_eq!(parse_entry("File1 http://a"), None);
        assert_eq!(parse_entry("Title1=File1=http://a"), None);
    }

    #[test]
    fn test_last_line_without_newline() {
        let urls = resolve(Cursor::new("Version=2\nFile1=http://tail")).unwrap();
        assert_eq!(urls, vec!["http://tail"]);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_read_failure_propagates() {
        let err = resolve(FailingReader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
