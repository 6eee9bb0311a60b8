// Network response body bound to a session's cancellation token

use boombap_core::CancellationToken;
use std::io::{self, Read};

/// Response body that stops delivering data once its session is cancelled.
///
/// The body is released on the first read after cancellation, so a decoder
/// parked on this reader lets go of the socket at its next pull.
pub struct Connection {
    body: Option<Box<dyn Read + Send + Sync>>,
    token: CancellationToken,
    bytes_read: u64,
}

impl Connection {
    pub fn new(body: Box<dyn Read + Send + Sync>, token: CancellationToken) -> Self {
        Self {
            body: Some(body),
            token,
            bytes_read: 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.body.is_none()
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    fn close(&mut self) {
        if self.body.take().is_some() {
            log::debug!("Connection closed after {} bytes", self.bytes_read);
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.token.is_cancelled() {
            self.close();
        }
        let body = self
            .body
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionAborted, "connection closed"))?;

        let read = body.read(buf)?;
        self.bytes_read += read as u64;
        Ok(read)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_pass_through() {
        let token = CancellationToken::new();
        let mut connection = Connection::new(Box::new(Cursor::new(b"abcdef".to_vec())), token);

        let mut buf = [0u8; 4];
        assert_eq!(connection.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(connection.bytes_read(), 4);
    }

    #[test]
    fn test_cancel_closes_on_next_read() {
        let token = CancellationToken::new();
        let mut connection =
            Connection::new(Box::new(Cursor::new(vec![0u8; 64])), token.clone());

        let mut buf = [0u8; 8];
        connection.read(&mut buf).unwrap();
        assert!(!connection.is_closed());

        token.cancel();
        let err = connection.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
        assert!(connection.is_closed());
    }
}
