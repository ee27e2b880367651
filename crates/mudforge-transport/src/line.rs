//! Buffered line reading and cleanup shared by the transports.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TransportError;

const IAC: u8 = 255;
const SB: u8 = 250;
const SE: u8 = 240;
const WILL: u8 = 251;
const DONT: u8 = 254;

/// Splits a byte stream into lines.
///
/// Bytes that arrive after a line break stay buffered for the next call.
/// A line over `max_line_len` is reported once and the rest of it, up to
/// the next line break, is thrown away.
#[derive(Debug)]
pub(crate) struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_line_len: usize,
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub(crate) fn new(inner: R, max_line_len: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(256),
            max_line_len: max_line_len.max(1),
            discarding: false,
        }
    }

    /// Reads the next cleaned line. `Ok(None)` on end of stream.
    ///
    /// Unterminated bytes left when the peer hangs up are returned as a
    /// final line.
    pub(crate) async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            if let Some(i) = self.buf.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = self.buf.drain(..=i).collect();
                if std::mem::take(&mut self.discarding) {
                    continue;
                }
                if i > self.max_line_len {
                    return Err(TransportError::LineTooLong {
                        max: self.max_line_len,
                    });
                }
                return Ok(Some(clean_line(&raw)));
            }

            if self.buf.len() > self.max_line_len {
                self.buf.clear();
                if !self.discarding {
                    self.discarding = true;
                    return Err(TransportError::LineTooLong {
                        max: self.max_line_len,
                    });
                }
            }

            let n = self
                .inner
                .read_buf(&mut self.buf)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                if self.buf.is_empty() || self.discarding {
                    return Ok(None);
                }
                let raw = std::mem::take(&mut self.buf);
                return Ok(Some(clean_line(&raw)));
            }
        }
    }
}

/// Strips telnet negotiation, the line terminator and control characters.
/// Tabs become spaces. Invalid UTF-8 is replaced rather than rejected.
pub(crate) fn clean_line(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b == IAC {
            match raw.get(i + 1) {
                Some(&IAC) => i += 2,
                Some(&SB) => {
                    let end = raw[i..]
                        .windows(2)
                        .position(|w| w == [IAC, SE])
                        .map_or(raw.len(), |p| i + p + 2);
                    i = end;
                }
                Some(&cmd) if (WILL..=DONT).contains(&cmd) => i += 3,
                Some(_) => i += 2,
                None => i += 1,
            }
            continue;
        }
        match b {
            b'\t' => out.push(b' '),
            b if b.is_ascii_control() => {}
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Converts bare `\n` to `\r\n` and terminates the text with one line break.
pub(crate) fn to_crlf(text: &str) -> String {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let mut out = String::with_capacity(body.len() + 8);
    for (i, part) in body.split('\n').enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        out.push_str(part.strip_suffix('\r').unwrap_or(part));
    }
    out.push_str("\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_read_line_handles_crlf_and_lf() {
        let (mut a, b) = tokio::io::duplex(64);
        a.write_all(b"hello\r\nworld\n").await.unwrap();
        drop(a);

        let mut reader = LineReader::new(b, 64);
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("world"));
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_returns_unterminated_tail() {
        let (mut a, b) = tokio::io::duplex(64);
        a.write_all(b"look").await.unwrap();
        drop(a);

        let mut reader = LineReader::new(b, 64);
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("look"));
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_too_long_skips_to_next_line() {
        let (mut a, b) = tokio::io::duplex(256);
        a.write_all(b"0123456789abcdef\nok\n").await.unwrap();
        drop(a);

        let mut reader = LineReader::new(b, 8);
        assert!(matches!(
            reader.read_line().await,
            Err(TransportError::LineTooLong { max: 8 })
        ));
        assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("ok"));
    }

    #[test]
    fn test_clean_line_strips_negotiation_and_controls() {
        let raw = [
            IAC, WILL, 31, b's', b'a', b'y', b'\t', b'h', b'i', 0x07, IAC, SB, 24, 0, b'x', IAC, SE,
            b'\r', b'\n',
        ];
        assert_eq!(clean_line(&raw), "say hi");
    }

    #[test]
    fn test_to_crlf_normalizes_line_breaks() {
        assert_eq!(to_crlf("a\nb\n"), "a\r\nb\r\n");
        assert_eq!(to_crlf("a\r\nb"), "a\r\nb\r\n");
        assert_eq!(to_crlf(""), "\r\n");
    }
}
