//! Length-prefixed framing
//!
//! Every message on the wire is `"<decimal length>:"` followed by exactly that
//! many payload bytes. The same format is used in both directions.
//!
//! [`FrameReader`] turns a byte stream into an ordered sequence of payloads.
//! It tolerates arbitrary read boundaries: a prefix or payload may arrive one
//! byte at a time, or several frames may arrive in a single read. A prefix that
//! is not a decimal number, or is longer than any valid length, is discarded
//! up to and including its `:` and scanning resumes after it. End of stream ends the sequence; it is never reported as a parse
//! error.
//!
//! All parsing state lives in the reader itself, so `next_frame` can be used
//! inside `tokio::select!` without losing bytes when another branch wins.

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

/// Default upper bound on a declared payload length
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// Longest prefix kept while waiting for `:`. `usize::MAX` has 20 digits.
const MAX_PREFIX_LEN: usize = 20;

const READ_CHUNK: usize = 4096;

/// Frame a payload: `"<len>:" + payload`
pub fn encode_frame(payload: &str) -> Vec<u8> {
    let len = payload.len().to_string();
    let mut out = Vec::with_capacity(len.len() + 1 + payload.len());
    out.extend_from_slice(len.as_bytes());
    out.push(b':');
    out.extend_from_slice(payload.as_bytes());
    out
}

/// Write one framed payload and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_frame(payload)).await?;
    writer.flush().await
}

/// Parse the bytes before `:` as a non-negative decimal length.
pub fn parse_length(prefix: &[u8]) -> Result<usize, FrameError> {
    let malformed =
        || FrameError::MalformedLengthPrefix(String::from_utf8_lossy(prefix).into_owned());

    if prefix.is_empty() || !prefix.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    std::str::from_utf8(prefix)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(malformed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accumulating digits up to `:`
    Prefix,
    /// Accumulating exactly `len` payload bytes
    Payload { len: usize },
    /// Dropping an over-long prefix up to and including its `:`
    Discard,
}

/// Incremental frame decoder over an async byte stream.
pub struct FrameReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
    phase: Phase,
    prefix: Vec<u8>,
    payload: Vec<u8>,
    max_frame: usize,
    malformed: u64,
    finished: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_frame(inner, DEFAULT_MAX_FRAME)
    }

    pub fn with_max_frame(inner: R, max_frame: usize) -> Self {
        Self {
            inner,
            buf: vec![0u8; READ_CHUNK].into_boxed_slice(),
            pos: 0,
            end: 0,
            phase: Phase::Prefix,
            prefix: Vec::with_capacity(MAX_PREFIX_LEN),
            payload: Vec::new(),
            max_frame,
            malformed: 0,
            finished: false,
        }
    }

    /// Number of prefixes discarded so far
    pub fn malformed_count(&self) -> u64 {
        self.malformed
    }

    /// True once the stream has ended; every later call yields `Ok(None)`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Next complete payload, in stream order.
    ///
    /// Returns `Ok(None)` when the peer closed the stream between frames.
    /// A close in the middle of a payload yields
    /// [`FrameError::TruncatedPayload`] and the partial payload is dropped.
    /// After any `Err` or `Ok(None)` the reader is finished.
    pub async fn next_frame(&mut self) -> Result<Option<String>, FrameError> {
        loop {
            if self.finished {
                return Ok(None);
            }

            if let Phase::Payload { len } = self.phase {
                if self.payload.len() == len {
                    self.phase = Phase::Prefix;
                    let message = String::from_utf8_lossy(&self.payload).into_owned();
                    self.payload.clear();
                    return Ok(Some(message));
                }
            }

            if self.pos == self.end {
                let n = match self.inner.read(&mut self.buf[..]).await {
                    Ok(n) => n,
                    Err(e) => {
                        self.finished = true;
                        return Err(FrameError::Io(e));
                    }
                };
                if n == 0 {
                    return self.finish();
                }
                self.pos = 0;
                self.end = n;
                continue;
            }

            match self.phase {
                Phase::Prefix => self.scan_prefix()?,
                Phase::Payload { len } => self.fill_payload(len),
                Phase::Discard => self.skip_discarded(),
            }
        }
    }

    fn finish(&mut self) -> Result<Option<String>, FrameError> {
        self.finished = true;
        match self.phase {
            Phase::Payload { len } => {
                let received = self.payload.len();
                self.payload.clear();
                Err(FrameError::TruncatedPayload {
                    expected: len,
                    received,
                })
            }
            Phase::Discard => {
                self.phase = Phase::Prefix;
                Ok(None)
            }
            Phase::Prefix => {
                if !self.prefix.is_empty() {
                    debug!(
                        "[Net] dropping {} unterminated prefix bytes at end of stream",
                        self.prefix.len()
                    );
                    self.prefix.clear();
                }
                Ok(None)
            }
        }
    }

    fn scan_prefix(&mut self) -> Result<(), FrameError> {
        let avail = &self.buf[self.pos..self.end];
        let colon = avail.iter().position(|&b| b == b':');
        let digits = colon.unwrap_or(avail.len());

        // Same verdict however the prefix was split across reads.
        if self.prefix.len() + digits > MAX_PREFIX_LEN {
            self.malformed += 1;
            warn!(
                "[Net] length prefix longer than {} bytes, discarding",
                MAX_PREFIX_LEN
            );
            self.prefix.clear();
            self.phase = Phase::Discard;
            return Ok(());
        }

        self.prefix.extend_from_slice(&avail[..digits]);
        let Some(colon) = colon else {
            self.pos = self.end;
            return Ok(());
        };
        self.pos += colon + 1;

        let parsed = parse_length(&self.prefix);
        self.prefix.clear();
        match parsed {
            Ok(len) if len > self.max_frame => {
                self.finished = true;
                Err(FrameError::TooLarge {
                    declared: len,
                    limit: self.max_frame,
                })
            }
            Ok(len) => {
                self.payload.reserve(len);
                self.phase = Phase::Payload { len };
                Ok(())
            }
            Err(e) => {
                self.malformed += 1;
                warn!("[Net] {}, resuming scan", e);
                Ok(())
            }
        }
    }

    fn skip_discarded(&mut self) {
        let avail = &self.buf[self.pos..self.end];
        match avail.iter().position(|&b| b == b':') {
            Some(colon) => {
                self.pos += colon + 1;
                self.phase = Phase::Prefix;
            }
            None => self.pos = self.end,
        }
    }

    fn fill_payload(&mut self, len: usize) {
        let want = len - self.payload.len();
        let take = want.min(self.end - self.pos);
        self.payload
            .extend_from_slice(&self.buf[self.pos..self.pos + take]);
        self.pos += take;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn test_encode_frame() {
        assert_eq!(encode_frame("hello"), b"5:hello".to_vec());
        assert_eq!(encode_frame(""), b"0:".to_vec());
        assert_eq!(&encode_frame(&"1".repeat(200))[..4], b"200:");
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length(b"0").unwrap(), 0);
        assert_eq!(parse_length(b"200").unwrap(), 200);
        assert!(matches!(
            parse_length(b""),
            Err(FrameError::MalformedLengthPrefix(_))
        ));
        assert!(parse_length(b"-1").is_err());
        assert!(parse_length(b" 5").is_err());
        assert!(parse_length(b"12a").is_err());
        assert!(parse_length(b"99999999999999999999999").is_err());
    }

    #[tokio::test]
    async fn test_single_frame_then_close() {
        let mock = Builder::new().read(b"5:hello").build();
        let mut reader = FrameReader::new(mock);

        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(reader.next_frame().await.unwrap(), None);
        assert!(reader.is_finished());
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_payload_split_across_reads() {
        let mock = Builder::new().read(b"5:he").read(b"llo").build();
        let mut reader = FrameReader::new(mock);

        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prefix_split_across_reads() {
        let mock = Builder::new().read(b"1").read(b"0").read(b":0123456789").build();
        let mut reader = FrameReader::new(mock);

        assert_eq!(
            reader.next_frame().await.unwrap().as_deref(),
            Some("0123456789")
        );
    }

    #[tokio::test]
    async fn test_several_frames_in_one_read() {
        let mock = Builder::new().read(b"3:abc0:2:de").build();
        let mut reader = FrameReader::new(mock);

        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("abc"));
        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some(""));
        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("de"));
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_prefix_is_skipped() {
        let mock = Builder::new().read(b"xy:5:hello:3:abc").build();
        let mut reader = FrameReader::new(mock);

        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("hello"));
        // Empty prefix before the second frame.
        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("abc"));
        assert_eq!(reader.malformed_count(), 2);
    }

    #[tokio::test]
    async fn test_overlong_prefix_discarded_through_colon() {
        let mock = Builder::new()
            .read(b"123456789012345678901")
            .read(b"2:3:xyz")
            .build();
        let mut reader = FrameReader::new(mock);

        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("xyz"));
        assert_eq!(reader.next_frame().await.unwrap(), None);
        assert_eq!(reader.malformed_count(), 1);
    }

    #[tokio::test]
    async fn test_twenty_digit_prefix_is_not_overlong() {
        let mock = Builder::new().read(b"00000000000000000002:ok").build();
        let mut reader = FrameReader::new(mock);
        assert_eq!(reader.next_frame().await.unwrap().as_deref(), Some("ok"));
        assert_eq!(reader.malformed_count(), 0);
    }

    #[tokio::test]
    async fn test_close_mid_payload_is_truncation() {
        let mock = Builder::new().read(b"5:he").build();
        let mut reader = FrameReader::new(mock);

        match reader.next_frame().await {
            Err(FrameError::TruncatedPayload { expected, received }) => {
                assert_eq!((expected, received), (5, 2));
            }
            other => panic!("expected truncation, got {:?}", other),
        }
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_mid_prefix_is_clean() {
        let mock = Builder::new().read(b"12").build();
        let mut reader = FrameReader::new(mock);
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_fatal() {
        let mock = Builder::new().read(b"100:").build();
        let mut reader = FrameReader::with_max_frame(mock, 10);

        assert!(matches!(
            reader.next_frame().await,
            Err(FrameError::TooLarge {
                declared: 100,
                limit: 10
            })
        ));
        assert!(reader.is_finished());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let mock = Builder::new().read(b"2:a\xff").build();
        let mut reader = FrameReader::new(mock);
        assert_eq!(
            reader.next_frame().await.unwrap().as_deref(),
            Some("a\u{fffd}")
        );
    }

    #[tokio::test]
    async fn test_write_frame() {
        let mut mock = Builder::new().write(b"6:rotate").build();
        write_frame(&mut mock, "rotate").await.unwrap();
    }
}
