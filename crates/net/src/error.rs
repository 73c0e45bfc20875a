//! Transport error types.

use std::io;

use thiserror::Error;

/// Errors raised while delimiting frames on a byte stream.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Length prefix was empty or not a decimal number. Recovered in place:
    /// the reader discards the prefix and keeps scanning.
    #[error("malformed length prefix {0:?}")]
    MalformedLengthPrefix(String),

    /// Stream ended in the middle of a payload.
    #[error("stream closed after {received} of {expected} payload bytes")]
    TruncatedPayload { expected: usize, received: usize },

    /// Declared length exceeds the configured frame limit.
    #[error("declared frame length {declared} exceeds limit {limit}")]
    TooLarge { declared: usize, limit: usize },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced to callers of the connection API.
#[derive(Debug, Error)]
pub enum NetError {
    /// Could not open the stream.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// `send` was called before a stream existed.
    #[error("not connected")]
    NotConnected,

    /// The stream was closed (remotely, locally, or after an I/O failure).
    #[error("stream closed")]
    StreamClosed,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
