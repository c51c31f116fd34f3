//! Error types for the HTTP transport.
//!
//! # Design
//! Configuration problems are caught by `ConfigError` before a transport
//! exists. Everything that can go wrong afterwards is a `TransportError`.
//! The codec sees all of them as one I/O error kind, so `TransportError`
//! converts into `std::io::Error` while keeping the variant as the source.

use std::io;

/// Rejected transport configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A timeout was supplied as a negative number of milliseconds.
    #[error("{which} timeout can not be negative: {millis}ms")]
    NegativeTimeout { which: &'static str, millis: i64 },

    /// The endpoint is not an absolute URI.
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    /// The endpoint scheme is neither `http` nor `https`.
    #[error("unsupported endpoint scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {name:?}")]
    InvalidHeaderValue { name: String },
}

/// Errors returned by `Transport` operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid transport configuration: {0}")]
    Config(#[from] ConfigError),

    /// Read attempted with no response stream: before any flush, after a
    /// failed flush, or after close.
    #[error("response buffer is empty, no request")]
    NoResponse,

    /// The current response stream is exhausted.
    #[error("no more data available")]
    EndOfStream,

    /// The server answered with something other than 200 OK.
    #[error("HTTP response code: {status}")]
    Status { status: u16 },

    /// `offset`/`count` do not describe a sub-range of the caller's buffer.
    #[error("range of {count} bytes at offset {offset} is out of bounds for buffer of length {len}")]
    OutOfBounds { offset: usize, count: usize, len: usize },

    #[error("transport is closed")]
    Closed,

    #[error("http exchange failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<TransportError> for io::Error {
    fn from(err: TransportError) -> Self {
        let kind = match &err {
            TransportError::Io(e) => e.kind(),
            TransportError::Config(_) | TransportError::OutOfBounds { .. } => io::ErrorKind::InvalidInput,
            TransportError::NoResponse | TransportError::Closed => io::ErrorKind::NotConnected,
            TransportError::EndOfStream => io::ErrorKind::UnexpectedEof,
            TransportError::Status { .. } | TransportError::Http(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
