//! Buffered HTTP transport for Thrift payloads.
//!
//! # Design
//! Writes accumulate in memory. `flush` drains the buffer before touching
//! the network, runs exactly one POST through the `HttpClient`, and on a
//! 200 installs the response body as the stream that `read` consumes.
//!
//! The response side is an explicit `ResponseState`. A flush drops the
//! previous stream before the exchange starts, so a failed flush always
//! leaves `NoResponse` behind and stale data from an earlier exchange can
//! never be read.

use std::{
    io::{self, Read},
    mem,
    ops::Range,
};

use crate::client::{HttpClient, UreqClient};
use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::http::HttpRequest;

/// The byte-level contract a protocol codec drives.
///
/// Not safe for concurrent use: one caller issues `write*`, `flush`,
/// `read*` in sequence for each exchange.
pub trait Transport {
    /// Buffer `buf[offset..offset + count]` for the next flush.
    fn write(&mut self, buf: &[u8], offset: usize, count: usize) -> Result<(), TransportError>;

    /// Read up to `count` bytes of the current response into
    /// `buf[offset..]`. Exhaustion is reported as `EndOfStream`, never as
    /// `Ok(0)` (except when `count` is zero).
    fn read(&mut self, buf: &mut [u8], offset: usize, count: usize) -> Result<usize, TransportError>;

    /// Send everything written since the last flush and make the reply
    /// readable.
    fn flush(&mut self) -> Result<(), TransportError>;

    /// Release the response stream and buffered bytes. Idempotent.
    fn close(&mut self) -> Result<(), TransportError>;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.write(buf, 0, buf.len())
    }

    /// Fill `buf` completely, failing with `EndOfStream` if the response
    /// ends first.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let len = buf.len();
        let mut filled = 0;
        while filled < len {
            filled += self.read(buf, filled, len - filled)?;
        }
        Ok(())
    }
}

enum ResponseState {
    NoResponse,
    Response(Box<dyn Read>),
    Closed,
}

/// `Transport` that performs one HTTP POST per flush.
pub struct HttpTransport<C = UreqClient> {
    config: TransportConfig,
    client: C,
    write_buffer: Vec<u8>,
    state: ResponseState,
}

impl HttpTransport<UreqClient> {
    pub fn new(config: TransportConfig) -> Self {
        Self::with_client(config, UreqClient::new())
    }
}

impl<C: HttpClient> HttpTransport<C> {
    pub fn with_client(config: TransportConfig, client: C) -> Self {
        Self {
            config,
            client,
            write_buffer: Vec::new(),
            state: ResponseState::NoResponse,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Whether a response stream from a successful flush is installed.
    pub fn has_response(&self) -> bool {
        matches!(self.state, ResponseState::Response(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ResponseState::Closed)
    }

    /// Bytes written since the last flush.
    pub fn pending_len(&self) -> usize {
        self.write_buffer.len()
    }

    fn release_response(&mut self, next: ResponseState) {
        if let ResponseState::Response(stream) = mem::replace(&mut self.state, next) {
            drop(stream);
            tracing::trace!("released response stream");
        }
    }
}

impl<C: HttpClient> Transport for HttpTransport<C> {
    fn write(&mut self, buf: &[u8], offset: usize, count: usize) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let range = sub_range(buf.len(), offset, count)?;
        self.write_buffer.extend_from_slice(&buf[range]);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], offset: usize, count: usize) -> Result<usize, TransportError> {
        let ResponseState::Response(stream) = &mut self.state else {
            return Err(TransportError::NoResponse);
        };
        let range = sub_range(buf.len(), offset, count)?;
        if range.is_empty() {
            return Ok(0);
        }

        loop {
            match stream.read(&mut buf[range.clone()]) {
                Ok(0) => return Err(TransportError::EndOfStream),
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let payload = mem::take(&mut self.write_buffer);
        self.release_response(ResponseState::NoResponse);

        let request = HttpRequest::post(&self.config, payload);
        tracing::debug!(endpoint = %request.uri, bytes = request.body.len(), "flushing");
        let response = self.client.execute(request)?;

        if response.status != 200 {
            tracing::warn!(endpoint = %self.config.endpoint(), status = response.status, "non-OK response");
            return Err(TransportError::Status {
                status: response.status,
            });
        }

        self.state = ResponseState::Response(response.body);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.release_response(ResponseState::Closed);
        let discarded = mem::take(&mut self.write_buffer).len();
        if discarded > 0 {
            tracing::debug!(discarded, "closed with unflushed bytes");
        }
        Ok(())
    }
}

fn sub_range(len: usize, offset: usize, count: usize) -> Result<Range<usize>, TransportError> {
    offset
        .checked_add(count)
        .filter(|&end| end <= len)
        .map(|end| offset..end)
        .ok_or(TransportError::OutOfBounds { offset, count, len })
}
