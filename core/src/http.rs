//! HTTP exchange types for the transport.
//!
//! # Design
//! A flush is split in two: `HttpRequest::post` turns the drained payload
//! and the configuration into plain data, and an `HttpClient` executes it.
//! Everything that decides what goes on the wire (header merge order,
//! which timeouts apply) lives on the data side, so it can be checked
//! without a network.

use std::{fmt, io::Read, time::Duration};

use crate::config::TransportConfig;

pub const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";

/// One outgoing POST, described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub uri: String,
    /// Final header list. Each name appears once.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Only `Some` when explicitly configured.
    pub connect_timeout: Option<Duration>,
    /// Only `Some` when explicitly configured.
    pub read_timeout: Option<Duration>,
}

impl HttpRequest {
    /// Build the POST for `body`. The fixed Thrift `Content-Type` and
    /// `Accept` headers come first; custom headers are applied after them
    /// and replace a fixed header with the same name.
    pub fn post(config: &TransportConfig, body: Vec<u8>) -> Self {
        let mut headers = vec![
            ("Content-Type".to_string(), THRIFT_CONTENT_TYPE.to_string()),
            ("Accept".to_string(), THRIFT_CONTENT_TYPE.to_string()),
        ];
        for (name, value) in config.headers() {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Self {
            uri: config.endpoint().to_string(),
            headers,
            body,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
        }
    }
}

/// The status line and body stream of a completed exchange.
pub struct HttpResponse {
    pub status: u16,
    pub body: Box<dyn Read>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Read + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(req: &'a HttpRequest, name: &str) -> Vec<&'a str> {
        req.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn post_carries_fixed_thrift_headers() {
        let config = TransportConfig::builder("http://localhost:3000/thrift")
            .build()
            .unwrap();
        let req = HttpRequest::post(&config, b"REQ".to_vec());
        assert_eq!(req.uri, "http://localhost:3000/thrift");
        assert_eq!(
            req.headers,
            vec![
                ("Content-Type".to_string(), "application/x-thrift".to_string()),
                ("Accept".to_string(), "application/x-thrift".to_string()),
            ]
        );
        assert_eq!(req.body, b"REQ");
    }

    #[test]
    fn custom_headers_follow_fixed_ones() {
        let config = TransportConfig::builder("http://localhost:3000/thrift")
            .header("X-Api-Key", "k")
            .header("X-Trace", "t")
            .build()
            .unwrap();
        let req = HttpRequest::post(&config, Vec::new());
        let names: Vec<&str> = req.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Content-Type", "Accept", "X-Api-Key", "X-Trace"]);
    }

    #[test]
    fn custom_header_overrides_fixed_header_of_same_name() {
        let config = TransportConfig::builder("http://localhost:3000/thrift")
            .header("content-type", "application/vnd.apache.thrift.binary")
            .header("ACCEPT", "*/*")
            .build()
            .unwrap();
        let req = HttpRequest::post(&config, Vec::new());
        assert_eq!(header(&req, "Content-Type"), vec!["application/vnd.apache.thrift.binary"]);
        assert_eq!(header(&req, "Accept"), vec!["*/*"]);
        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn unset_timeouts_are_not_carried() {
        let config = TransportConfig::builder("http://localhost:3000/thrift")
            .connect_timeout_millis(0)
            .build()
            .unwrap();
        let req = HttpRequest::post(&config, Vec::new());
        assert!(req.connect_timeout.is_none());
        assert!(req.read_timeout.is_none());
    }

    #[test]
    fn configured_timeouts_are_carried() {
        let config = TransportConfig::builder("http://localhost:3000/thrift")
            .connect_timeout_millis(100)
            .read_timeout_millis(900)
            .build()
            .unwrap();
        let req = HttpRequest::post(&config, Vec::new());
        assert_eq!(req.connect_timeout, Some(Duration::from_millis(100)));
        assert_eq!(req.read_timeout, Some(Duration::from_millis(900)));
    }
}
