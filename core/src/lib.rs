//! HTTP transport for Thrift RPC payloads.
//!
//! # Overview
//! A protocol codec writes encoded bytes into a `Transport`, calls `flush`,
//! and reads the reply back. `HttpTransport` maps that onto one HTTP POST
//! per flush: the buffered bytes become the request body, and the body of a
//! `200 OK` response becomes the readable stream.
//!
//! # Design
//! - `TransportConfig` is validated once, up front. A negative timeout
//!   never reaches a transport.
//! - Requests are built as plain data (`HttpRequest`) and executed by an
//!   `HttpClient`. The default client is `UreqClient` (blocking `ureq`).
//! - Each transport has one owner. There is no locking, pooling or retry.
//! - Every failure is a `TransportError`, which also converts into
//!   `std::io::Error` for codecs that speak `io` errors.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;

pub use client::{HttpClient, UreqClient};
pub use config::{TransportConfig, TransportConfigBuilder, TransportSettings};
pub use error::{ConfigError, TransportError};
pub use http::{HttpRequest, HttpResponse, THRIFT_CONTENT_TYPE};
pub use transport::{HttpTransport, Transport};
