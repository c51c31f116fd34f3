//! Transport configuration.
//!
//! # Design
//! `TransportConfig` is immutable and can only be obtained through
//! `TransportConfigBuilder::build` (or `TransportSettings`, which goes through
//! the builder), so every value a transport sees has already been validated.
//! Timeouts are accepted as signed milliseconds; negative values fail the
//! build and zero means "leave the HTTP client's default alone".

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use ureq::http::{HeaderName, HeaderValue, Uri};

use crate::error::ConfigError;

/// Validated, immutable transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    endpoint: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    headers: Vec<(String, String)>,
}

impl TransportConfig {
    pub fn builder(endpoint: impl Into<String>) -> TransportConfigBuilder {
        TransportConfigBuilder::new(endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `None` when unset or zero.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// `None` when unset or zero.
    ///
    /// With `UreqClient` this bounds the wait for the response head and,
    /// separately, the whole body download. It is a deadline per phase, not
    /// an idle timeout per read call.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Custom headers in insertion order, names unique ignoring case.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Collects configuration values; validation happens in `build`.
#[derive(Debug, Clone)]
pub struct TransportConfigBuilder {
    endpoint: String,
    connect_timeout_ms: i64,
    read_timeout_ms: i64,
    headers: Vec<(String, String)>,
}

impl TransportConfigBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
            headers: Vec::new(),
        }
    }

    pub fn connect_timeout_millis(mut self, millis: i64) -> Self {
        self.connect_timeout_ms = millis;
        self
    }

    pub fn read_timeout_millis(mut self, millis: i64) -> Self {
        self.read_timeout_ms = millis;
        self
    }

    /// Millisecond precision; anything shorter than 1ms counts as unset.
    pub fn connect_timeout(self, timeout: Duration) -> Self {
        self.connect_timeout_millis(duration_millis(timeout))
    }

    /// Millisecond precision; anything shorter than 1ms counts as unset.
    pub fn read_timeout(self, timeout: Duration) -> Self {
        self.read_timeout_millis(duration_millis(timeout))
    }

    /// Add a custom header. A name already present (ignoring case) has its
    /// value replaced.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
        self
    }

    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    pub fn build(self) -> Result<TransportConfig, ConfigError> {
        let connect_timeout = validate_timeout("connect", self.connect_timeout_ms)?;
        let read_timeout = validate_timeout("read", self.read_timeout_ms)?;
        validate_endpoint(&self.endpoint)?;
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))?;
            HeaderValue::from_str(value)
                .map_err(|_| ConfigError::InvalidHeaderValue { name: name.clone() })?;
        }

        Ok(TransportConfig {
            endpoint: self.endpoint,
            connect_timeout,
            read_timeout,
            headers: self.headers,
        })
    }
}

/// Serializable form of `TransportConfig`, for loading from configuration
/// files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransportSettings {
    pub endpoint: String,
    #[serde(default)]
    pub connect_timeout_ms: i64,
    #[serde(default)]
    pub read_timeout_ms: i64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl TryFrom<TransportSettings> for TransportConfig {
    type Error = ConfigError;

    fn try_from(settings: TransportSettings) -> Result<Self, Self::Error> {
        TransportConfig::builder(settings.endpoint)
            .connect_timeout_millis(settings.connect_timeout_ms)
            .read_timeout_millis(settings.read_timeout_ms)
            .headers(settings.headers)
            .build()
    }
}

fn duration_millis(timeout: Duration) -> i64 {
    i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX)
}

fn validate_timeout(which: &'static str, millis: i64) -> Result<Option<Duration>, ConfigError> {
    match millis {
        m if m < 0 => Err(ConfigError::NegativeTimeout { which, millis }),
        0 => Ok(None),
        m => Ok(Some(Duration::from_millis(m.unsigned_abs()))),
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let uri: Uri = endpoint
        .parse()
        .map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
    if uri.host().is_none() {
        return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
    }
    match uri.scheme_str() {
        Some("http") | Some("https") => Ok(()),
        Some(other) => Err(ConfigError::UnsupportedScheme(other.to_string())),
        None => Err(ConfigError::InvalidEndpoint(endpoint.to_string())),
    }
}
