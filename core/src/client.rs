//! The HTTP client capability the transport consumes.
//!
//! `UreqClient` is the default, blocking implementation. Anything else
//! (a different HTTP stack, a test double) only has to execute an
//! `HttpRequest` and hand back the status and body stream.

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one request/response exchange.
///
/// Implementations must return non-2xx responses as data; status
/// interpretation belongs to the transport.
pub trait HttpClient {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `HttpClient` backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap an existing agent. It must be configured with
    /// `http_status_as_error(false)`, otherwise non-200 replies surface as
    /// `TransportError::Http` instead of `TransportError::Status`. It should
    /// also have `max_redirects(0)` so a 3xx is reported instead of followed.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.post(request.uri.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut config = builder.config();
        if let Some(timeout) = request.connect_timeout {
            config = config.timeout_connect(Some(timeout));
        }
        if let Some(timeout) = request.read_timeout {
            config = config
                .timeout_recv_response(Some(timeout))
                .timeout_recv_body(Some(timeout));
        }

        let response = config.build().send(&request.body[..])?;
        let status = response.status().as_u16();
        tracing::debug!(uri = %request.uri, status, "http exchange complete");

        Ok(HttpResponse::new(status, response.into_body().into_reader()))
    }
}
