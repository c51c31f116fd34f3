use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";

type ThriftReply = (StatusCode, [(header::HeaderName, &'static str); 1], Vec<u8>);

/// A request as the server saw it. Header names are lowercase and kept in
/// the order they arrived, duplicates included.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Every value received for `name`, compared case-insensitively.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedReply {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    requests: Vec<RecordedRequest>,
    replies: VecDeque<ScriptedReply>,
}

/// Shared handle to the server's recorded traffic and reply script.
///
/// Uses a std mutex so synchronous test threads can inspect it without
/// entering the server's runtime.
#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<Mutex<Inner>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next `POST /thrift`.
    pub fn script_reply(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.lock().replies.push_back(ScriptedReply {
            status,
            body: body.into(),
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    fn record(&self, method: &Method, uri: &Uri, headers: &HeaderMap, body: &Bytes) {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        tracing::info!(%method, path = uri.path(), bytes = body.len(), "request");
        self.lock().requests.push(RecordedRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
            headers,
            body: body.to_vec(),
        });
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        self.lock().replies.pop_front()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn app() -> Router {
    app_with_state(MockState::new())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/echo", post(echo))
        .route("/status/{code}", post(status))
        .route("/delay/{ms}", post(delay))
        .route("/thrift", post(scripted))
        .route("/redirect", post(redirect))
        .route("/requests", get(list_requests))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::new()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn thrift_reply(status: StatusCode, body: Vec<u8>) -> ThriftReply {
    (status, [(header::CONTENT_TYPE, THRIFT_CONTENT_TYPE)], body)
}

async fn echo(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ThriftReply {
    state.record(&method, &uri, &headers, &body);
    thrift_reply(StatusCode::OK, body.to_vec())
}

async fn status(
    State(state): State<MockState>,
    Path(code): Path<u16>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ThriftReply, StatusCode> {
    state.record(&method, &uri, &headers, &body);
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(thrift_reply(status, format!("status {code}").into_bytes()))
}

async fn delay(
    State(state): State<MockState>,
    Path(ms): Path<u64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ThriftReply {
    state.record(&method, &uri, &headers, &body);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    thrift_reply(StatusCode::OK, body.to_vec())
}

async fn scripted(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ThriftReply, StatusCode> {
    state.record(&method, &uri, &headers, &body);
    match state.next_reply() {
        Some(reply) => {
            let status =
                StatusCode::from_u16(reply.status).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            Ok(thrift_reply(status, reply.body))
        }
        None => Ok(thrift_reply(StatusCode::OK, Vec::new())),
    }
}

/// 302 pointing at `/echo`.
async fn redirect(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, &'static str); 1]) {
    state.record(&method, &uri, &headers, &body);
    (StatusCode::FOUND, [(header::LOCATION, "/echo")])
}

async fn list_requests(State(state): State<MockState>) -> Json<Vec<RecordedRequest>> {
    Json(state.requests())
}
