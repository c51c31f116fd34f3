use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, MockState, RecordedRequest};
use tower::ServiceExt;

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn thrift_request(uri: &str, body: &[u8]) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-thrift")
        .header(http::header::ACCEPT, "application/x-thrift")
        .body(axum::body::Body::from(body.to_vec()))
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_returns_request_body() {
    let resp = app()
        .oneshot(thrift_request("/echo", b"\x80\x01\x00\x01ping"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/x-thrift"
    );
    assert_eq!(&body_bytes(resp).await[..], b"\x80\x01\x00\x01ping");
}

#[tokio::test]
async fn echo_rejects_get() {
    let resp = app()
        .oneshot(Request::builder().uri("/echo").body(axum::body::Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- status ---

#[tokio::test]
async fn status_route_replies_with_requested_code() {
    let resp = app().oneshot(thrift_request("/status/500", b"")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body_bytes(resp).await[..], b"status 500");
}

#[tokio::test]
async fn status_route_rejects_invalid_code() {
    let resp = app().oneshot(thrift_request("/status/42", b"")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- redirect ---

#[tokio::test]
async fn redirect_route_points_at_echo() {
    let resp = app().oneshot(thrift_request("/redirect", b"REQ")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(http::header::LOCATION).unwrap(), "/echo");
}

// --- scripted ---

#[tokio::test]
async fn thrift_route_plays_script_then_defaults_to_empty_ok() {
    let state = MockState::new();
    state.script_reply(200, "OK-PAYLOAD");
    state.script_reply(503, "busy");

    let resp = app_with_state(state.clone())
        .oneshot(thrift_request("/thrift", b"REQ"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"OK-PAYLOAD");

    let resp = app_with_state(state.clone())
        .oneshot(thrift_request("/thrift", b"REQ"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = app_with_state(state)
        .oneshot(thrift_request("/thrift", b"REQ"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- recording ---

#[tokio::test]
async fn requests_are_recorded_with_headers_and_body() {
    let state = MockState::new();
    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .header("X-Api-Key", "secret")
        .body(axum::body::Body::from("payload"))
        .unwrap();

    app_with_state(state.clone()).oneshot(request).await.unwrap();

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/echo");
    assert_eq!(requests[0].header_values("x-api-key"), vec!["secret"]);
    assert_eq!(requests[0].body, b"payload");
}

#[tokio::test]
async fn requests_route_lists_recorded_traffic() {
    let state = MockState::new();
    app_with_state(state.clone())
        .oneshot(thrift_request("/echo", b"abc"))
        .await
        .unwrap();

    let resp = app_with_state(state)
        .oneshot(Request::builder().uri("/requests").body(axum::body::Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let listed: Vec<RecordedRequest> = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].body, b"abc");
}

#[tokio::test]
async fn requests_route_is_not_recorded() {
    let state = MockState::new();
    app_with_state(state.clone())
        .oneshot(Request::builder().uri("/requests").body(axum::body::Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(state.requests().is_empty());
}
