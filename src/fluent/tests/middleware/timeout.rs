//! Tests for the total, header and chunk timeouts

use super::super::{create_base_config, get_body_json, get_request, prepare_config_for_test};
use crate::{FluentRouter, HttpMiddleware};
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode},
    routing::{get, post},
};
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tower::Service;

fn slow_routes() -> Router {
    Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                "This should timeout"
            }),
        )
        .route(
            "/fast",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                "Fast response"
            }),
        )
        .route("/upload", post(|body: Bytes| async move { body.len().to_string() }))
}

fn short_timeouts() -> crate::Config {
    prepare_config_for_test(create_base_config()).with_timeouts(
        Duration::from_millis(100),
        Duration::from_millis(100),
        Duration::from_millis(150),
    )
}

#[tokio::test]
async fn test_setup_total_timeout_with_slow_handler() {
    let mut app = FluentRouter::without_state(short_timeouts())
        .unwrap()
        .merge(slow_routes())
        .setup_total_timeout()
        .into_inner();

    let response = app.call(get_request("/slow")).await.unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    let body = get_body_json(response).await;
    assert_eq!(body["error_code"], "REQUEST_TIMEOUT");
    assert_eq!(body["message"], "Request exceeded total timeout.");
}

#[tokio::test]
async fn test_setup_total_timeout_with_fast_handler() {
    let mut app = FluentRouter::without_state(short_timeouts())
        .unwrap()
        .merge(slow_routes())
        .setup_total_timeout()
        .into_inner();

    let response = app.call(get_request("/fast")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_total_timeout_disabled_when_excluded() {
    let config = short_timeouts().with_excluded_middlewares(vec![HttpMiddleware::Timeout]);
    let mut app = FluentRouter::without_state(config)
        .unwrap()
        .merge(slow_routes())
        .setup_total_timeout()
        .into_inner();

    let response = app.call(get_request("/slow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Request body whose first frame never arrives.
struct StalledBody;

impl http_body::Body for StalledBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        Poll::Pending
    }
}

fn stalled_body() -> Body {
    Body::new(StalledBody)
}

#[tokio::test]
async fn test_header_timeout_on_stalled_body() {
    let mut app = FluentRouter::without_state(short_timeouts())
        .unwrap()
        .merge(slow_routes())
        .setup_body_limit()
        .into_inner();

    let request = Request::post("/upload")
        .header("content-type", "application/json")
        .body(stalled_body())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(
        get_body_json(response).await["message"],
        "Header timeout exceeded."
    );
}

#[tokio::test]
async fn test_stalled_body_waits_without_timeout_middleware() {
    let config = short_timeouts().with_excluded_middlewares(vec![
        HttpMiddleware::Timeout,
        HttpMiddleware::RateLimiting,
    ]);
    let mut app = FluentRouter::without_state(config)
        .unwrap()
        .merge(slow_routes())
        .setup_body_limit()
        .into_inner();

    let request = Request::post("/upload")
        .header("content-type", "application/json")
        .body(stalled_body())
        .unwrap();
    let waited = tokio::time::timeout(Duration::from_millis(300), app.call(request)).await;
    assert!(waited.is_err());
}
