//! Tests for request id propagation and the per-request context

use super::super::{create_base_config, get_body_string, get_request, request_with_id};
use crate::{FluentRouter, RequestContext};
use axum::{Router, routing::get};
use tower::ServiceExt;

async fn describe(ctx: RequestContext) -> String {
    format!("{} {} {} {}", ctx.request_id, ctx.method, ctx.path, ctx.ip)
}

async fn from_task_local() -> String {
    RequestContext::current()
        .map(|ctx| ctx.request_id)
        .unwrap_or_else(|| "none".to_string())
}

fn context_routes() -> Router {
    Router::new()
        .route("/describe", get(describe))
        .route("/current", get(from_task_local))
}

#[tokio::test]
async fn test_context_matches_response_header() {
    let app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .merge(context_routes())
        .setup_request_context()
        .into_inner();

    let response = app.oneshot(get_request("/describe")).await.unwrap();
    let header = response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_owned();
    let body = get_body_string(response).await;

    assert_eq!(body, format!("{header} GET /describe unknown"));
}

#[tokio::test]
async fn test_incoming_id_reaches_handler() {
    let app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .merge(context_routes())
        .setup_request_context()
        .into_inner();

    let response = app
        .oneshot(request_with_id("GET", "/current", "abc-123"))
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc-123");
    assert_eq!(get_body_string(response).await, "abc-123");
}

#[tokio::test]
async fn test_each_request_gets_its_own_id() {
    let app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .merge(context_routes())
        .setup_request_context()
        .into_inner();

    let first = app.clone().oneshot(get_request("/current")).await.unwrap();
    let second = app.oneshot(get_request("/current")).await.unwrap();

    let first = get_body_string(first).await;
    let second = get_body_string(second).await;
    assert_eq!(first.len(), 8);
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_no_context_outside_middleware() {
    assert!(RequestContext::current().is_none());
}
