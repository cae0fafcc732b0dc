//! Tests for panic catching middleware setup

use super::super::{create_base_config, get_body_json, get_request};
use crate::FluentRouter;
use axum::{Router, http::StatusCode, routing::get};
use std::time::Duration;
use tower::Service;

fn panicking_routes() -> Router {
    Router::new()
        .route(
            "/panic",
            get(|| async {
                panic!("Test panic!");
                #[allow(unreachable_code)]
                "This will never be reached"
            }),
        )
        .route(
            "/formatted",
            get(|| async {
                let id = 42;
                panic!("item {id} vanished");
                #[allow(unreachable_code)]
                "This will never be reached"
            }),
        )
        .route("/normal", get(|| async { "OK" }))
}

#[tokio::test]
async fn test_setup_catch_panic_with_panic() {
    let mut app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .merge(panicking_routes())
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/panic")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["content-type"], "application/json");

    let body = get_body_json(response).await;
    assert_eq!(body["error_code"], "INTERNAL_ERROR");
    assert_eq!(body["status"], 500);
    assert_eq!(body["message"], "Internal Server Error");
}

#[tokio::test]
async fn test_setup_catch_panic_normal_request() {
    let mut app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .merge(panicking_routes())
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/normal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_with_panic_notification_channel() {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(10);

    let mut app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .with_panic_notification_channel(tx)
        .merge(panicking_routes())
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/panic")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let msg = tokio::time::timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("notification should arrive")
        .unwrap();
    assert_eq!(msg, "Service panicked: Test panic!");

    let response = app.call(get_request("/formatted")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let msg = rx.recv().await.unwrap();
    assert_eq!(msg, "Service panicked: item 42 vanished");
}

#[tokio::test]
async fn test_with_panic_notification_channel_no_panic() {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(10);

    let mut app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .with_panic_notification_channel(tx)
        .merge(panicking_routes())
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/normal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let notification = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(notification.is_err());
}

#[tokio::test]
async fn test_panic_inside_full_stack_server_keeps_serving() {
    let mut app = FluentRouter::without_state(super::super::prepare_config_for_test(
        create_base_config(),
    ))
    .unwrap()
    .merge(panicking_routes())
    .setup_middleware()
    .await
    .unwrap()
    .into_inner();

    let response = app.call(get_request("/panic")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(get_body_json(response).await["error_code"], "INTERNAL_ERROR");

    let response = app.call(get_request("/normal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
