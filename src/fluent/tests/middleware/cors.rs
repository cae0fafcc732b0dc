//! Tests for CORS middleware setup

use super::super::{
    create_config_with_toml, create_test_router, get_body_json, options_request,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

fn request_from(origin: &str) -> Request<Body> {
    Request::get("/noop")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_default_origin_is_echoed() {
    let app = create_test_router(None).await;
    let response = app.oneshot(request_from("http://localhost:3000")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:3000");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(
        headers["access-control-expose-headers"],
        "authorization, set-cookie"
    );
}

#[tokio::test]
async fn test_request_without_origin_passes() {
    let app = create_test_router(None).await;
    let response = app
        .oneshot(Request::get("/noop").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_configured_origins_replace_defaults() {
    let config = create_config_with_toml(
        r#"
[http.cors]
allowed_origins = ["https://app.example.com"]
allowed_methods = ["GET", "POST"]
max_age = "10m"
"#,
    );
    let app = create_test_router(Some(config)).await;

    let response = app
        .clone()
        .oneshot(options_request("/noop", "https://app.example.com", "POST"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["access-control-allow-methods"], "GET, POST");
    assert_eq!(response.headers()["access-control-max-age"], "600");

    let response = app
        .oneshot(request_from("http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(get_body_json(response).await["error_code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_wildcard_origin_without_credentials() {
    let config = create_config_with_toml(
        r#"
[http.cors]
allow_credentials = false
allowed_origins = ["*"]
"#,
    );
    let app = create_test_router(Some(config)).await;

    let response = app
        .clone()
        .oneshot(request_from("https://anything.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://anything.example"
    );
    assert!(!response.headers().contains_key("access-control-allow-credentials"));

    let response = app
        .oneshot(Request::get("/noop").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[test]
fn test_wildcard_with_credentials_is_invalid() {
    let config = create_config_with_toml(
        r#"
[http.cors]
allow_credentials = true
allowed_origins = ["*"]
"#,
    );

    let err = crate::FluentRouter::without_state(config)
        .err()
        .expect("wildcard origin with credentials must be rejected");
    assert_eq!(err.kind(), crate::ErrorKind::Configuration);
}
