//! Tests for middleware interactions
//!
//! Each rejection happens at a fixed depth of the stack, so these tests pin
//! down which check wins when a request breaks several rules at once, and
//! which outer layers still decorate the rejection.

use super::super::{
    create_config_with_toml, create_test_router, get_body_json, options_request,
};
use crate::FluentRouter;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::get,
};
use tower::ServiceExt;

#[tokio::test]
async fn test_cors_rejects_before_header_sanitization() {
    let app = create_test_router(None).await;
    let response = app
        .oneshot(
            Request::get("/noop")
                .header("origin", "https://evil.example")
                .header("x-forwarded-for", "10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_method_whitelist_before_content_type() {
    let app = create_test_router(None).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("CONNECT")
                .uri("/noop")
                .header("content-type", "text/plain")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_header_limits_before_sanitization() {
    let app = create_test_router(None).await;
    let response = app
        .oneshot(
            Request::get("/noop")
                .header("x-forwarded-for", "x".repeat(5000))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE
    );
}

#[tokio::test]
async fn test_rejections_carry_outer_headers() {
    let app = create_test_router(None).await;
    let response = app
        .oneshot(
            Request::post("/noop")
                .header("origin", "http://localhost:3000")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:3000");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_preflight_skips_inner_checks() {
    let app = create_test_router(None).await;

    // OPTIONS is answered by CORS before routing, so an unknown path is fine.
    let response = app
        .oneshot(options_request(
            "/not-a-route",
            "http://localhost:3000",
            "DELETE",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_rate_limited_response_is_decorated() {
    let config = create_config_with_toml(
        r#"
[http.rate_limit]
max_requests = 1
"#,
    );
    let app = FluentRouter::without_state(config)
        .unwrap()
        .merge(Router::new().route("/once", get(|| async { "OK" })))
        .setup_middleware()
        .await
        .unwrap()
        .into_inner();

    let response = app
        .clone()
        .oneshot(Request::get("/once").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/once").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(get_body_json(response).await["status"], 429);
}
