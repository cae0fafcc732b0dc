//! Tests for middleware configuration (include/exclude)

use super::super::{create_base_config, create_config_with_toml, get_body_json, get_request};
use crate::{ErrorKind, FluentRouter, HttpMiddleware};
use axum::{Router, http::StatusCode, routing::get};
use tower::ServiceExt;

#[tokio::test]
async fn test_middleware_config_exclude() {
    let config = create_base_config().with_excluded_middlewares(vec![
        HttpMiddleware::SecurityHeaders,
        HttpMiddleware::RateLimiting,
    ]);

    let app = FluentRouter::without_state(config)
        .unwrap()
        .merge(Router::new().route("/test", get(|| async { "OK" })))
        .setup_middleware()
        .await
        .unwrap()
        .into_inner();

    let response = app.oneshot(get_request("/test")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("x-frame-options"));
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_middleware_config_include() {
    let config = create_base_config()
        .with_included_middlewares(vec![HttpMiddleware::RequestContext, HttpMiddleware::Logging]);

    let fluent_router = FluentRouter::without_state(config).unwrap();

    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::RequestContext));
    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::Logging));
    assert!(!fluent_router.is_middleware_enabled(HttpMiddleware::Cors));
    assert!(!fluent_router.is_middleware_enabled(HttpMiddleware::RateLimiting));
    assert!(!fluent_router.is_middleware_enabled(HttpMiddleware::HeaderSanitization));

    let app = fluent_router
        .merge(Router::new().route("/test", get(|| async { "OK" })))
        .setup_middleware()
        .await
        .unwrap()
        .into_inner();

    // Sanitization is off, so a normally blocked header goes through.
    let response = app
        .oneshot(
            axum::http::Request::get("/test")
                .header("x-forwarded-for", "10.0.0.1")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_method_whitelist_can_be_excluded() {
    let config = create_config_with_toml(
        r#"
[http.middleware]
exclude = ["method-whitelist", "rate-limiting"]
"#,
    );

    let app = FluentRouter::without_state(config)
        .unwrap()
        .merge(Router::new().route("/trace", axum::routing::any(|| async { "traced" })))
        .setup_middleware()
        .await
        .unwrap()
        .into_inner();

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("TRACE")
                .uri("/trace")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trace_is_refused_by_default() {
    let app = super::super::create_test_router(None).await;
    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("TRACE")
                .uri("/noop")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        get_body_json(response).await["message"],
        "HTTP method 'TRACE' is not allowed on this server."
    );
}

#[test]
fn test_timeout_without_body_limit_is_rejected() {
    let config = create_base_config().with_excluded_middlewares(vec![HttpMiddleware::BodyLimit]);

    let err = FluentRouter::without_state(config)
        .err()
        .expect("timeout without body-limit must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().starts_with("Timeout requires BodyLimit"));

    let config = create_base_config()
        .with_excluded_middlewares(vec![HttpMiddleware::BodyLimit, HttpMiddleware::Timeout]);
    assert!(FluentRouter::without_state(config).is_ok());
}
