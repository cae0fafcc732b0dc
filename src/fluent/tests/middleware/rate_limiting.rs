//! Tests for the per-client rate limit, driven through `oneshot()`
//!
//! Without connect info every request shares the `unknown` key, which makes
//! the limit easy to hit deterministically.

use super::super::{create_config_with_toml, get_body_json, get_request};
use crate::FluentRouter;
use axum::{Router, http::StatusCode, routing::get};
use tower::ServiceExt;

const TWO_PER_MINUTE: &str = r#"
[http.rate_limit]
window = "60s"
max_requests = 2
"#;

#[tokio::test]
async fn test_third_request_is_rate_limited() {
    let app = FluentRouter::without_state(create_config_with_toml(TWO_PER_MINUTE))
        .unwrap()
        .merge(Router::new().route("/limited", get(|| async { "OK" })))
        .setup_rate_limiting()
        .into_inner();

    for _ in 0..2 {
        let response = app.clone().oneshot(get_request("/limited")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get_request("/limited")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "60");

    let body = get_body_json(response).await;
    assert_eq!(body["error_code"], "RATE_LIMITED");
    assert_eq!(body["message"], "Too many requests: limit is 2 per 60s.");
}

#[tokio::test]
async fn test_rejected_requests_still_count_as_limited() {
    let router = FluentRouter::without_state(create_config_with_toml(TWO_PER_MINUTE))
        .unwrap()
        .merge(Router::new().route("/limited", get(|| async { "OK" })))
        .setup_middleware()
        .await
        .unwrap();
    let app = router.into_inner();

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let response = app.clone().oneshot(get_request("/limited")).await.unwrap();
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        [
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}
