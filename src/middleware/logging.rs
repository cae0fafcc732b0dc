use {
    super::client_ip,
    axum::{body::Body, extract::Request, middleware::Next, response::Response},
    std::time::Instant,
    tracing::Span,
};

/// Span wrapping every request, used by the `TraceLayer`.
pub fn make_request_span(request: &http::Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Logs the request line on arrival and the outcome on completion.
///
/// 5xx responses are logged at error level, 4xx at warn and the rest at info.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let url = req.uri().to_string();
    let ip = client_ip(&req);
    let started = Instant::now();

    tracing::info!("[request] → {method} {url}");

    let response = next.run(req).await;

    let status_code = response.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;

    if status_code >= 500 {
        tracing::error!(%method, %url, status_code, duration_ms, %ip,
            "[{status_code}] {method} {url} → {duration_ms}ms");
    } else if status_code >= 400 {
        tracing::warn!(%method, %url, status_code, duration_ms, %ip,
            "[{status_code}] {method} {url} → {duration_ms}ms");
    } else {
        tracing::info!(%method, %url, status_code, duration_ms, %ip,
            "[{status_code}] {method} {url} → {duration_ms}ms");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware::from_fn, routing::get};
    use http::StatusCode;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(from_fn(log_requests))
    }

    async fn call(path: &str) {
        let req = Request::get(path).body(Body::empty()).unwrap();
        app().oneshot(req).await.unwrap();
    }

    #[tokio::test]
    #[traced_test]
    async fn test_success_logged_at_info() {
        call("/ok").await;
        assert!(logs_contain("[request] → GET /ok"));
        assert!(logs_contain("[200] GET /ok →"));
        assert!(logs_contain("INFO"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_client_error_logged_at_warn() {
        call("/missing").await;
        assert!(logs_contain("WARN"));
        assert!(logs_contain("[404] GET /missing"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_server_error_logged_at_error() {
        call("/boom").await;
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("status_code=500"));
        assert!(logs_contain("ip=unknown"));
    }
}
