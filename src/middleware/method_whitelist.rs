use {
    crate::Error,
    axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response},
    http::Method,
};

/// Methods accepted by the server. Anything else (TRACE, CONNECT, WebDAV verbs...) gets a 405.
pub const ALLOWED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Rejects requests whose method is not in [`ALLOWED_METHODS`].
pub async fn method_whitelist(req: Request, next: Next) -> Response {
    if !ALLOWED_METHODS.contains(req.method()) {
        tracing::warn!(method = %req.method(), path = %req.uri().path(), "Method rejected");
        return Error::method_not_allowed(req.method()).into_response();
    }
    next.run(req).await
}
