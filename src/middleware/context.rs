//! Per-request context.
//!
//! The context middleware builds a [`RequestContext`], stores it in the
//! request extensions and runs the rest of the request inside a task-local
//! scope, so that code deep inside a handler can call
//! [`RequestContext::current`] without threading it through arguments.

use {
    crate::{Error, RequestIdGenerator},
    axum::{
        extract::{ConnectInfo, FromRequestParts, Request},
        middleware::Next,
        response::Response,
    },
    http::{Method, request::Parts},
    std::net::SocketAddr,
    time::OffsetDateTime,
};

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// What is known about the request being served.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Incoming `x-request-id`, or 8 generated hex characters.
    pub request_id: String,
    pub timestamp: OffsetDateTime,
    pub path: String,
    pub method: Method,
    /// Peer IP address, `"unknown"` when the server runs without connect info.
    pub ip: String,
}

impl RequestContext {
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(RequestIdGenerator::new_id);

        RequestContext {
            request_id,
            timestamp: OffsetDateTime::now_utc(),
            path: req.uri().path().to_owned(),
            method: req.method().clone(),
            ip: client_ip(req),
        }
    }

    /// The context of the request currently being handled by this task, if any.
    pub fn current() -> Option<RequestContext> {
        REQUEST_CONTEXT.try_with(Clone::clone).ok()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| Error::internal("Request context middleware is not installed"))
    }
}

/// Client IP taken from the connection, or `"unknown"`.
pub fn client_ip<B>(req: &http::Request<B>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn request_context(mut req: Request, next: Next) -> Response {
    let context = RequestContext::from_request(&req);
    req.extensions_mut().insert(context.clone());
    REQUEST_CONTEXT.scope(context, next.run(req)).await
}
