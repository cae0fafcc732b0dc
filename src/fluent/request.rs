//! Request shaping: body limit, content type, header checks, method whitelist and request context.

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {
    crate::{
        middleware::{
            BodyLimitLayer, HeaderPolicy, content_type, header_limits, header_sanitization,
            method_whitelist, request_context,
        },
        utils::RequestIdGenerator,
        Result,
    },
    axum::{extract::DefaultBodyLimit, middleware::from_fn, middleware::from_fn_with_state},
    http::HeaderName,
    std::sync::Arc,
    tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Caps request bodies per path prefix.
    ///
    /// Bodies are read completely before the handler runs, so a body larger
    /// than the limit is refused with `413 Payload Too Large` whether or not
    /// it declared a `Content-Length`. Responses carry `x-body-limit-bytes`
    /// and `x-body-remaining-bytes`.
    ///
    /// ```toml
    /// [http.body]
    /// default_limit = "1MiB"
    /// overrides = [{ prefix = "/api/v1/uploads", limit = "10MiB" }]
    /// ```
    ///
    /// When the `Timeout` middleware is enabled the chunk and header read
    /// deadlines from `[http.timeouts]` also apply while the body is read.
    #[must_use]
    pub fn setup_body_limit(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::BodyLimit) {
            return self;
        }

        let mut layer = BodyLimitLayer::new(self.config.http.body.clone());
        if self.is_middleware_enabled(HttpMiddleware::Timeout) {
            layer = layer.with_timeouts(&self.config.http.timeouts);
        }

        self.inner = self
            .inner
            .layer(DefaultBodyLimit::disable())
            .layer(layer);
        self
    }

    /// Rejects bodies whose `Content-Type` is not allowed for the request path
    /// with `415 Unsupported Media Type`.
    #[must_use]
    pub fn setup_content_type(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::ContentType) {
            return self;
        }

        let config = Arc::new(self.config.http.content_type.clone());
        self.inner = self
            .inner
            .layer(from_fn_with_state(config, content_type));
        self
    }

    /// Strips blocked headers, enforces the allow-list and rejects header
    /// values carrying control characters.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header name is invalid.
    pub fn setup_header_sanitization(mut self) -> Result<Self> {
        if !self.is_middleware_enabled(HttpMiddleware::HeaderSanitization) {
            return Ok(self);
        }

        let policy = Arc::new(HeaderPolicy::from_config(&self.config.http.headers)?);
        self.inner = self
            .inner
            .layer(from_fn_with_state(policy, header_sanitization));
        Ok(self)
    }

    /// Enforces the header count and size limits with `431`, and refuses
    /// chunked transfer encoding unless `allow_chunked` is set.
    #[must_use]
    pub fn setup_header_limits(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::HeaderLimits) {
            return self;
        }

        let config = Arc::new(self.config.http.headers.clone());
        self.inner = self
            .inner
            .layer(from_fn_with_state(config, header_limits));
        self
    }

    /// Answers `405` for every method outside [`crate::middleware::ALLOWED_METHODS`].
    #[must_use]
    pub fn setup_method_whitelist(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::MethodWhitelist) {
            return self;
        }

        self.inner = self.inner.layer(from_fn(method_whitelist));
        self
    }

    /// Assigns every request an `x-request-id` and a [`crate::middleware::RequestContext`].
    ///
    /// An incoming `x-request-id` is kept. Otherwise a short hex id is
    /// generated. The id is copied to the response, and the context is
    /// reachable from handlers through the extractor or
    /// `RequestContext::current()`.
    #[must_use]
    pub fn setup_request_context(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::RequestContext) {
            return self;
        }

        let x_request_id = HeaderName::from_static("x-request-id");
        self.inner = self
            .inner
            .layer(from_fn(request_context))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, RequestIdGenerator));
        self
    }
}
