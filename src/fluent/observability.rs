//! Observability middleware: request logging and Prometheus metrics.

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {
    crate::middleware::{log_requests, make_request_span},
    axum::middleware::from_fn,
    http::header::{AUTHORIZATION, COOKIE},
    tower_http::{sensitive_headers::SetSensitiveRequestHeadersLayer, trace::TraceLayer},
};

#[cfg(feature = "metrics")]
use {
    crate::middleware::track_metrics,
    axum::{middleware::from_fn_with_state, routing::get},
    http::header::CONTENT_TYPE,
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Adds `GET /metrics` rendering this router's registry in the Prometheus
    /// text format.
    ///
    /// Call it before any layer so that the endpoint sits under the whole
    /// middleware stack. [`FluentRouter::setup_middleware`] does.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn setup_metrics_endpoint(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Metrics) {
            return self;
        }

        let metrics = self.metrics.clone();
        self.inner = self.inner.route(
            "/metrics",
            get(move || {
                let metrics = metrics.clone();
                async move {
                    metrics
                        .render()
                        .map(|body| ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
                }
            }),
        );
        self
    }

    /// Counts requests and observes their latency, labelled by method,
    /// matched route and status.
    ///
    /// The registry belongs to this router, so several routers in one
    /// process (tests, mostly) never collide on metric names.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn setup_metrics(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Metrics) {
            return self;
        }

        self.inner = self
            .inner
            .layer(from_fn_with_state(self.metrics.clone(), track_metrics));
        self
    }

    /// No-op when the `metrics` feature is disabled.
    #[cfg(not(feature = "metrics"))]
    #[must_use]
    pub fn setup_metrics(self) -> Self {
        self
    }

    /// Sets up HTTP request/response logging.
    ///
    /// Every request runs in an `http_request` span carrying the method, the
    /// uri and the request id. The request line is logged on arrival and the
    /// outcome on completion, at error level for 5xx, warn for 4xx and info
    /// otherwise. `Authorization` and `Cookie` are marked sensitive so they
    /// never show up in debug output of the request headers.
    #[must_use]
    pub fn setup_logging(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Logging) {
            return self;
        }

        self.inner = self
            .inner
            .layer(from_fn(log_requests))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION, COOKIE]));
        self
    }
}

