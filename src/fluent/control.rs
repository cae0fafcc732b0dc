//! Traffic control middleware: rate limiting, total timeout and panic catching.

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {
    crate::{
        Error,
        middleware::{RateLimitLayer, RateLimiter, TotalTimeoutLayer, prune_task},
    },
    axum::response::IntoResponse,
    tokio_util::task::AbortOnDropHandle,
    tower_http::catch_panic::CatchPanicLayer,
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up per-IP sliding window rate limiting.
    ///
    /// Every client IP may send `max_requests` requests per `window`. Extra
    /// requests get `429 Too Many Requests` with a `Retry-After` header.
    ///
    /// ```toml
    /// [http.rate_limit]
    /// window = "15m"
    /// max_requests = 100
    /// ```
    ///
    /// Idle keys are pruned once per window by a background task that lives
    /// as long as the router.
    ///
    /// The client IP comes from `ConnectInfo<SocketAddr>`. Requests without
    /// it, such as `oneshot()` calls in tests, share the key `unknown`.
    #[must_use]
    pub fn setup_rate_limiting(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::RateLimiting) {
            return self;
        }

        let limiter = RateLimiter::new(&self.config.http.rate_limit);
        let handle = tokio::spawn(prune_task(limiter.clone(), limiter.window()));
        self.rate_limit_handle = Some(AbortOnDropHandle::new(handle));

        self.inner = self.inner.layer(RateLimitLayer::new(limiter));
        self
    }

    /// Bounds the whole request, handler included, by `[http.timeouts] total`.
    ///
    /// Slow requests get `408 Request Timeout`.
    #[must_use]
    pub fn setup_total_timeout(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Timeout) {
            return self;
        }

        self.inner = self
            .inner
            .layer(TotalTimeoutLayer::new(self.config.http.timeouts.total));
        self
    }

    /// Sets up panic catching middleware.
    ///
    /// A panicking handler yields a JSON `500 Internal Server Error` and the
    /// server keeps running. The panic message is forwarded to the channel
    /// set with [`FluentRouter::with_panic_notification_channel`], if any.
    ///
    /// ```rust,no_run
    /// # use axum_hardened::{Config, FluentRouter};
    /// # async fn example() -> axum_hardened::Result<()> {
    /// let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    ///
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .with_panic_notification_channel(tx)
    ///     .setup_catch_panic();
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn setup_catch_panic(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::CatchPanic) {
            return self;
        }

        let panic_channel = self.panic_channel.clone();
        self.inner = self.inner.layer(CatchPanicLayer::custom(
            move |err: Box<dyn std::any::Any + Send + 'static>| {
                let msg = if let Some(s) = err.downcast_ref::<String>() {
                    format!("Service panicked: {s}")
                } else if let Some(s) = err.downcast_ref::<&str>() {
                    format!("Service panicked: {s}")
                } else {
                    "Service panicked with a non-string payload".to_string()
                };

                tracing::error!("{msg}");
                if let Some(ch) = &panic_channel {
                    ch.try_send(msg).ok();
                }

                Error::internal("Internal Server Error").into_response()
            },
        ));
        self
    }
}
