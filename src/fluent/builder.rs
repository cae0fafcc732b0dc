//! Orchestration and router delegation: setup_middleware(), start(), serve(), layer(), route(), etc.

use super::router::FluentRouter;
use super::shutdown::{ShutdownNotifier, ShutdownPhase};
use crate::{Lifecycle, Result, STARTUP_FAILURE, wait_for_signal};

use {
    axum::{Router, body::Body, routing::Route},
    http::Request,
    std::{convert::Infallible, future::Future, net::SocketAddr, time::Duration},
    tokio::{net::TcpListener, sync::oneshot},
    tower::{Layer, Service},
};

/// Signal name recorded when the server stopped without receiving a signal.
const SERVER_STOPPED: &str = "SERVER_STOPPED";

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Adds the router-owned routes and every middleware layer in order.
    ///
    /// Call it after the application routes are in place: `axum` layers only
    /// wrap routes that already exist, and the JSON fallbacks are installed
    /// here.
    ///
    /// The system routes, `/metrics` and the OpenAPI routes are added first
    /// so the full stack protects them. Layers are then added innermost
    /// first; the last one added runs first on a request:
    ///
    /// 1. **Panic catching** - outermost, catches everything below
    /// 2. **Request id / context** - every later log line carries the id
    /// 3. **Logging** - span and access log
    /// 4. **Metrics** - counts every answered request, refusals included
    /// 5. **Security headers**
    /// 6. **CORS** - answers preflights before method checks
    /// 7. **Method whitelist**
    /// 8. **Header limits**
    /// 9. **Header sanitization**
    /// 10. **Rate limiting**
    /// 11. **Total timeout**
    /// 12. **Content type**
    /// 13. **Body limit** - innermost, reads the body for the handler
    ///
    /// Each layer can be turned off through `[http.middleware]`:
    ///
    /// ```toml
    /// [http.middleware]
    /// exclude = ["rate-limiting", "metrics"]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if a header, CORS or security header value from the
    /// configuration is invalid, or the OpenAPI document cannot be built.
    pub async fn setup_middleware(self) -> Result<Self> {
        tracing::info!(
            "Starting {} version {}...",
            self.config.app.name,
            self.config.app.version
        );

        let router = self.setup_system_routes();

        #[cfg(feature = "metrics")]
        let router = router.setup_metrics_endpoint();

        #[cfg(feature = "openapi")]
        let router = router.setup_openapi()?;

        let router = router
            .setup_fallbacks()
            .setup_body_limit() // 13. Body limit
            .setup_content_type() // 12. Content type
            .setup_total_timeout() // 11. Total timeout
            .setup_rate_limiting() // 10. Rate limiting
            .setup_header_sanitization()? // 9. Header sanitization
            .setup_header_limits() // 8. Header limits
            .setup_method_whitelist() // 7. Method whitelist
            .setup_cors()? // 6. CORS
            .setup_security_headers()? // 5. Security headers
            .setup_metrics() // 4. Metrics
            .setup_logging() // 3. Logging
            .setup_request_context() // 2. Request id and context
            .setup_catch_panic(); // 1. Outermost - panic recovery

        Ok(router)
    }

    /// Starts the lifecycle services, binds the configured address and serves
    /// until SIGINT or SIGTERM.
    ///
    /// ```rust,no_run
    /// use axum_hardened::{Config, FluentRouter};
    ///
    /// # async fn example() -> axum_hardened::Result<()> {
    /// FluentRouter::without_state(Config::default())?
    ///     .setup_middleware()
    ///     .await?
    ///     .start()
    ///     .await
    /// # }
    /// ```
    ///
    /// See [`FluentRouter::serve`] for the shutdown sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if a service fails to start or the address cannot be
    /// bound. Services already started are stopped before returning.
    pub async fn start(self) -> Result<()> {
        self.lifecycle.startup().await?;

        let bind_addr = self.config.http.full_bind_addr();
        let listener = match TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!(%bind_addr, error = %err, "Failed to bind");
                self.lifecycle.shutdown(STARTUP_FAILURE).await;
                return Err(err.into());
            }
        };
        tracing::info!("Bound to {bind_addr}");

        self.serve(listener, wait_for_signal()).await
    }

    /// Serves on `listener` until `signal` resolves, then shuts down gracefully.
    ///
    /// `signal` yields the name recorded in the shutdown report. The sequence is:
    ///
    /// 1. Starts the lifecycle services (a no-op if [`FluentRouter::start`] did)
    /// 2. Serves, with client addresses available to the rate limiter
    /// 3. On signal: emits [`ShutdownPhase::Initiated`], turns readiness off,
    ///    emits [`ShutdownPhase::GracePeriodStarted`] and stops accepting connections
    /// 4. Waits for in-flight requests, at most `http.shutdown_timeout`, and
    ///    emits [`ShutdownPhase::GracePeriodEnded`] if that expires
    /// 5. Stops the lifecycle services in reverse order and logs the report
    ///
    /// ```rust,no_run
    /// use axum_hardened::{Config, FluentRouter};
    /// use tokio::net::TcpListener;
    ///
    /// # async fn example() -> axum_hardened::Result<()> {
    /// let listener = TcpListener::bind("127.0.0.1:0").await?;
    /// let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    ///
    /// let server = FluentRouter::without_state(Config::default())?
    ///     .setup_middleware()
    ///     .await?
    ///     .serve(listener, async move {
    ///         rx.await.ok();
    ///         "TEST"
    ///     });
    /// let handle = tokio::spawn(server);
    ///
    /// tx.send(()).ok();
    /// handle.await.ok();
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if a service fails to start or the server fails.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = &'static str> + Send + 'static,
    {
        let lifecycle = self.lifecycle.clone();
        lifecycle.startup().await?;

        tracing::info!("Waiting for connections on {}", listener.local_addr()?);

        let service = self
            .inner
            .with_state(self.state)
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown_timeout = self.config.http.shutdown_timeout;
        let shutdown_notifier = self.shutdown_notifier.clone();

        // Subscribe before serving so Initiated cannot be missed
        let mut shutdown_rx = shutdown_notifier.subscribe();
        let (signal_tx, mut signal_rx) = oneshot::channel();

        let serve_future = axum::serve(listener, service).with_graceful_shutdown(
            shutdown_signal_with_notifications(
                signal,
                shutdown_timeout,
                shutdown_notifier.clone(),
                lifecycle.clone(),
                signal_tx,
            ),
        );

        // The drain timeout only starts once the signal arrived.
        let outcome: Result<()> = tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result.map_err(Into::into)
            }
            _ = async {
                loop {
                    match shutdown_rx.recv().await {
                        Ok(ShutdownPhase::Initiated) => break,
                        Ok(_) => continue,
                        Err(_) => return,
                    }
                }
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!("Graceful shutdown timeout expired, forcing shutdown");
                shutdown_notifier.emit(ShutdownPhase::GracePeriodEnded);
                Ok(())
            }
        };

        let signal = signal_rx.try_recv().unwrap_or(SERVER_STOPPED);
        if let Some(report) = lifecycle.shutdown(signal).await {
            tracing::info!(
                signal = %report.signal,
                uptime_secs = report.uptime.as_secs_f64(),
                failures = report.failures(),
                "Server stopped after {:.1}s",
                report.uptime.as_secs_f64()
            );
        }

        outcome
    }

    /// Adds a custom Tower middleware layer, see `axum::Router::layer`.
    ///
    /// ```rust,no_run
    /// use http::header::HeaderName;
    /// use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
    /// # use axum_hardened::{Config, FluentRouter};
    /// # fn example() -> axum_hardened::Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .layer(SetSensitiveRequestHeadersLayer::new([HeaderName::from_static("x-api-key")]));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.layer(layer);
        self
    }

    /// Adds a route, see `axum::Router::route`.
    ///
    /// ```
    /// use axum_hardened::{Config, FluentRouter};
    /// use axum::routing::get;
    ///
    /// let router = FluentRouter::without_state(Config::default())
    ///     .unwrap()
    ///     .route("/hello", get(|| async { "Hello, World!" }))
    ///     .into_inner();
    /// ```
    #[must_use]
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter<State>) -> Self {
        self.inner = self.inner.route(path, route);
        self
    }

    /// Adds a layer that only wraps matched routes, see `axum::Router::route_layer`.
    #[must_use]
    pub fn route_layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.route_layer(layer);
        self
    }

    /// Nests a router under `path`.
    ///
    /// ```rust,no_run
    /// use axum_hardened::{AppState, Config, FluentRouter, MemoryItemRepository, items};
    /// # fn example() -> axum_hardened::Result<()> {
    /// let state = AppState::new(MemoryItemRepository::new());
    /// let app = FluentRouter::<AppState<MemoryItemRepository>>::with_state(Config::default(), state)?
    ///     .nest(items::ITEMS_PATH, items::router());
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn nest(mut self, path: &str, router: Router<State>) -> Self {
        self.inner = self.inner.nest(path, router);
        self
    }

    /// Nests a Tower service under `path`.
    #[must_use]
    pub fn nest_service<T>(mut self, path: &str, service: T) -> Self
    where
        T: Service<Request<Body>, Response = axum::response::Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        self.inner = self.inner.nest_service(path, service);
        self
    }

    /// Merges the routes of `other` without prefixing them.
    #[must_use]
    pub fn merge(mut self, other: Router<State>) -> Self {
        self.inner = self.inner.merge(other);
        self
    }

    /// Serves a Tower service at exactly `path`.
    #[must_use]
    pub fn route_service<T>(mut self, path: &str, service: T) -> Self
    where
        T: Service<Request<Body>, Response = axum::response::Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        self.inner = self.inner.route_service(path, service);
        self
    }

    /// Consumes the `FluentRouter` and returns the underlying `axum::Router`.
    pub fn into_inner(self) -> Router<State> {
        self.inner
    }

    /// Consumes the `FluentRouter` and returns the `axum::Router` with its
    /// state applied, ready for `oneshot()` in tests.
    pub fn into_router(self) -> Router {
        self.inner.with_state(self.state)
    }
}

/// Resolves once `signal` fired and the shutdown notifications went out,
/// which makes axum stop accepting connections and drain.
///
/// The drain timeout is enforced by [`FluentRouter::serve`].
pub(crate) async fn shutdown_signal_with_notifications<F>(
    signal: F,
    timeout: Duration,
    notifier: ShutdownNotifier,
    lifecycle: Lifecycle,
    signal_tx: oneshot::Sender<&'static str>,
) where
    F: Future<Output = &'static str>,
{
    let name = signal.await;

    tracing::info!(
        signal = name,
        "Shutdown signal received, starting graceful shutdown (timeout: {}s)",
        timeout.as_secs()
    );
    let subscriber_count = notifier.emit(ShutdownPhase::Initiated);
    tracing::debug!("Shutdown initiated notification sent to {subscriber_count} subscriber(s)");

    lifecycle.mark_not_ready();
    signal_tx.send(name).ok();

    notifier.emit(ShutdownPhase::GracePeriodStarted { timeout });
}
