//! Core FluentRouter struct and initialization methods.

use {
    super::shutdown::{ShutdownNotifier, ShutdownPhase},
    crate::{Config, HttpMiddleware, Lifecycle, Result},
    axum::Router,
    tokio::sync::broadcast,
    tokio_util::{sync::CancellationToken, task::AbortOnDropHandle},
};

#[cfg(feature = "metrics")]
use {crate::middleware::HttpMetrics, std::sync::Arc};

/// Fluent builder for axum::Router with configuration-based middleware setup.
///
/// This wrapper around `axum::Router` provides a fluent API for configuring the
/// hardening middleware and the system routes based on the application
/// configuration. Create instances using [`FluentRouter::without_state`] or
/// [`FluentRouter::with_state`].
///
/// Each router owns a [`Lifecycle`]. Services registered with it are started
/// by [`FluentRouter::start`] before the listener is bound and stopped, in
/// reverse order, once in-flight requests drained.
///
/// # Graceful Shutdown
///
/// Components can subscribe to shutdown events or use a cancellation token:
///
/// ```rust,no_run
/// use axum_hardened::{Config, FluentRouter, ShutdownPhase};
///
/// # async fn example() -> axum_hardened::Result<()> {
/// let router = FluentRouter::without_state(Config::default())?;
///
/// let token = router.cancellation_token();
/// tokio::spawn(async move {
///     loop {
///         tokio::select! {
///             _ = token.cancelled() => break,
///             _ = do_work() => {}
///         }
///     }
/// });
///
/// let mut rx = router.subscribe_to_shutdown();
/// tokio::spawn(async move {
///     while let Ok(phase) = rx.recv().await {
///         if let ShutdownPhase::Initiated = phase {
///             println!("Shutting down...");
///         }
///     }
/// });
/// # async fn do_work() {}
/// # Ok(())
/// # }
/// ```
pub struct FluentRouter<State = ()> {
    pub(crate) config: Config,
    pub(crate) state: State,
    pub(crate) inner: Router<State>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) rate_limit_handle: Option<AbortOnDropHandle<()>>,
    pub(crate) panic_channel: Option<tokio::sync::mpsc::Sender<String>>,
    pub(crate) shutdown_notifier: ShutdownNotifier,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Arc<HttpMetrics>,
}

impl FluentRouter {
    /// Creates a new `FluentRouter` without application state.
    pub fn without_state(config: Config) -> Result<FluentRouter<()>> {
        FluentRouter::<()>::with_state(config, ())
    }
}

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Creates a new `FluentRouter` with the provided configuration and state.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the metrics
    /// registry cannot be created.
    pub fn with_state<S: Clone + Send + Sync + 'static>(
        config: Config,
        state: S,
    ) -> Result<FluentRouter<S>> {
        config.validate()?;

        Ok(FluentRouter {
            config,
            state,
            inner: Router::new(),
            lifecycle: Lifecycle::new(),
            rate_limit_handle: None,
            panic_channel: None,
            shutdown_notifier: ShutdownNotifier::default(),
            #[cfg(feature = "metrics")]
            metrics: Arc::new(HttpMetrics::new()?),
        })
    }

    /// Returns the configuration the router was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the lifecycle, e.g. to share one that already has services registered.
    #[must_use]
    pub fn with_lifecycle(self, lifecycle: Lifecycle) -> Self {
        Self { lifecycle, ..self }
    }

    /// Returns the lifecycle started and stopped by [`FluentRouter::start`].
    ///
    /// ```rust
    /// use axum_hardened::{Config, FluentRouter, ServiceHooks};
    ///
    /// # fn example() -> axum_hardened::Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?;
    /// router
    ///     .lifecycle()
    ///     .register([ServiceHooks::new("cache").into_service()]);
    /// assert_eq!(router.lifecycle().service_names(), ["cache"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Returns the request metrics collected by this router.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> Arc<HttpMetrics> {
        self.metrics.clone()
    }

    /// Returns a reference to the shutdown notifier.
    ///
    /// Use this to subscribe to shutdown phase notifications for coordinated
    /// cleanup across multiple components.
    #[must_use]
    pub fn shutdown_notifier(&self) -> &ShutdownNotifier {
        &self.shutdown_notifier
    }

    /// Returns a cancellation token that is triggered when shutdown begins.
    ///
    /// Equivalent to `router.shutdown_notifier().cancellation_token()`. Every
    /// clone shares the same cancellation state.
    ///
    /// ```rust,no_run
    /// use axum_hardened::{Config, FluentRouter};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> axum_hardened::Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?;
    /// let token = router.cancellation_token();
    ///
    /// tokio::spawn(async move {
    ///     let mut interval = tokio::time::interval(Duration::from_secs(60));
    ///     loop {
    ///         tokio::select! {
    ///             _ = token.cancelled() => break,
    ///             _ = interval.tick() => tracing::debug!("Running periodic task"),
    ///         }
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown_notifier.cancellation_token()
    }

    /// Returns a receiver for shutdown phase notifications.
    ///
    /// Subscribers created after a phase is emitted will not receive that phase.
    #[must_use]
    pub fn subscribe_to_shutdown(&self) -> broadcast::Receiver<ShutdownPhase> {
        self.shutdown_notifier.subscribe()
    }

    /// Returns true if no middleware config is specified (all enabled by default),
    /// or if the middleware is explicitly enabled/not excluded.
    pub(crate) fn is_middleware_enabled(&self, middleware: HttpMiddleware) -> bool {
        self.config
            .http
            .middleware
            .as_ref()
            .map(|config| config.is_enabled(middleware))
            .unwrap_or(true)
    }

    /// Sets a notification channel for panic messages.
    ///
    /// Any panic caught by the panic handler sends its message to this
    /// channel. Useful for monitoring and alerting.
    ///
    /// ```rust,no_run
    /// # use axum_hardened::{Config, FluentRouter};
    /// # async fn example() -> axum_hardened::Result<()> {
    /// let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    ///
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .with_panic_notification_channel(tx);
    ///
    /// tokio::spawn(async move {
    ///     while let Some(panic_msg) = rx.recv().await {
    ///         eprintln!("Panic caught: {}", panic_msg);
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_panic_notification_channel(self, ch: tokio::sync::mpsc::Sender<String>) -> Self {
        Self {
            panic_channel: Some(ch),
            ..self
        }
    }
}
