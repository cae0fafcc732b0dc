use {
    crate::Result,
    std::{fmt, future::Future, pin::Pin, sync::Arc},
};

/// Boxed future returned by [`LifecycleService`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A long-lived component started before the server accepts traffic and
/// stopped after it drained.
///
/// Every method except [`name`](LifecycleService::name) has a no-op default,
/// so a service only implements what it needs.
pub trait LifecycleService: Send + Sync {
    fn name(&self) -> &str;

    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn stop(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }
}

type Hook = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;
type HealthHook = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// A [`LifecycleService`] assembled from closures.
///
/// ```rust
/// use axum_hardened::{Lifecycle, ServiceHooks};
///
/// # async fn example() -> axum_hardened::Result<()> {
/// let lifecycle = Lifecycle::new();
/// lifecycle.register([ServiceHooks::new("cache")
///     .on_start(|| async {
///         tracing::info!("warming cache");
///         Ok(())
///     })
///     .on_stop(|| async { Ok(()) })
///     .into_service()]);
///
/// lifecycle.startup().await?;
/// assert!(lifecycle.is_ready());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ServiceHooks {
    name: String,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
    on_health: Option<HealthHook>,
}

impl ServiceHooks {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_start: None,
            on_stop: None,
            on_health: None,
        }
    }

    #[must_use]
    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_start = Some(Arc::new(move || Box::pin(f()) as BoxFuture<'static, Result<()>>));
        self
    }

    #[must_use]
    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_stop = Some(Arc::new(move || Box::pin(f()) as BoxFuture<'static, Result<()>>));
        self
    }

    #[must_use]
    pub fn on_health<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.on_health = Some(Arc::new(move || Box::pin(f()) as BoxFuture<'static, bool>));
        self
    }

    /// Wraps the hooks for [`crate::Lifecycle::register`].
    pub fn into_service(self) -> Arc<dyn LifecycleService> {
        Arc::new(self)
    }
}

impl LifecycleService for ServiceHooks {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> BoxFuture<'_, Result<()>> {
        match &self.on_start {
            Some(hook) => hook(),
            None => Box::pin(async { Ok(()) }),
        }
    }

    fn stop(&self) -> BoxFuture<'_, Result<()>> {
        match &self.on_stop {
            Some(hook) => hook(),
            None => Box::pin(async { Ok(()) }),
        }
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        match &self.on_health {
            Some(hook) => hook(),
            None => Box::pin(async { true }),
        }
    }
}

impl fmt::Debug for ServiceHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHooks")
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .field("on_health", &self.on_health.is_some())
            .finish()
    }
}
