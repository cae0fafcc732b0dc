//! Startup and shutdown coordination of long-lived services.
//!
//! Services are started in registration order and stopped in reverse order.
//! Both sequences run at most once. Readiness follows the sequence: the
//! application becomes ready once every service started and stops being
//! ready as soon as shutdown begins. Liveness only ends once shutdown has
//! completed.
//!
//! ```text
//!   register(a, b, c)
//!        │
//!   startup()  ── a.start → b.start → c.start ──> ready
//!        │
//!   shutdown(signal) ── not ready ── c.stop → b.stop → a.stop ──> not alive
//! ```

mod service;

pub use service::*;

use {
    crate::{Error, Result},
    std::{
        sync::{
            Arc, RwLock,
            atomic::{AtomicBool, Ordering},
        },
        time::{Duration, Instant},
    },
    tokio::signal,
};

/// Signal name used when a failed startup tears down what was already started.
pub const STARTUP_FAILURE: &str = "STARTUP_FAILURE";

/// How one service behaved while stopping.
#[derive(Debug, Clone)]
pub struct ServiceStopOutcome {
    pub name: String,
    pub duration: Duration,
    /// The stop error, if the service failed to stop cleanly.
    pub error: Option<String>,
}

impl ServiceStopOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a completed shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub signal: String,
    pub services: Vec<ServiceStopOutcome>,
    pub total_duration: Duration,
    pub uptime: Duration,
}

impl ShutdownReport {
    /// Number of services whose `stop` returned an error.
    pub fn failures(&self) -> usize {
        self.services.iter().filter(|s| !s.is_ok()).count()
    }
}

struct LifecycleInner {
    started_at: Instant,
    startup_order: RwLock<Vec<Arc<dyn LifecycleService>>>,
    shutdown_order: RwLock<Vec<Arc<dyn LifecycleService>>>,
    startup_begun: AtomicBool,
    shutdown_begun: AtomicBool,
    ready: AtomicBool,
    alive: AtomicBool,
}

/// Shared lifecycle coordinator. Clones share state.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("services", &self.service_names())
            .field("ready", &self.is_ready())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle {
            inner: Arc::new(LifecycleInner {
                started_at: Instant::now(),
                startup_order: RwLock::new(Vec::new()),
                shutdown_order: RwLock::new(Vec::new()),
                startup_begun: AtomicBool::new(false),
                shutdown_begun: AtomicBool::new(false),
                ready: AtomicBool::new(false),
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Adds services. Each one starts after those already registered and stops before them.
    pub fn register<I>(&self, services: I)
    where
        I: IntoIterator<Item = Arc<dyn LifecycleService>>,
    {
        let mut startup = write(&self.inner.startup_order);
        let mut shutdown = write(&self.inner.shutdown_order);
        for service in services {
            tracing::debug!(service = service.name(), "Registered lifecycle service");
            shutdown.insert(0, service.clone());
            startup.push(service);
        }
    }

    /// Names of the registered services, in startup order.
    pub fn service_names(&self) -> Vec<String> {
        read(&self.inner.startup_order)
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Starts every service in registration order, then marks the application ready.
    ///
    /// Only the first call does anything. When a service fails to start, the
    /// services are shut down with the signal [`STARTUP_FAILURE`] and the
    /// error is returned.
    pub async fn startup(&self) -> Result<()> {
        if self.inner.startup_begun.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let services = read(&self.inner.startup_order).clone();
        let started = Instant::now();

        for service in &services {
            let service_started = Instant::now();
            if let Err(err) = service.start().await {
                tracing::error!(
                    service = service.name(),
                    error = %err,
                    "Failed to start service"
                );
                let err = Error::lifecycle(service.name(), err);
                self.shutdown(STARTUP_FAILURE).await;
                return Err(err);
            }
            tracing::info!(
                service = service.name(),
                duration_ms = service_started.elapsed().as_millis() as u64,
                "successfully started service → {}",
                service.name()
            );
        }

        self.inner.ready.store(true, Ordering::SeqCst);
        tracing::info!(
            services = services.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Application ready"
        );
        Ok(())
    }

    /// Stops every service in reverse registration order.
    ///
    /// Only the first call does anything; later calls return `None`. Stop
    /// errors are logged and recorded in the report but never abort the sequence.
    pub async fn shutdown(&self, signal: &str) -> Option<ShutdownReport> {
        if self.inner.shutdown_begun.swap(true, Ordering::SeqCst) {
            return None;
        }

        self.inner.ready.store(false, Ordering::SeqCst);
        let uptime = self.uptime();
        tracing::warn!(
            signal,
            uptime_secs = uptime.as_secs_f64(),
            "{signal} received: initiating graceful shutdown"
        );

        let initiated = Instant::now();
        let services = read(&self.inner.shutdown_order).clone();
        let mut outcomes = Vec::with_capacity(services.len());

        for service in &services {
            let started = Instant::now();
            tracing::info!(service = service.name(), "Stopping service");
            let result = service.stop().await;
            let duration = started.elapsed();

            let error = match result {
                Ok(()) => {
                    tracing::info!(
                        service = service.name(),
                        duration_ms = duration.as_millis() as u64,
                        "Service stopped"
                    );
                    None
                }
                Err(err) => {
                    tracing::error!(
                        service = service.name(),
                        duration_ms = duration.as_millis() as u64,
                        error = %err,
                        "Failed to stop service"
                    );
                    Some(err.to_string())
                }
            };

            outcomes.push(ServiceStopOutcome {
                name: service.name().to_string(),
                duration,
                error,
            });
        }

        let report = ShutdownReport {
            signal: signal.to_string(),
            services: outcomes,
            total_duration: initiated.elapsed(),
            uptime,
        };

        self.inner.alive.store(false, Ordering::SeqCst);
        tracing::info!(
            signal,
            failures = report.failures(),
            duration_ms = report.total_duration.as_millis() as u64,
            "Shutdown complete"
        );
        Some(report)
    }

    /// True until shutdown has completed.
    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// True between a successful startup and the beginning of shutdown.
    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    /// Marks the application as not ready, e.g. while connections drain.
    pub fn mark_not_ready(&self) {
        self.inner.ready.store(false, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutdown_begun.load(Ordering::SeqCst)
    }

    pub async fn are_all_services_healthy(&self) -> bool {
        let services = read(&self.inner.startup_order).clone();
        for service in &services {
            if !service.is_healthy().await {
                tracing::debug!(service = service.name(), "Service reports unhealthy");
                return false;
            }
        }
        true
    }

    /// Health of the service called `name`, `None` if no such service is registered.
    pub async fn service_health(&self, name: &str) -> Option<bool> {
        let service = read(&self.inner.startup_order)
            .iter()
            .find(|s| s.name() == name)
            .cloned()?;
        Some(service.is_healthy().await)
    }

    /// Time elapsed since the lifecycle was created.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Waits for SIGINT or SIGTERM and returns its name.
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(err) => {
                tracing::warn!("Failed to install Ctrl+C handler: {}", err);
                std::future::pending::<&'static str>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut handler) => {
                handler.recv().await;
                "SIGTERM"
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<&'static str>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    }
}
