//! Probe and introspection routes: `/`, `/health`, `/ready`, `/info` and `/system`.

use {
    crate::{AppConfig, Error, Lifecycle, Result, hostname, repository::DATABASE_SERVICE, unix_millis},
    axum::{Json, Router, extract::State, routing::get},
    serde::Serialize,
    std::time::Instant,
    time::{OffsetDateTime, format_description::well_known::Rfc3339},
};

#[cfg(feature = "openapi")]
use crate::ErrorResponse;

/// State shared by the system routes.
#[derive(Debug, Clone)]
pub struct SystemState {
    pub app: AppConfig,
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Greeting {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthStatus {
    pub alive: bool,
    /// Seconds since the lifecycle was created.
    pub uptime: f64,
    /// RFC 3339 time of the probe.
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReadyStatus {
    pub ready: bool,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub hostname: String,
    pub pid: u32,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub uptime: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Milliseconds a yielded task waited before being polled again.
    pub event_loop_lag: f64,
    /// `connected` or `disconnected`.
    pub db: String,
}

/// Routes served by every instance, whatever the application state type.
pub fn system_routes<S>(state: SystemState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/info", get(info))
        .route("/system", get(system))
        .with_state(state)
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get, path = "/", tag = "system",
    responses((status = 200, description = "Greeting", body = Greeting))
))]
pub async fn root(State(state): State<SystemState>) -> Json<Greeting> {
    Json(Greeting {
        message: format!("Hello World! Service {} is running.", state.app.name),
    })
}

/// Liveness probe.
#[cfg_attr(feature = "openapi", utoipa::path(
    get, path = "/health", tag = "system",
    responses((status = 200, description = "Liveness", body = HealthStatus))
))]
pub async fn health(State(state): State<SystemState>) -> Json<HealthStatus> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(HealthStatus {
        alive: state.lifecycle.is_alive(),
        uptime: state.lifecycle.uptime().as_secs_f64(),
        timestamp,
    })
}

/// Readiness probe. Fails while starting, while shutting down and whenever a
/// registered service reports itself unhealthy.
#[cfg_attr(feature = "openapi", utoipa::path(
    get, path = "/ready", tag = "system",
    responses(
        (status = 200, description = "Ready", body = ReadyStatus),
        (status = 503, description = "Not ready", body = ErrorResponse),
    )
))]
pub async fn ready(State(state): State<SystemState>) -> Result<Json<ReadyStatus>> {
    if state.lifecycle.is_ready() && state.lifecycle.are_all_services_healthy().await {
        Ok(Json(ReadyStatus { ready: true }))
    } else {
        Err(Error::service_unavailable("Application not ready"))
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get, path = "/info", tag = "system",
    responses((status = 200, description = "Service identity", body = ServiceInfo))
))]
pub async fn info(State(state): State<SystemState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: state.app.name.clone(),
        version: state.app.version.clone(),
        environment: state.app.environment.to_string(),
        hostname: hostname(),
        pid: std::process::id(),
    })
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get, path = "/system", tag = "system",
    responses((status = 200, description = "Runtime status", body = SystemStatus))
))]
pub async fn system(State(state): State<SystemState>) -> Json<SystemStatus> {
    let started = Instant::now();
    tokio::task::yield_now().await;
    let event_loop_lag = started.elapsed().as_secs_f64() * 1000.0;

    let db = match state.lifecycle.service_health(DATABASE_SERVICE).await {
        Some(true) => "connected",
        _ => "disconnected",
    };

    Json(SystemStatus {
        uptime: state.lifecycle.uptime().as_secs_f64(),
        timestamp: unix_millis(),
        event_loop_lag,
        db: db.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceHooks;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };
    use tower::ServiceExt;

    fn app(lifecycle: Lifecycle) -> Router {
        let app = AppConfig {
            name: "items".into(),
            ..Default::default()
        };
        system_routes(SystemState { app, lifecycle })
    }

    async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
        let req = Request::get(path).body(Body::empty()).unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root_greets() {
        let (status, body) = get_json(&app(Lifecycle::new()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello World! Service items is running.");
    }

    #[tokio::test]
    async fn test_health_shape() {
        let (status, body) = get_json(&app(Lifecycle::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alive"], true);
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
        assert!(body["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn test_ready_follows_lifecycle() {
        let lifecycle = Lifecycle::new();
        let app = app(lifecycle.clone());

        let (status, body) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "Application not ready");

        lifecycle.startup().await.unwrap();
        let (status, body) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);

        lifecycle.mark_not_ready();
        let (status, _) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_ready_requires_healthy_services() {
        let healthy = Arc::new(AtomicBool::new(true));
        let flag = healthy.clone();
        let lifecycle = Lifecycle::new();
        lifecycle.register([ServiceHooks::new("cache")
            .on_health(move || {
                let flag = flag.clone();
                async move { flag.load(Ordering::SeqCst) }
            })
            .into_service()]);
        lifecycle.startup().await.unwrap();

        let app = app(lifecycle);
        assert_eq!(get_json(&app, "/ready").await.0, StatusCode::OK);

        healthy.store(false, Ordering::SeqCst);
        assert_eq!(
            get_json(&app, "/ready").await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_info_reports_identity() {
        let (_, body) = get_json(&app(Lifecycle::new()), "/info").await;
        assert_eq!(body["name"], "items");
        assert_eq!(body["environment"], "development");
        assert_eq!(body["pid"], std::process::id());
        assert!(!body["hostname"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_system_reports_database() {
        let lifecycle = Lifecycle::new();
        let app = app(lifecycle.clone());
        let (_, body) = get_json(&app, "/system").await;
        assert_eq!(body["db"], "disconnected");
        assert!(body["eventLoopLag"].as_f64().unwrap() >= 0.0);

        lifecycle.register([ServiceHooks::new(DATABASE_SERVICE).into_service()]);
        let (_, body) = get_json(&app, "/system").await;
        assert_eq!(body["db"], "connected");
    }
}
