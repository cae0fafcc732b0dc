//! # axum-hardened
//!
//! An items CRUD service and the hardened HTTP stack it runs behind, built on
//! Axum and configured through TOML.
//!
//! Every request crosses a fixed chain of guards before it reaches a handler:
//! method whitelist, header limits and sanitization, a per-IP rate limit,
//! content type checks, a metered body with header, chunk and total timeouts,
//! and CORS. Every response gets security headers and an `x-request-id`.
//! Rejections are JSON documents with a stable error code.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum_hardened::{AppState, Config, FluentRouter, MemoryItemRepository, Result, items};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default(); // Loads config/{RUST_ENV}.toml
//!     config.setup_tracing();
//!
//!     let repo = MemoryItemRepository::new();
//!     let router = FluentRouter::<AppState<MemoryItemRepository>>::with_state(
//!         config,
//!         AppState::new(repo.clone()),
//!     )?;
//!     router.lifecycle().register([repo.into_service()]);
//!
//!     router
//!         .nest(items::ITEMS_PATH, items::router())
//!         .setup_middleware()
//!         .await?
//!         .start()
//!         .await
//! }
//! ```
//!
//! With `config/dev.toml`:
//! ```toml
//! [app]
//! name = "items"
//!
//! [http]
//! bind_port = 3000
//!
//! [http.body]
//! default_limit = "1MiB"
//! ```
//!
//! Run with `RUST_ENV=dev cargo run`.
//!
//! # What You Get
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | Probes | `/health`, `/ready`, `/info`, `/system` | Enabled |
//! | Prometheus metrics | Request counts and latencies at `/metrics` | Enabled |
//! | OpenAPI | `/openapi.json`, `/docs-json` and a Scalar UI at `/docs` | Enabled |
//! | Request logging | Structured logs with 8 hex character request ids | Enabled |
//! | Rate limiting | Sliding window per client IP | 200 req / 60s |
//! | Body limit | Metered while reading, per-prefix overrides | 1 MiB |
//! | Security headers | X-Frame-Options, CSP, HSTS and friends | Enabled |
//! | Panic recovery | Catches panics, returns a JSON 500, keeps running | Enabled |
//! | Graceful shutdown | SIGINT/SIGTERM, drains connections, stops services | 30s timeout |
//!
//! # Cargo Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `metrics` | Prometheus registry and the `/metrics` route |
//! | `openapi` | utoipa document and the Scalar UI |
//! | `postgres` | [`PgItemRepository`] backed by a sqlx pool |
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Handlers, validated extractors, [`AppState`] |
//! | [`config`] | Configuration loading and validation ([`Config`]) |
//! | [`fluent`] | Router builder and middleware setup ([`FluentRouter`]) |
//! | [`lifecycle`] | Ordered service startup and shutdown ([`Lifecycle`]) |
//! | [`middleware`] | The layers installed by [`FluentRouter::setup_middleware`] |
//! | [`repository`] | Item storage ([`ItemRepository`]) |
//! | [`error`] | Error types and their JSON rendering ([`Error`]) |
//!
//! # Error Handling
//!
//! The crate uses its own [`Result`] type. Errors render as:
//!
//! ```json
//! {
//!   "error_code": "PAYLOAD_TOO_LARGE",
//!   "status": 413,
//!   "message": "Request body exceeds maximum allowed size (limit = 1.00 MB).",
//!   "timestamp": 1735689600000
//! }
//! ```
//!
//! # Middleware Control
//!
//! ```toml
//! [http.middleware]
//! exclude = ["rate-limiting", "metrics"]
//! ```
pub mod api;
mod config;
mod error;
mod fluent;
mod lifecycle;
pub mod middleware;
mod repository;
mod utils;

#[cfg(feature = "openapi")]
pub mod openapi;

pub use api::{AppState, items};
pub use config::*;
pub use error::*;
pub use fluent::*;
pub use lifecycle::*;
pub use middleware::RequestContext;
pub use repository::*;
pub use utils::*;

pub type Result<T> = std::result::Result<T, Error>;
