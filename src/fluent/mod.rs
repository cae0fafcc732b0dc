//! FluentRouter and middleware configuration.
//!
//! - [`router`] - Core `FluentRouter` struct and initialization
//! - [`request`] - Body limit, content type, header checks, method whitelist, request id
//! - [`control`] - Rate limiting, total timeout, panic catching
//! - [`observability`] - Logging and metrics
//! - [`features`] - System routes, OpenAPI, fallbacks, CORS, security headers
//! - [`builder`] - Orchestration (setup_middleware, start, serve, router delegation)
//! - [`shutdown`] - Shutdown phase notifications

mod builder;
mod control;
mod features;
mod observability;
mod request;
mod router;
mod shutdown;

pub use router::FluentRouter;
pub use shutdown::{ShutdownNotifier, ShutdownPhase};

#[cfg(test)]
mod tests;
