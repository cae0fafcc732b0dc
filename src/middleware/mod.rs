//! Custom tower layers and axum middleware functions making up the hardening stack.
//!
//! Pure predicates (method whitelist, header limits, content type, CORS,
//! security headers) are plain `async fn`s wired with `axum::middleware::from_fn`.
//! Stateful or body-touching concerns (rate limiting, body metering, the total
//! timeout) are `Layer` + `Service` pairs.
//!
//! The order in which [`crate::FluentRouter::setup_middleware`] installs them is:
//!
//! ```text
//! catch panic → request id / context → logging → metrics → security headers
//!   → CORS → method whitelist → header limits → header sanitization
//!   → rate limiting → total timeout → content type → body limit → routes
//! ```

mod body_limit;
mod content_type;
mod context;
mod cors;
mod header_limits;
mod header_sanitization;
mod logging;
mod method_whitelist;
#[cfg(feature = "metrics")]
mod metrics;
mod rate_limit;
mod security_headers;
mod timeout;

pub use body_limit::*;
pub use content_type::*;
pub use context::*;
pub use cors::*;
pub use header_limits::*;
pub use header_sanitization::*;
pub use logging::*;
pub use method_whitelist::*;
#[cfg(feature = "metrics")]
pub use metrics::*;
pub use rate_limit::*;
pub use security_headers::*;
pub use timeout::*;
