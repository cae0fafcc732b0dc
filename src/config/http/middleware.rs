use crate::{Error, Result};
use serde::Deserialize;

/// Selects which middleware layers are active.
///
/// ```toml
/// [http.middleware]
/// exclude = ["rate-limiting", "metrics"]
/// ```
///
/// When the section is absent every middleware is enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMiddlewareConfig {
    Include(Vec<HttpMiddleware>),
    Exclude(Vec<HttpMiddleware>),
}

impl HttpMiddlewareConfig {
    pub fn is_enabled(&self, middleware: HttpMiddleware) -> bool {
        match self {
            HttpMiddlewareConfig::Include(list) => list.contains(&middleware),
            HttpMiddlewareConfig::Exclude(list) => !list.contains(&middleware),
        }
    }

    /// Validates middleware dependencies are satisfied.
    ///
    /// The body-limit layer is the one that applies the header and chunk
    /// watchdogs, so excluding it while keeping `timeout` would silently drop
    /// them. That combination is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.is_enabled(HttpMiddleware::Timeout) && !self.is_enabled(HttpMiddleware::BodyLimit)
        {
            return Err(Error::invalid_input(
                "Timeout requires BodyLimit for header and chunk timeouts. Remove 'body-limit' from Exclude list or add both to Include list.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum HttpMiddleware {
    CatchPanic,
    RequestContext,
    Logging,
    Metrics,
    SecurityHeaders,
    Cors,
    MethodWhitelist,
    HeaderLimits,
    HeaderSanitization,
    RateLimiting,
    Timeout,
    ContentType,
    BodyLimit,
}
