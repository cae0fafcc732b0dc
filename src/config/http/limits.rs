//! Request limit sections of the HTTP configuration: rate limiting, header
//! limits and sanitization lists, body size, accepted content types and
//! timeouts.

use {
    crate::{Error, Result, utils::normalize_content_type},
    byte_unit::Byte,
    http::HeaderName,
    serde::Deserialize,
    std::{str::FromStr, time::Duration},
};

// ============================================================================
// Rate limiting
// ============================================================================

///
/// Sliding-window rate limit applied per client IP.
///
/// ```toml
/// [http.rate_limit]
/// window = "60s"
/// max_requests = 200
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpRateLimitConfig {
    #[serde(default = "HttpRateLimitConfig::default_window", with = "humantime_serde")]
    pub window: Duration,

    /// Requests allowed per window and per client. Request number `max_requests + 1` gets a 429.
    #[serde(default = "HttpRateLimitConfig::default_max_requests")]
    pub max_requests: u32,
}

impl HttpRateLimitConfig {
    fn default_window() -> Duration {
        Duration::from_secs(60)
    }

    fn default_max_requests() -> u32 {
        200
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(Error::config("[http.rate_limit] window must be > 0"));
        }
        if self.max_requests == 0 {
            return Err(Error::config(
                "[http.rate_limit] max_requests must be > 0. Exclude 'rate-limiting' to disable it.",
            ));
        }
        Ok(())
    }
}

impl Default for HttpRateLimitConfig {
    fn default() -> Self {
        HttpRateLimitConfig {
            window: Self::default_window(),
            max_requests: Self::default_max_requests(),
        }
    }
}

// ============================================================================
// Headers
// ============================================================================

const DEFAULT_BLOCKED_HEADERS: &[&str] = &[
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "proxy-connection",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
    "forwarded",
    "via",
    "client-ip",
    "true-client-ip",
];

const DEFAULT_ALLOWED_HEADERS: &[&str] = &[
    "host",
    "connection",
    "content-type",
    "content-length",
    "accept",
    "accept-language",
    "accept-encoding",
    "user-agent",
    "referer",
    "origin",
    "cookie",
    "sec-fetch-site",
    "sec-fetch-mode",
    "sec-fetch-dest",
    "sec-ch-ua",
    "sec-ch-ua-mobile",
    "sec-ch-ua-platform",
    "authorization",
    "x-csrf-token",
    "x-request-id",
    "x-api-key",
    "access-control-request-method",
    "access-control-request-headers",
];

///
/// Header count and size limits, plus the allow and block lists used by
/// header sanitization.
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpHeadersConfig {
    #[serde(default = "HttpHeadersConfig::default_max_header_count")]
    pub max_header_count: usize,

    /// Limit for `name + value` of any single header, in bytes.
    #[serde(default = "HttpHeadersConfig::default_max_single_header_bytes")]
    pub max_single_header_bytes: usize,

    #[serde(default = "HttpHeadersConfig::default_max_total_header_bytes")]
    pub max_total_header_bytes: usize,

    /// Whether `Transfer-Encoding: chunked` request bodies are accepted. Defaults to false.
    #[serde(default)]
    pub allow_chunked: bool,

    /// Headers kept after sanitization. Everything else is stripped.
    #[serde(default = "HttpHeadersConfig::default_allowed")]
    pub allowed: Vec<String>,

    /// Headers whose presence rejects the request with 400.
    #[serde(default = "HttpHeadersConfig::default_blocked")]
    pub blocked: Vec<String>,
}

impl HttpHeadersConfig {
    fn default_max_header_count() -> usize {
        100
    }

    fn default_max_single_header_bytes() -> usize {
        4096
    }

    fn default_max_total_header_bytes() -> usize {
        8192
    }

    fn default_allowed() -> Vec<String> {
        DEFAULT_ALLOWED_HEADERS.iter().map(|h| h.to_string()).collect()
    }

    fn default_blocked() -> Vec<String> {
        DEFAULT_BLOCKED_HEADERS.iter().map(|h| h.to_string()).collect()
    }

    /// Adds a header to the allow list.
    pub fn with_allowed_header(mut self, name: impl Into<String>) -> Self {
        self.allowed.push(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_header_count == 0
            || self.max_single_header_bytes == 0
            || self.max_total_header_bytes == 0
        {
            return Err(Error::config("[http.headers] limits must be > 0"));
        }

        for name in self.allowed.iter().chain(self.blocked.iter()) {
            HeaderName::from_str(name).map_err(|_| {
                Error::invalid_input(format!("[http.headers] '{name}' is not a valid header name"))
            })?;
        }

        Ok(())
    }
}

impl Default for HttpHeadersConfig {
    fn default() -> Self {
        HttpHeadersConfig {
            max_header_count: Self::default_max_header_count(),
            max_single_header_bytes: Self::default_max_single_header_bytes(),
            max_total_header_bytes: Self::default_max_total_header_bytes(),
            allow_chunked: false,
            allowed: Self::default_allowed(),
            blocked: Self::default_blocked(),
        }
    }
}

// ============================================================================
// Body
// ============================================================================

/// A body limit applied to every path starting with `prefix`.
#[derive(Debug, Clone, Deserialize)]
pub struct BodyLimitOverride {
    pub prefix: String,
    pub limit: Byte,
}

///
/// Maximum request body size.
///
/// ```toml
/// [http.body]
/// default_limit = "1MiB"
/// overrides = [{ prefix = "/api/v1/uploads", limit = "10MiB" }]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpBodyConfig {
    #[serde(default = "HttpBodyConfig::default_limit")]
    pub default_limit: Byte,

    /// Checked in order. The first matching prefix wins.
    #[serde(default)]
    pub overrides: Vec<BodyLimitOverride>,
}

impl HttpBodyConfig {
    fn default_limit() -> Byte {
        Byte::from_u64(1024 * 1024)
    }

    /// Returns the limit in bytes for a request path.
    pub fn limit_for(&self, path: &str) -> u64 {
        self.overrides
            .iter()
            .find(|o| path.starts_with(&o.prefix))
            .map(|o| o.limit)
            .unwrap_or(self.default_limit)
            .as_u64()
    }

    pub fn with_override(mut self, prefix: impl Into<String>, limit: u64) -> Self {
        self.overrides.push(BodyLimitOverride {
            prefix: prefix.into(),
            limit: Byte::from_u64(limit),
        });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_limit.as_u64() == 0 {
            return Err(Error::config("[http.body] default_limit must be > 0"));
        }
        if let Some(o) = self.overrides.iter().find(|o| o.limit.as_u64() == 0) {
            return Err(Error::config(format!(
                "[http.body] override for '{}' must have a limit > 0",
                o.prefix
            )));
        }
        Ok(())
    }
}

impl Default for HttpBodyConfig {
    fn default() -> Self {
        HttpBodyConfig {
            default_limit: Self::default_limit(),
            overrides: Vec::new(),
        }
    }
}

// ============================================================================
// Content type
// ============================================================================

/// Accepted media types for every path starting with `prefix`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentTypeOverride {
    pub prefix: String,
    pub allowed: Vec<String>,
}

///
/// Media types accepted on requests that carry a body.
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpContentTypeConfig {
    #[serde(default = "HttpContentTypeConfig::default_allowed")]
    pub allowed: Vec<String>,

    #[serde(default)]
    pub overrides: Vec<ContentTypeOverride>,
}

impl HttpContentTypeConfig {
    fn default_allowed() -> Vec<String> {
        vec!["application/json".into(), "multipart/form-data".into()]
    }

    /// Returns the normalized allowed set for a path, sorted.
    pub fn allowed_for(&self, path: &str) -> Vec<String> {
        let list = self
            .overrides
            .iter()
            .find(|o| path.starts_with(&o.prefix))
            .map(|o| &o.allowed)
            .unwrap_or(&self.allowed);

        let mut allowed: Vec<String> = list.iter().map(|ct| normalize_content_type(ct)).collect();
        allowed.sort();
        allowed.dedup();
        allowed
    }

    pub fn validate(&self) -> Result<()> {
        if self.allowed.is_empty() {
            return Err(Error::config("[http.content_type] allowed must not be empty"));
        }
        if let Some(o) = self.overrides.iter().find(|o| o.allowed.is_empty()) {
            return Err(Error::config(format!(
                "[http.content_type] override for '{}' must allow at least one type",
                o.prefix
            )));
        }
        Ok(())
    }
}

impl Default for HttpContentTypeConfig {
    fn default() -> Self {
        HttpContentTypeConfig {
            allowed: Self::default_allowed(),
            overrides: Vec::new(),
        }
    }
}

// ============================================================================
// Timeouts
// ============================================================================

///
/// Request timeout watchdog.
///
/// `header` bounds the wait for the first body frame, `chunk` bounds the gap
/// between frames and `total` bounds the whole request including the handler.
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpTimeoutsConfig {
    #[serde(default = "HttpTimeoutsConfig::default_header", with = "humantime_serde")]
    pub header: Duration,

    #[serde(default = "HttpTimeoutsConfig::default_chunk", with = "humantime_serde")]
    pub chunk: Duration,

    #[serde(default = "HttpTimeoutsConfig::default_total", with = "humantime_serde")]
    pub total: Duration,
}

impl HttpTimeoutsConfig {
    fn default_header() -> Duration {
        Duration::from_secs(5)
    }

    fn default_chunk() -> Duration {
        Duration::from_secs(2)
    }

    fn default_total() -> Duration {
        Duration::from_secs(10)
    }

    pub fn validate(&self) -> Result<()> {
        if self.header.is_zero() || self.chunk.is_zero() || self.total.is_zero() {
            return Err(Error::config("[http.timeouts] durations must be > 0"));
        }
        Ok(())
    }
}

impl Default for HttpTimeoutsConfig {
    fn default() -> Self {
        HttpTimeoutsConfig {
            header: Self::default_header(),
            chunk: Self::default_chunk(),
            total: Self::default_total(),
        }
    }
}
