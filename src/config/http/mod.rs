mod cors;
mod limits;
mod middleware;
mod security_headers;

pub use cors::*;
pub use limits::*;
pub use middleware::*;
pub use security_headers::*;

use {
    crate::{Error, Result},
    serde::Deserialize,
    std::time::Duration,
};

///
/// Configuration for the HTTP server
///
/// Holds the bind address, the graceful shutdown budget and one section per
/// hardening middleware. Every section has defaults, so an empty `[http]`
/// table yields a fully hardened server on 127.0.0.1:3000.
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// IP address to bind the HTTP server to
    /// The default `bind_addr` is "127.0.0.1".
    #[serde(default = "HttpConfig::default_bind_addr")]
    pub bind_addr: String,

    /// Port to bind the HTTP server to
    /// The default `bind_port` is 3000.
    #[serde(default = "HttpConfig::default_bind_port")]
    pub bind_port: u16,

    /// Maximum time to wait for in-flight requests to drain after a shutdown
    /// signal. By default `shutdown_timeout` is set to 30 seconds.
    #[serde(
        default = "HttpConfig::default_shutdown_timeout",
        with = "humantime_serde"
    )]
    pub shutdown_timeout: Duration,

    /// Which middleware layers are active. All of them when absent.
    #[serde(default)]
    pub middleware: Option<HttpMiddlewareConfig>,

    #[serde(default)]
    pub rate_limit: HttpRateLimitConfig,

    #[serde(default)]
    pub headers: HttpHeadersConfig,

    #[serde(default)]
    pub body: HttpBodyConfig,

    #[serde(default)]
    pub content_type: HttpContentTypeConfig,

    #[serde(default)]
    pub timeouts: HttpTimeoutsConfig,

    #[serde(default)]
    pub cors: HttpCorsConfig,

    #[serde(default)]
    pub security_headers: HttpSecurityHeadersConfig,
}

impl HttpConfig {
    ///
    /// Returns the full bind address as a string in the format "IP:PORT".
    ///
    pub fn full_bind_addr(&self) -> String {
        match self.bind_addr.parse::<std::net::IpAddr>() {
            Ok(std::net::IpAddr::V6(_)) => format!("[{}]:{}", self.bind_addr, self.bind_port),
            _ => format!("{}:{}", self.bind_addr, self.bind_port),
        }
    }

    fn default_bind_addr() -> String {
        "127.0.0.1".into()
    }

    fn default_bind_port() -> u16 {
        3000
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(30)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(Error::invalid_input(
                "HTTP bind_addr is required. Set [http] bind_addr = \"0.0.0.0\" or \"127.0.0.1\" in config.",
            ));
        }

        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(Error::invalid_input(
                "HTTP bind_addr must be a valid IP address. Examples: \"127.0.0.1\", \"0.0.0.0\", \"::1\"",
            ));
        }

        if let Some(middleware_config) = &self.middleware {
            middleware_config.validate()?;
        }

        self.rate_limit.validate()?;
        self.headers.validate()?;
        self.body.validate()?;
        self.content_type.validate()?;
        self.timeouts.validate()?;
        self.cors.validate()?;
        self.security_headers.validate()?;

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            bind_addr: Self::default_bind_addr(),
            bind_port: Self::default_bind_port(),
            shutdown_timeout: Self::default_shutdown_timeout(),
            middleware: None,
            rate_limit: HttpRateLimitConfig::default(),
            headers: HttpHeadersConfig::default(),
            body: HttpBodyConfig::default(),
            content_type: HttpContentTypeConfig::default(),
            timeouts: HttpTimeoutsConfig::default(),
            cors: HttpCorsConfig::default(),
            security_headers: HttpSecurityHeadersConfig::default(),
        }
    }
}
