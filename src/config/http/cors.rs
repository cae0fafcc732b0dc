use crate::{Error, Result};
use http::{HeaderName, Method};
use serde::Deserialize;
use std::{str::FromStr, time::Duration};

/// Configuration for Cross-Origin Resource Sharing (CORS).
///
/// Requests whose `Origin` is not listed are refused with 403. A `"*"` entry
/// accepts every origin. Missing fields take the defaults below.
///
/// ```toml
/// [http.cors]
/// allowed_origins = ["https://app.example.com"]
/// allowed_methods = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
/// allowed_headers = ["content-type", "authorization", "x-requested-with"]
/// exposed_headers = ["authorization", "set-cookie"]
/// allow_credentials = true
/// max_age = "1day"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpCorsConfig {
    /// Whether `Access-Control-Allow-Credentials: true` is sent. Defaults to true.
    #[serde(default = "HttpCorsConfig::default_allow_credentials")]
    pub allow_credentials: bool,

    /// Origins allowed to make CORS requests. Defaults to `["http://localhost:3000"]`.
    #[serde(default = "HttpCorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "HttpCorsConfig::default_allowed_methods")]
    pub allowed_methods: Vec<CorsMethod>,

    #[serde(default = "HttpCorsConfig::default_allowed_headers")]
    pub allowed_headers: Vec<CorsHeader>,

    #[serde(default = "HttpCorsConfig::default_exposed_headers")]
    pub exposed_headers: Vec<CorsHeader>,

    /// How long browsers may cache preflight responses. Defaults to one day.
    #[serde(default = "HttpCorsConfig::default_max_age", with = "humantime_serde")]
    pub max_age: Duration,
}

impl HttpCorsConfig {
    fn default_allow_credentials() -> bool {
        true
    }

    fn default_allowed_origins() -> Vec<String> {
        vec!["http://localhost:3000".into()]
    }

    fn default_allowed_methods() -> Vec<CorsMethod> {
        [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ]
        .into_iter()
        .map(CorsMethod)
        .collect()
    }

    fn default_allowed_headers() -> Vec<CorsHeader> {
        vec![
            CorsHeader(http::header::CONTENT_TYPE),
            CorsHeader(http::header::AUTHORIZATION),
            CorsHeader(HeaderName::from_static("x-requested-with")),
        ]
    }

    fn default_exposed_headers() -> Vec<CorsHeader> {
        vec![
            CorsHeader(http::header::AUTHORIZATION),
            CorsHeader(http::header::SET_COOKIE),
        ]
    }

    fn default_max_age() -> Duration {
        Duration::from_secs(86_400)
    }

    /// Returns true when the origin list contains `"*"`.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    /// Returns true when a request carrying `origin` may proceed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allows_any_origin() || self.allowed_origins.iter().any(|o| o == origin)
    }

    /// Enables credentials (cookies, authorization headers) in CORS requests.
    ///
    /// ```rust
    /// use axum_hardened::HttpCorsConfig;
    ///
    /// let cors = HttpCorsConfig::default()
    ///     .with_allow_credentials(true)
    ///     .with_allowed_origins(vec!["https://app.example.com".into()]);
    /// assert!(cors.is_origin_allowed("https://app.example.com"));
    /// ```
    pub fn with_allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_allowed_methods(mut self, methods: Vec<CorsMethod>) -> Self {
        self.allowed_methods = methods;
        self
    }

    pub fn with_allowed_headers(mut self, headers: Vec<CorsHeader>) -> Self {
        self.allowed_headers = headers;
        self
    }

    pub fn with_exposed_headers(mut self, headers: Vec<CorsHeader>) -> Self {
        self.exposed_headers = headers;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Rejects a wildcard origin combined with credentials.
    pub fn validate(&self) -> Result<()> {
        if self.allow_credentials && self.allows_any_origin() {
            return Err(Error::config(
                "[http.cors] allowed_origins cannot contain \"*\" when allow_credentials = true. List the origins explicitly.",
            ));
        }
        Ok(())
    }
}

impl Default for HttpCorsConfig {
    fn default() -> Self {
        HttpCorsConfig {
            allow_credentials: Self::default_allow_credentials(),
            allowed_origins: Self::default_allowed_origins(),
            allowed_methods: Self::default_allowed_methods(),
            allowed_headers: Self::default_allowed_headers(),
            exposed_headers: Self::default_exposed_headers(),
            max_age: Self::default_max_age(),
        }
    }
}

/// HTTP method deserialized from a string such as `"GET"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsMethod(pub Method);

impl<'de> Deserialize<'de> for CorsMethod {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let method = Method::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(CorsMethod(method))
    }
}

/// Header name deserialized from a string, validated against HTTP token rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeader(pub HeaderName);

impl<'de> Deserialize<'de> for CorsHeader {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let header = HeaderName::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(CorsHeader(header))
    }
}
