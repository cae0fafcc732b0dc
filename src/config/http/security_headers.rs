use {
    crate::{Error, Result},
    http::{HeaderName, HeaderValue},
    serde::Deserialize,
};

///
/// Security headers added to every response, except below `excluded_paths`.
///
/// Every value can be overridden. An empty string drops that header.
///
/// ```toml
/// [http.security_headers]
/// x_frame_options = "SAMEORIGIN"
/// content_security_policy = ""
/// excluded_paths = ["/docs", "/openapi.json"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSecurityHeadersConfig {
    pub x_frame_options: String,
    pub x_content_type_options: String,
    pub referrer_policy: String,
    pub x_xss_protection: String,
    pub strict_transport_security: String,
    pub cross_origin_opener_policy: String,
    pub cross_origin_embedder_policy: String,
    pub cross_origin_resource_policy: String,
    pub permissions_policy: String,
    pub content_security_policy: String,

    /// Path prefixes that receive no security headers, so the docs UI can load.
    pub excluded_paths: Vec<String>,
}

impl HttpSecurityHeadersConfig {
    /// Returns true when `path` starts with one of the excluded prefixes.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// The configured headers as typed pairs, skipping empty values.
    pub fn header_pairs(&self) -> Result<Vec<(HeaderName, HeaderValue)>> {
        let pairs = [
            ("x-frame-options", &self.x_frame_options),
            ("x-content-type-options", &self.x_content_type_options),
            ("referrer-policy", &self.referrer_policy),
            ("x-xss-protection", &self.x_xss_protection),
            ("strict-transport-security", &self.strict_transport_security),
            ("cross-origin-opener-policy", &self.cross_origin_opener_policy),
            ("cross-origin-embedder-policy", &self.cross_origin_embedder_policy),
            ("cross-origin-resource-policy", &self.cross_origin_resource_policy),
            ("permissions-policy", &self.permissions_policy),
            ("content-security-policy", &self.content_security_policy),
        ];

        pairs
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| {
                let value = HeaderValue::from_str(value).map_err(|_| {
                    Error::invalid_input(format!(
                        "[http.security_headers] value for '{name}' is not a valid header value"
                    ))
                })?;
                Ok((HeaderName::from_static(name), value))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        self.header_pairs().map(|_| ())
    }
}

impl Default for HttpSecurityHeadersConfig {
    fn default() -> Self {
        HttpSecurityHeadersConfig {
            x_frame_options: "DENY".into(),
            x_content_type_options: "nosniff".into(),
            referrer_policy: "strict-origin-when-cross-origin".into(),
            x_xss_protection: "0".into(),
            strict_transport_security: "max-age=63072000; includeSubDomains; preload".into(),
            cross_origin_opener_policy: "same-origin".into(),
            cross_origin_embedder_policy: "require-corp".into(),
            cross_origin_resource_policy: "same-origin".into(),
            permissions_policy: "geolocation=(), microphone=(), camera=()".into(),
            content_security_policy: "default-src 'self'; img-src 'self' data:; object-src 'none'; frame-ancestors 'none'; base-uri 'self'".into(),
            excluded_paths: vec!["/docs".into(), "/redoc".into(), "/openapi.json".into()],
        }
    }
}
