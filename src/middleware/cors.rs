use {
    crate::{Error, HttpCorsConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
    },
    std::sync::Arc,
};

/// CORS headers precomputed from [`HttpCorsConfig`].
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    config: HttpCorsConfig,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    expose_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &HttpCorsConfig) -> Result<Self> {
        let join = |items: Vec<&str>| HeaderValue::from_str(&items.join(", "));

        Ok(CorsPolicy {
            allow_methods: join(config.allowed_methods.iter().map(|m| m.0.as_str()).collect())?,
            allow_headers: join(config.allowed_headers.iter().map(|h| h.0.as_str()).collect())?,
            expose_headers: join(config.exposed_headers.iter().map(|h| h.0.as_str()).collect())?,
            max_age: HeaderValue::from(config.max_age.as_secs()),
            config: config.clone(),
        })
    }

    /// Returns an error when `origin` is present but not accepted. An origin
    /// that is not valid UTF-8 never matches.
    pub fn check_origin(&self, origin: Option<&HeaderValue>) -> Result<()> {
        let Some(origin) = origin else {
            return Ok(());
        };
        match origin.to_str() {
            Ok(o) if self.config.is_origin_allowed(o) => Ok(()),
            _ => Err(Error::forbidden(format!(
                "CORS origin '{}' not allowed.",
                String::from_utf8_lossy(origin.as_bytes())
            ))),
        }
    }

    /// Adds the CORS response headers.
    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        match origin {
            Some(origin) => {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            }
            None if self.config.allows_any_origin() => {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
            None => {}
        }

        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        if !self.expose_headers.is_empty() {
            headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, self.expose_headers.clone());
        }
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        if self.config.allow_credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

pub async fn cors(State(policy): State<Arc<CorsPolicy>>, req: Request, next: Next) -> Response {
    let origin = req.headers().get(ORIGIN).cloned();

    if let Err(err) = policy.check_origin(origin.as_ref()) {
        tracing::warn!(origin = ?origin, path = %req.uri().path(), "CORS origin rejected");
        return err.into_response();
    }

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    policy.apply(response.headers_mut(), origin.as_ref());
    response
}
