use {
    crate::{HttpSecurityHeadersConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    http::{HeaderName, HeaderValue},
    std::sync::Arc,
};

/// Security headers to stamp on responses, minus the excluded path prefixes.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
    config: HttpSecurityHeadersConfig,
}

impl SecurityHeaders {
    pub fn from_config(config: &HttpSecurityHeadersConfig) -> Result<Self> {
        Ok(SecurityHeaders {
            headers: config.header_pairs()?,
            config: config.clone(),
        })
    }

    fn applies_to(&self, path: &str) -> bool {
        !self.config.is_excluded(path)
    }
}

pub async fn security_headers(
    State(security): State<Arc<SecurityHeaders>>,
    req: Request,
    next: Next,
) -> Response {
    let applies = security.applies_to(req.uri().path());
    let mut response = next.run(req).await;

    if applies {
        let headers = response.headers_mut();
        for (name, value) in &security.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
    response
}
