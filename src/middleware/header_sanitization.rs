use {
    crate::{Error, HttpHeadersConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    http::{HeaderMap, HeaderName},
    regex::Regex,
    std::{collections::HashSet, str::FromStr, sync::Arc, sync::LazyLock},
};

static HEADER_NAME_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());

/// Blocklist and allowlist compiled from [`HttpHeadersConfig`].
///
/// Blocked headers, duplicated names, odd characters in names and CR/LF in
/// values reject the request. Headers outside the allowlist are silently removed.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    allowed: HashSet<HeaderName>,
    blocked: HashSet<HeaderName>,
}

impl HeaderPolicy {
    pub fn from_config(config: &HttpHeadersConfig) -> Result<Self> {
        let parse = |names: &[String]| -> Result<HashSet<HeaderName>> {
            names
                .iter()
                .map(|n| {
                    HeaderName::from_str(n).map_err(|_| {
                        Error::invalid_input(format!("'{n}' is not a valid header name"))
                    })
                })
                .collect()
        };

        Ok(HeaderPolicy {
            allowed: parse(&config.allowed)?,
            blocked: parse(&config.blocked)?,
        })
    }

    /// Rejects forbidden headers, then removes every header not explicitly allowed.
    pub fn sanitize(&self, headers: &mut HeaderMap) -> Result<()> {
        for name in headers.keys() {
            if self.blocked.contains(name) {
                return Err(Error::bad_request(format!("Header '{name}' is not allowed.")));
            }
            if headers.get_all(name).iter().count() > 1 {
                return Err(Error::bad_request(format!(
                    "Duplicate header '{name}' is not permitted."
                )));
            }
            if !HEADER_NAME_REGEXP.is_match(name.as_str()) {
                return Err(Error::bad_request(format!(
                    "Header name '{name}' contains invalid characters."
                )));
            }
        }

        if headers
            .values()
            .any(|v| v.as_bytes().iter().any(|b| *b == b'\r' || *b == b'\n'))
        {
            return Err(Error::bad_request(
                "Header value contains prohibited control characters.",
            ));
        }

        let stripped: Vec<HeaderName> = headers
            .keys()
            .filter(|name| !self.allowed.contains(*name))
            .cloned()
            .collect();
        for name in stripped {
            tracing::trace!(header = %name, "Stripping header outside the allowlist");
            headers.remove(&name);
        }

        Ok(())
    }
}

pub async fn header_sanitization(
    State(policy): State<Arc<HeaderPolicy>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Err(err) = policy.sanitize(req.headers_mut()) {
        tracing::warn!(path = %req.uri().path(), error = %err, "Request headers rejected");
        return err.into_response();
    }
    next.run(req).await
}
