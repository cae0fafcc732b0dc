use {
    crate::{Error, HttpHeadersConfig, Result},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    http::{HeaderMap, header::TRANSFER_ENCODING},
    std::sync::Arc,
};

/// Checks header count, per-header size, total size and chunked transfer encoding, in that order.
///
/// The size of a header is the length of its name plus the length of its value.
pub fn check_header_limits(headers: &HeaderMap, config: &HttpHeadersConfig) -> Result<()> {
    if headers.len() > config.max_header_count {
        return Err(Error::header_fields_too_large(format!(
            "Too many headers (limit = {}).",
            config.max_header_count
        )));
    }

    let mut total = 0usize;
    for (name, value) in headers {
        let size = name.as_str().len() + value.len();
        if size > config.max_single_header_bytes {
            return Err(Error::header_fields_too_large(format!(
                "Header exceeds per-header size limit ({} bytes).",
                config.max_single_header_bytes
            )));
        }
        total += size;
    }

    if total > config.max_total_header_bytes {
        return Err(Error::header_fields_too_large(format!(
            "Total header size exceeds limit ({} bytes).",
            config.max_total_header_bytes
        )));
    }

    if !config.allow_chunked {
        let chunked = headers.get_all(TRANSFER_ENCODING).iter().any(|v| {
            v.to_str()
                .map(|s| s.to_ascii_lowercase().contains("chunked"))
                .unwrap_or(false)
        });
        if chunked {
            return Err(Error::unsupported_transfer_encoding(
                "Chunked request bodies are not allowed.",
            ));
        }
    }

    Ok(())
}

pub async fn header_limits(
    State(config): State<Arc<HttpHeadersConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(err) = check_header_limits(req.headers(), &config) {
        tracing::warn!(path = %req.uri().path(), error = %err, "Header limits exceeded");
        return err.into_response();
    }
    next.run(req).await
}
