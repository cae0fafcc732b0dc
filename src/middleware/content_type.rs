use {
    crate::{Error, HttpContentTypeConfig, Result, utils::normalize_content_type},
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    http::{HeaderMap, Method, header::CONTENT_TYPE},
    std::sync::Arc,
};

/// Validates the `Content-Type` of a request against the method and the path.
///
/// Bodiless methods must not declare a type, body-carrying methods must, and the
/// declared type must belong to the set configured for the path.
pub fn check_content_type(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    config: &HttpContentTypeConfig,
) -> Result<()> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    match *method {
        Method::GET | Method::DELETE | Method::HEAD | Method::OPTIONS => {
            if content_type.is_some() {
                return Err(Error::unsupported_media_type(format!(
                    "HTTP method '{method}' does not accept a request body."
                )));
            }
            Ok(())
        }
        Method::POST | Method::PUT | Method::PATCH => {
            let Some(content_type) = content_type else {
                return Err(Error::unsupported_media_type("Missing Content-Type header."));
            };

            let allowed = config.allowed_for(path);
            if !allowed.contains(&normalize_content_type(content_type)) {
                return Err(Error::unsupported_media_type(format!(
                    "Content-Type '{content_type}' is not allowed on this endpoint. Expected one of: {}.",
                    allowed.join(", ")
                )));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

pub async fn content_type(
    State(config): State<Arc<HttpContentTypeConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(err) = check_content_type(req.method(), req.uri().path(), req.headers(), &config) {
        return err.into_response();
    }
    next.run(req).await
}
