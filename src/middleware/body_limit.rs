//! Request body metering.
//!
//! The body is pulled frame by frame and counted against the limit for the
//! request path. When the timeout watchdog is active the first frame must
//! arrive within the header timeout and every following frame within the
//! chunk timeout. The collected body is handed to the inner service and the
//! response reports the limit and what was left of it.

use {
    crate::{Error, HttpBodyConfig, HttpTimeoutsConfig, Result},
    axum::{
        body::Body,
        extract::Request,
        response::{IntoResponse, Response},
    },
    http::{HeaderName, HeaderValue, header::CONTENT_LENGTH},
    http_body_util::BodyExt,
    std::{
        future::Future,
        pin::Pin,
        sync::Arc,
        task::{Context, Poll},
        time::Duration,
    },
    tower::{Layer, Service},
};

pub const X_BODY_LIMIT_BYTES: HeaderName = HeaderName::from_static("x-body-limit-bytes");
pub const X_BODY_REMAINING_BYTES: HeaderName = HeaderName::from_static("x-body-remaining-bytes");

/// Deadlines applied while the body is being read.
#[derive(Debug, Clone, Copy)]
struct ReadDeadlines {
    header: Duration,
    chunk: Duration,
}

#[derive(Clone)]
pub struct BodyLimitLayer {
    config: Arc<HttpBodyConfig>,
    deadlines: Option<ReadDeadlines>,
}

impl BodyLimitLayer {
    pub fn new(config: HttpBodyConfig) -> Self {
        Self {
            config: Arc::new(config),
            deadlines: None,
        }
    }

    /// Enables the header and chunk watchdogs.
    pub fn with_timeouts(mut self, timeouts: &HttpTimeoutsConfig) -> Self {
        self.deadlines = Some(ReadDeadlines {
            header: timeouts.header,
            chunk: timeouts.chunk,
        });
        self
    }
}

impl<S> Layer<S> for BodyLimitLayer {
    type Service = BodyLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BodyLimitService {
            inner,
            config: self.config.clone(),
            deadlines: self.deadlines,
        }
    }
}

#[derive(Clone)]
pub struct BodyLimitService<S> {
    inner: S,
    config: Arc<HttpBodyConfig>,
    deadlines: Option<ReadDeadlines>,
}

impl<S> Service<Request> for BodyLimitService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let limit = self.config.limit_for(req.uri().path());
        let deadlines = self.deadlines;
        // Keep the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (parts, body) = req.into_parts();

            let declared = parts
                .headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            if declared.is_some_and(|len| len > limit) {
                tracing::warn!(path = %parts.uri.path(), limit, "Declared body length exceeds limit");
                return Ok(too_large(limit));
            }

            let bytes = match read_body(body, limit, deadlines).await {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == crate::ErrorKind::PayloadTooLarge => {
                    tracing::warn!(path = %parts.uri.path(), limit, "Request body exceeds limit");
                    return Ok(too_large(limit));
                }
                Err(err) => return Ok(err.into_response()),
            };

            let total = bytes.len() as u64;
            let req = Request::from_parts(parts, Body::from(bytes));
            let mut response = inner.call(req).await?;

            let headers = response.headers_mut();
            headers.insert(X_BODY_LIMIT_BYTES, HeaderValue::from(limit));
            headers.insert(
                X_BODY_REMAINING_BYTES,
                HeaderValue::from(limit.saturating_sub(total)),
            );
            Ok(response)
        })
    }
}

fn too_large(limit: u64) -> Response {
    let mut response = Error::payload_too_large(limit).into_response();
    let headers = response.headers_mut();
    headers.insert(X_BODY_LIMIT_BYTES, HeaderValue::from(limit));
    headers.insert(X_BODY_REMAINING_BYTES, HeaderValue::from(0u64));
    response
}

/// Collects `body`, failing as soon as more than `limit` bytes were seen.
async fn read_body(
    mut body: Body,
    limit: u64,
    deadlines: Option<ReadDeadlines>,
) -> Result<Vec<u8>> {
    let mut collected = Vec::new();
    let mut total = 0u64;
    let mut first = true;

    loop {
        let next = match deadlines {
            Some(d) => {
                let wait = if first { d.header } else { d.chunk };
                tokio::time::timeout(wait, body.frame()).await.map_err(|_| {
                    Error::request_timeout(if first {
                        "Header timeout exceeded."
                    } else {
                        "Chunk timeout exceeded."
                    })
                })?
            }
            None => body.frame().await,
        };
        first = false;

        let Some(frame) = next else {
            break;
        };
        let frame = frame.map_err(|e| Error::bad_request(format!("Failed to read request body: {e}")))?;

        if let Ok(data) = frame.into_data() {
            total += data.len() as u64;
            if total > limit {
                return Err(Error::payload_too_large(limit));
            }
            collected.extend_from_slice(&data);
        }
    }

    Ok(collected)
}
