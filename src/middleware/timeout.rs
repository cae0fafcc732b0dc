use {
    crate::Error,
    axum::{
        extract::Request,
        response::{IntoResponse, Response},
    },
    std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
        time::Duration,
    },
    tower::{Layer, Service},
};

/// Fails a request with 408 when it takes longer than `total`, handler included.
#[derive(Debug, Clone, Copy)]
pub struct TotalTimeoutLayer {
    total: Duration,
}

impl TotalTimeoutLayer {
    pub fn new(total: Duration) -> Self {
        Self { total }
    }
}

impl<S> Layer<S> for TotalTimeoutLayer {
    type Service = TotalTimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TotalTimeoutService {
            inner,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TotalTimeoutService<S> {
    inner: S,
    total: Duration,
}

impl<S> Service<Request> for TotalTimeoutService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let total = self.total;
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let future = self.inner.call(req);

        Box::pin(async move {
            match tokio::time::timeout(total, future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        %method,
                        %path,
                        timeout_ms = total.as_millis() as u64,
                        "Request exceeded total timeout"
                    );
                    Ok(Error::request_timeout("Request exceeded total timeout.").into_response())
                }
            }
        })
    }
}
