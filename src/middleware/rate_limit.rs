//! Sliding-window rate limiting keyed by client IP.
//!
//! Every key keeps the instants of its recent requests. A request first
//! forgets the instants that fell out of the window, records itself and is
//! refused when the count goes above the limit.

use {
    super::client_ip,
    crate::{Error, HttpRateLimitConfig},
    axum::{
        extract::Request,
        response::{IntoResponse, Response},
    },
    dashmap::DashMap,
    http::{HeaderValue, header::RETRY_AFTER},
    std::{
        future::Future,
        pin::Pin,
        sync::Arc,
        task::{Context, Poll},
        time::{Duration, Instant},
    },
    tower::{Layer, Service},
};

#[derive(Debug, Clone)]
pub struct RateLimiter {
    hits: Arc<DashMap<String, Vec<Instant>>>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(config: &HttpRateLimitConfig) -> Self {
        Self {
            hits: Arc::new(DashMap::new()),
            window: config.window,
            max_requests: config.max_requests,
        }
    }

    /// Records a hit for `key` and returns true when the key is over its limit.
    pub fn check_and_record(&self, key: &str) -> bool {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self.hits.entry(key.to_owned()).or_default();
        let hits = entry.value_mut();
        hits.retain(|t| now.saturating_duration_since(*t) < self.window);
        hits.push(now);
        hits.len() > self.max_requests as usize
    }

    /// Drops keys without a hit inside the window.
    pub fn prune(&self) {
        let now = Instant::now();
        self.hits.retain(|_, hits| {
            hits.last()
                .is_some_and(|t| now.saturating_duration_since(*t) < self.window)
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.hits.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Prunes idle keys every `interval`. Runs until aborted.
pub async fn prune_task(limiter: RateLimiter, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        limiter.prune();
        tracing::debug!(
            tracked_keys = limiter.tracked_keys(),
            "Pruned idle rate limiting entries"
        );
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitLayer {
    limiter: RateLimiter,
}

impl RateLimitLayer {
    pub fn new(limiter: RateLimiter) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: RateLimiter,
}

impl<S> Service<Request> for RateLimitService<S>
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
        let key = client_ip(&req);
        let limiter = self.limiter.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            if limiter.check_and_record(&key) {
                tracing::warn!(ip = %key, path = %req.uri().path(), "Rate limit exceeded");

                let window = limiter.window;
                let mut response = Error::rate_limited(limiter.max_requests, window).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(window.as_secs()));
                return Ok(response);
            }

            inner.call(req).await
        })
    }
}
