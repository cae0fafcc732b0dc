//! Routes owned by the router (system probes, OpenAPI, JSON fallbacks) and
//! the response policy middleware (CORS, security headers).

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {
    crate::{
        Error, Result,
        api::{SystemState, system_routes},
        middleware::{CorsPolicy, SecurityHeaders, cors, security_headers},
    },
    axum::middleware::from_fn_with_state,
    http::{Method, Uri},
    std::sync::Arc,
};

#[cfg(feature = "openapi")]
use crate::openapi;

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Adds `/`, `/health`, `/ready`, `/info` and `/system`.
    ///
    /// `/ready` answers 503 until the lifecycle started every service, as
    /// soon as shutdown begins and whenever a registered service reports
    /// itself unhealthy. `/system` reports the health of the service named
    /// `database`.
    #[must_use]
    pub fn setup_system_routes(mut self) -> Self {
        let state = SystemState {
            app: self.config.app.clone(),
            lifecycle: self.lifecycle.clone(),
        };
        self.inner = self.inner.merge(system_routes(state));
        self
    }

    /// Serves the OpenAPI document at `/openapi.json` and `/docs-json` and
    /// the Scalar UI at `/docs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    #[cfg(feature = "openapi")]
    pub fn setup_openapi(mut self) -> Result<Self> {
        let doc = openapi::document(&self.config.app);
        self.inner = self.inner.merge(openapi::docs_routes(doc)?);
        Ok(self)
    }

    /// Answers unknown routes with a JSON 404 and known routes hit with the
    /// wrong method with a JSON 405.
    #[must_use]
    pub fn setup_fallbacks(mut self) -> Self {
        self.inner = self
            .inner
            .fallback(|method: Method, uri: Uri| async move {
                Error::route_not_found(&method, &uri)
            })
            .method_not_allowed_fallback(|method: Method| async move {
                Error::method_not_allowed(&method)
            });
        self
    }

    /// Sets up CORS from `[http.cors]`.
    ///
    /// Requests from an origin that is not allowed get `403`. Preflight
    /// `OPTIONS` requests are answered with `204` directly.
    ///
    /// ```toml
    /// [http.cors]
    /// allow_credentials = true
    /// allowed_origins = ["https://app.example.com"]
    /// allowed_methods = ["GET", "POST", "PUT", "PATCH", "DELETE"]
    /// allowed_headers = ["content-type", "authorization"]
    /// exposed_headers = ["x-request-id"]
    /// max_age = "1h"
    /// ```
    ///
    /// A `*` origin is allowed only without credentials; validation refuses
    /// the combination.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header value cannot be built.
    pub fn setup_cors(mut self) -> Result<Self> {
        if !self.is_middleware_enabled(HttpMiddleware::Cors) {
            return Ok(self);
        }

        let policy = Arc::new(CorsPolicy::from_config(&self.config.http.cors)?);
        self.inner = self.inner.layer(from_fn_with_state(policy, cors));
        Ok(self)
    }

    /// Adds the configured security headers to every response, except on the
    /// excluded paths (the API docs by default).
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header value is invalid.
    pub fn setup_security_headers(mut self) -> Result<Self> {
        if !self.is_middleware_enabled(HttpMiddleware::SecurityHeaders) {
            return Ok(self);
        }

        let headers = Arc::new(SecurityHeaders::from_config(
            &self.config.http.security_headers,
        )?);
        self.inner = self
            .inner
            .layer(from_fn_with_state(headers, security_headers));
        Ok(self)
    }
}
