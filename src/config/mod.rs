//!
//! Configuration structures and utilities for wiring up the service.
//!
//! A configuration can be created in many ways:
//! - From an environment-specific TOML file via `Config::from_rust_env` or `Config::from_toml_file`
//! - From a TOML string via `Config::from_toml`
//! - Constructed programmatically via the builder methods on `Config`
//!
//! In both TOML-based methods, environment variables can be referenced in the TOML
//! using the {{ VAR_NAME }} syntax, and they will be substituted with the corresponding
//! environment variable value before parsing.
//!
//! Configuration is split into logical sections, each represented by their own struct:
//!
//! - `AppConfig` for the service identity
//! - `HttpConfig` for the server and every hardening middleware
//! - `DatabaseConfig` for the PostgreSQL pool (feature `postgres`)
//! - `LoggingConfig` for log format and filtering
//!
mod app;
mod http;
mod logging;

#[cfg(feature = "postgres")]
mod database;
#[cfg(feature = "postgres")]
pub use database::*;

pub use app::*;
pub use http::*;
pub use logging::*;

#[cfg(feature = "postgres")]
use sqlx_postgres::{
    PgConnectOptions as PoolConnectOptions, PgPool as Pool, PgPoolOptions as PoolOptions,
};

pub use byte_unit::Byte;

use {
    crate::{Error, Result, utils::replace_handlebars_with_env},
    serde::Deserialize,
    std::{env, fs, str::FromStr, time::Duration},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[cfg(feature = "postgres")]
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    ///
    /// Loads the file selected by RUST_ENV, falling back to built-in defaults
    /// when the variable is unset or the file cannot be loaded.
    ///
    fn default() -> Self {
        match Self::from_rust_env() {
            Ok(config) => config,
            Err(_) => Config {
                app: AppConfig::default(),
                http: HttpConfig::default(),
                #[cfg(feature = "postgres")]
                database: DatabaseConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }
}

impl Config {
    ///
    /// Loads the configuration file named by the RUST_ENV environment variable.
    /// Fails when RUST_ENV is not set.
    ///
    pub fn from_rust_env() -> Result<Config> {
        Self::from_toml_file(env::var("RUST_ENV")?)
    }

    ///
    /// Loads "config/{env}.toml", substituting environment variables first.
    ///
    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    ///
    /// Parses a configuration string in TOML format into a Config struct.
    ///
    pub fn from_toml(toml_str: &str) -> Result<Config> {
        toml_str.parse()
    }

    /// Sets the service name reported by `/` and `/info`.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app.name = name.into();
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.app.environment = environment;
        self
    }

    /// Sets the HTTP server bind address of the HttpConfig.
    pub fn with_bind_addr<S: AsRef<str>>(mut self, addr: S) -> Self {
        self.http.bind_addr = addr.as_ref().into();
        self
    }

    /// Sets the HTTP server bind port of the HttpConfig.
    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.http.bind_port = port;
        self
    }

    /// Sets the graceful shutdown drain budget.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.http.shutdown_timeout = timeout;
        self
    }

    /// Sets the sliding-window rate limit.
    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.http.rate_limit.max_requests = max_requests;
        self.http.rate_limit.window = window;
        self
    }

    /// Sets the default request body limit in bytes.
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.http.body.default_limit = Byte::from_u64(bytes);
        self
    }

    /// Sets the header, chunk and total request timeouts.
    pub fn with_timeouts(mut self, header: Duration, chunk: Duration, total: Duration) -> Self {
        self.http.timeouts = HttpTimeoutsConfig {
            header,
            chunk,
            total,
        };
        self
    }

    /// Sets the CORS configuration of the HttpConfig.
    pub fn with_cors_config(mut self, cors_config: HttpCorsConfig) -> Self {
        self.http.cors = cors_config;
        self
    }

    /// Activates only the specified middlewares.
    pub fn with_included_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Include(middlewares));
        self
    }

    /// Activates all middlewares except the specified ones.
    pub fn with_excluded_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Exclude(middlewares));
        self
    }

    /// Sets the Postgres database connection URL of the DatabaseConfig.
    #[cfg(feature = "postgres")]
    pub fn with_pg_url(mut self, url: &str) -> Self {
        self.database.url = crate::Sensitive::from(url);
        self
    }

    /// Sets the maximum pool size of the DatabaseConfig.
    #[cfg(feature = "postgres")]
    pub fn with_pg_max_pool_size(mut self, size: u8) -> Self {
        self.database.max_pool_size = size;
        self
    }

    /// Sets the maximum idle time duration of the DatabaseConfig.
    #[cfg(feature = "postgres")]
    pub fn with_pg_max_idle_time(mut self, duration: Duration) -> Self {
        self.database.max_idle_time = Some(duration);
        self
    }

    /// Sets the log format of the LoggingConfig.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    /// Sets the fallback log filter used when RUST_LOG is unset.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = Some(level.into());
        self
    }

    /// Ensures that the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        self.app.validate()?;
        #[cfg(feature = "postgres")]
        self.database.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    ///
    /// Sets up the tracing subscriber for logging based on the LoggingConfig.
    ///
    /// NOTE: This should be called early during startup to ensure logging is configured
    ///       before any log messages are emitted.
    ///
    pub fn setup_tracing(&self) {
        use tracing_subscriber::prelude::*;
        let env_filter = self.logging.env_filter();
        match self.logging.format {
            LogFormat::Json => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().json())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Default => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Compact => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().compact())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Pretty => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .with(env_filter)
                    .try_init();
            }
        }
    }

    ///
    /// Builds a lazily connecting Postgres pool from the DatabaseConfig.
    /// The application_name is set to the service name so that connections
    /// are easy to spot in the database logs.
    ///
    #[cfg(feature = "postgres")]
    pub fn create_pgpool(&self) -> Result<Pool> {
        let pool_options = PoolOptions::default()
            .min_connections(self.database.min_pool_size as u32)
            .max_connections(self.database.max_pool_size as u32)
            .idle_timeout(self.database.max_idle_time);

        let connect_options = PoolConnectOptions::from_str(&self.database.url.0)?
            .application_name(&self.app.name)
            .ssl_mode(sqlx_postgres::PgSslMode::Prefer);

        Ok(pool_options.connect_lazy_with(connect_options))
    }
}

///
/// Parses a configuration string with references to environment variables
/// into a Config struct by substituting the environment variables and then
/// parsing the resulting TOML.
///
impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}
