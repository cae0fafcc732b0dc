use {crate::Result, serde::Deserialize, tracing_subscriber::EnvFilter};

///
/// Configuration for logging and tracing.
///
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Format for log output.
    /// The default format is `default`, which is "full" human-readable format.
    /// Other options are `json`, `compact`, and `pretty`.
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directive used when `RUST_LOG` is not set, e.g. `"debug"` or
    /// `"axum_hardened=debug,tower_http=info"`. Falls back to `info`.
    #[serde(default)]
    pub level: Option<String>,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = &self.level {
            EnvFilter::try_new(level).map_err(|e| {
                crate::Error::config(format!("[logging] level '{level}' is invalid: {e}"))
            })?;
        }
        Ok(())
    }

    /// Builds the filter from `RUST_LOG`, then `level`, then `info`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.level.as_deref().unwrap_or("info")))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Default,
    Compact,
    Pretty,
}
