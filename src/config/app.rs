use {
    crate::{Error, Result},
    serde::{Deserialize, Serialize},
    std::fmt,
};

///
/// Identity of the running service, reported by `/`, `/info` and the logs.
///
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Service name. Defaults to the crate package name.
    #[serde(default = "AppConfig::default_name")]
    pub name: String,

    /// Service version. Defaults to the crate package version.
    #[serde(default = "AppConfig::default_version")]
    pub version: String,

    /// Deployment environment. Defaults to `development`.
    #[serde(default)]
    pub environment: Environment,
}

impl AppConfig {
    fn default_name() -> String {
        env!("CARGO_PKG_NAME").into()
    }

    fn default_version() -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config(
                "[app] name must not be empty. Remove it to use the package name.",
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            name: Self::default_name(),
            version: Self::default_version(),
            environment: Environment::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}
