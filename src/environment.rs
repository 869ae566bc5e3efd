//! # Application Environment
//!
//! The environment selects which `config/{environment}.yaml` file is loaded.
//!
//! ```
//! use std::str::FromStr;
//! use rdfs_studio::environment::Environment;
//!
//! assert_eq!(Environment::from_str("test").unwrap(), Environment::Test);
//! assert_eq!(Environment::from_str("staging").unwrap(), Environment::Any("staging".to_string()));
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_variant::to_variant_name;

use crate::{config::Config, Result};

pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const ENV_VAR: &str = "RDFS_STUDIO_ENV";

/// Reads the environment name from `RDFS_STUDIO_ENV`, falling back to
/// `development`.
#[must_use]
pub fn resolve_from_env() -> String {
    std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Environment {
    #[serde(rename = "production")]
    Production,
    #[default]
    #[serde(rename = "development")]
    Development,
    #[serde(rename = "test")]
    Test,
    Any(String),
}

impl Environment {
    /// Loads the configuration of this environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be read, rendered
    /// or parsed.
    pub fn load(&self) -> Result<Config> {
        Config::new(self)
    }
}

impl From<String> for Environment {
    fn from(env: String) -> Self {
        Self::from_str(&env).unwrap_or(Self::Any(env))
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match input {
            "production" => Self::Production,
            "development" => Self::Development,
            "test" => Self::Test,
            s => Self::Any(s.to_string()),
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any(s) => s.fmt(f),
            _ => to_variant_name(self).unwrap_or("").fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;

    #[test]
    fn display_uses_config_file_names() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Any("qa".to_string()).to_string(), "qa");
    }
}
