//! Initializes `tracing` from the `logger` configuration section.

use serde::{Deserialize, Serialize};
use serde_variant::to_variant_name;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::{config, Error, Result};

// Crates whose events pass the default filter.
const MODULE_WHITELIST: &[&str] = &["rdfs_studio", "tower_http"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LogLevel {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        to_variant_name(self).unwrap_or("info").fmt(f)
    }
}

/// Filter directives for `config`: `RUST_LOG` wins, then `override_filter`,
/// then every whitelisted crate at the configured level.
#[must_use]
pub fn filter_directives(config: &config::Logger) -> String {
    config.override_filter.clone().unwrap_or_else(|| {
        MODULE_WHITELIST
            .iter()
            .map(|module| format!("{module}={}", config.level))
            .collect::<Vec<_>>()
            .join(",")
    })
}

/// Installs the global subscriber. Does nothing when logging is disabled.
///
/// # Errors
///
/// Fails when the filter does not parse or a global subscriber is already
/// installed.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(config)).map_err(Error::wrap)?,
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        Format::Compact => fmt::layer().compact().boxed(),
        Format::Pretty => fmt::layer().pretty().boxed(),
        Format::Json => fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(Error::wrap)
}

#[cfg(test)]
mod tests {
    use super::{filter_directives, LogLevel};
    use crate::config;

    #[test]
    fn builds_directives_from_level() {
        let mut logger = config::Logger {
            enable: true,
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(filter_directives(&logger), "rdfs_studio=warn,tower_http=warn");

        logger.override_filter = Some("rdfs_studio=trace".to_string());
        assert_eq!(filter_directives(&logger), "rdfs_studio=trace");
    }
}
