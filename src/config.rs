//! # Configuration Management
//!
//! Configuration lives in `config/{environment}.yaml`. Files are rendered
//! with Tera before parsing, so values can come from the process
//! environment:
//!
//! ```yaml
//! server:
//!   port: {{ get_env(name="PORT", default="5150") }}
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{editor::OntologyHeader, environment::Environment, logger, Error, Result};

pub const CONFIG_FOLDER_ENV: &str = "RDFS_STUDIO_CONFIG_FOLDER";
const DEFAULT_FOLDER: &str = "config";

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logger: Logger,
    pub server: Server,
    #[serde(default)]
    pub editor: EditorConfig,
}

/// Logger configuration
///
/// Example (development):
/// ```yaml
/// logger:
///   enable: true
///   level: debug
///   format: compact
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Logger {
    pub enable: bool,

    #[serde(default)]
    pub level: logger::LogLevel,

    #[serde(default)]
    pub format: logger::Format,

    /// Replaces the default filter directives, for example
    /// `rdfs_studio=trace,tower_http=warn`.
    pub override_filter: Option<String>,
}

/// Server configuration
///
/// Example (development):
/// ```yaml
/// server:
///   port: 5150
///   host: http://localhost
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Server {
    #[serde(default = "default_binding")]
    pub binding: String,
    pub port: i32,
    /// Public address, used to build session ontology uris.
    pub host: String,
}

fn default_binding() -> String {
    "localhost".to_string()
}

impl Server {
    #[must_use]
    pub fn full_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Editor defaults applied to every new session.
///
/// Example:
/// ```yaml
/// editor:
///   language: en
///   presets: [xsd, rdfs]
///   header:
///     instance_namespace: http://example.com/inst#
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorConfig {
    #[serde(default = "default_language")]
    pub language: String,

    /// Bundled vocabularies imported into new sessions.
    #[serde(default)]
    pub presets: Vec<String>,

    #[serde(default)]
    pub header: OntologyHeader,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            presets: Vec::new(),
            header: OntologyHeader::default(),
        }
    }
}

impl Config {
    /// Loads `config/{env}.yaml`, or the folder named by
    /// `RDFS_STUDIO_CONFIG_FOLDER`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing, cannot be rendered or
    /// does not parse.
    pub fn new(env: &Environment) -> Result<Self> {
        let folder = std::env::var(CONFIG_FOLDER_ENV).map_or_else(
            |_| PathBuf::from(DEFAULT_FOLDER),
            PathBuf::from,
        );
        Self::from_folder(env, &folder)
    }

    /// Loads `{folder}/{env}.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing, cannot be rendered or
    /// does not parse.
    pub fn from_folder(env: &Environment, folder: &Path) -> Result<Self> {
        let path = folder.join(format!("{env}.yaml"));
        if !path.exists() {
            return Err(Error::Message(format!(
                "no configuration file found at `{}`",
                path.display()
            )));
        }
        tracing::info!(selected_path = %path.display(), "loading environment from");
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content, &path.display().to_string())
    }

    /// Renders and parses a configuration document. `origin` names the
    /// document in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error when rendering or parsing fails.
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        let rendered = render_string(content)?;
        serde_yaml::from_str(&rendered).map_err(|err| Error::YAMLFile(err, origin.to_string()))
    }
}

fn render_string(template: &str) -> Result<String> {
    let context = tera::Context::from_serialize(json!({}))?;
    Ok(tera::Tera::one_off(template, &context, false)?)
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::logger::{Format, LogLevel};

    #[test]
    fn renders_environment_defaults() {
        let config = Config::from_yaml(
            r#"
logger:
  enable: true
  level: debug
  format: json
server:
  port: {{ get_env(name="RDFS_STUDIO_UNSET_PORT", default="7000") }}
  host: http://localhost
editor:
  presets: [xsd]
"#,
            "inline",
        )
        .expect("config");

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.binding, "localhost");
        assert_eq!(config.server.full_url(), "http://localhost:7000");
        assert_eq!(config.logger.level, LogLevel::Debug);
        assert_eq!(config.logger.format, Format::Json);
        assert_eq!(config.editor.language, "en");
        assert_eq!(config.editor.presets, ["xsd"]);
        assert_eq!(config.editor.header.prefix, "ex");
    }

    #[test]
    fn reports_the_broken_document() {
        let err = Config::from_yaml("logger: [", "broken.yaml").expect_err("invalid");
        assert!(err.to_string().contains("broken.yaml"));
    }
}
