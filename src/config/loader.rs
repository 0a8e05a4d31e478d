//! Configuration loading from disk.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::properties::MapSource;
use crate::config::schema::ConfigRoot;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Contents of a configuration file.
///
/// ```toml
/// [rest-client]
/// multipart-post-encoder-mode = "HTML5"
///
/// [rest-client.clients.echo]
/// url = "http://localhost:8080"
///
/// [properties]
/// "echo/mp-rest/readTimeout" = 2000
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConfigFile {
    /// Typed client configuration.
    pub rest_client: ConfigRoot,

    /// Legacy dynamic properties.
    pub properties: toml::Table,
}

impl ConfigFile {
    /// Flatten `[properties]` into a property source.
    ///
    /// Nested tables join their keys with `.`, arrays join their items with `,`.
    pub fn property_source(&self) -> MapSource {
        let mut source = MapSource::new("config file");
        flatten_into(&mut source, None, &self.properties);
        source
    }
}

fn flatten_into(source: &mut MapSource, parent: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let full_key = match parent {
            Some(parent) => format!("{}.{}", parent, key),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_into(source, Some(&full_key), nested),
            other => source.insert(full_key, scalar_to_string(other)),
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<ConfigFile, ConfigError> {
    let config: ConfigFile = toml::from_str(content)?;

    validate_config(&config.rest_client).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    tracing::info!(
        path = %path.display(),
        clients = config.rest_client.clients.len(),
        properties = config.properties.len(),
        "Configuration loaded"
    );

    Ok(config)
}
