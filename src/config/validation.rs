//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (pool size > 0)
//! - Check that URLs and proxy addresses are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConfigRoot → Result<(), Vec<ValidationError>>
//! - Store passwords are not checked here; they may come from dynamic properties

use thiserror::Error;

use crate::client::proxy::ProxyAddress;
use crate::config::keys::structured_key;
use crate::config::schema::{ClientScope, ConfigRoot};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: {message}")]
pub struct ValidationError {
    /// Structured key of the offending field.
    pub key: String,
    pub message: String,
}

impl ValidationError {
    fn new(prefix: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            key: structured_key(prefix, field),
            message: message.into(),
        }
    }
}

/// Validate the typed configuration.
pub fn validate_config(root: &ConfigRoot) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Sorted for stable error order
    let mut prefixes: Vec<&String> = root.clients.keys().collect();
    prefixes.sort();

    for prefix in prefixes {
        let client = &root.clients[prefix];

        if prefix.trim().is_empty() {
            errors.push(ValidationError::new(prefix, "", "client prefix must not be empty"));
        }

        // Blank counts as unset
        for (field, value) in [("url", &client.url), ("uri", &client.uri)] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                if let Err(e) = url::Url::parse(value) {
                    errors.push(ValidationError::new(
                        prefix,
                        field,
                        format!("invalid URL '{}': {}", value, e),
                    ));
                }
            }
        }

        if let Some(proxy) = &client.proxy_address {
            if let Err(e) = ProxyAddress::parse(proxy) {
                errors.push(ValidationError::new(prefix, "proxy-address", e.to_string()));
            }
        }

        if client.connection_pool_size == Some(0) {
            errors.push(ValidationError::new(
                prefix,
                "connection-pool-size",
                "must be greater than zero",
            ));
        }

        if let Some(scope) = &client.scope {
            if let Err(e) = scope.parse::<ClientScope>() {
                errors.push(ValidationError::new(prefix, "scope", e));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
