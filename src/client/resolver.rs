//! Layered setting lookup.
//!
//! # Precedence
//! ```text
//! typed ClientConfig field for the prefix
//!     → "<interface>/mp-rest/<setting>"
//!     → "<prefix>/mp-rest/<setting>"
//!     → absent
//! ```
//!
//! Absence is never an error. A present value that does not decode is.

use crate::config::keys::legacy_key;
use crate::config::{ClientConfig, DynamicProperties, FromProperty};
use crate::error::RestClientResult;

/// Resolves settings for one client construction.
#[derive(Debug, Clone, Copy)]
pub struct LayeredResolver<'a> {
    config: Option<&'a ClientConfig>,
    properties: &'a DynamicProperties,
    interface_name: &'a str,
    prefix: &'a str,
}

impl<'a> LayeredResolver<'a> {
    pub fn new(
        config: Option<&'a ClientConfig>,
        properties: &'a DynamicProperties,
        interface_name: &'a str,
        prefix: &'a str,
    ) -> Self {
        Self {
            config,
            properties,
            interface_name,
            prefix,
        }
    }

    /// Typed field, else the interface legacy key, else the prefix legacy key.
    pub fn with_fallback<T, F>(&self, typed: F, setting: &str) -> RestClientResult<Option<T>>
    where
        T: FromProperty,
        F: FnOnce(&ClientConfig) -> Option<T>,
    {
        if let Some(value) = self.config.and_then(typed) {
            tracing::debug!(prefix = %self.prefix, setting, "Resolved from client config");
            return Ok(Some(value));
        }

        for subject in [self.interface_name, self.prefix] {
            let key = legacy_key(subject, setting);
            if let Some(value) = self.properties.get::<T>(&key)? {
                tracing::debug!(prefix = %self.prefix, key = %key, "Resolved from legacy property");
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// Typed field only.
    pub fn client_only<T, F>(&self, typed: F) -> Option<T>
    where
        F: FnOnce(&ClientConfig) -> Option<T>,
    {
        self.config.and_then(typed)
    }

    /// A process-wide typed value, else the global dynamic `key`.
    pub fn global_with_fallback<T: FromProperty>(
        &self,
        typed: Option<T>,
        key: &str,
    ) -> RestClientResult<Option<T>> {
        match typed {
            Some(value) => Ok(Some(value)),
            None => self.properties.get::<T>(key),
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix
    }

    pub fn interface_name(&self) -> &str {
        self.interface_name
    }
}
