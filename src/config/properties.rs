//! Dynamic property lookup.
//!
//! # Responsibilities
//! - Look up untyped `key -> string` properties across ordered sources
//! - Decode values into typed settings
//!
//! # Design Decisions
//! - Sources are consulted in order; the first one holding a key wins
//! - Absence is `Ok(None)`, never an error
//! - A present value that fails to decode is an error naming key and value

use std::collections::HashMap;

use crate::config::schema::{MultipartEncoderMode, QueryParamStyle};
use crate::error::{RestClientError, RestClientResult};
use crate::keystore::StoreType;

/// A source of untyped properties.
pub trait PropertySource: Send + Sync + std::fmt::Debug {
    /// Raw value for `key`, if this source defines it.
    fn get(&self, key: &str) -> Option<String>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// In-memory properties, typically the `[properties]` table of a config file.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    name: String,
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertySource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = MapSource::new("map");
        for (k, v) in iter {
            source.insert(k, v);
        }
        source
    }
}

/// Process environment.
///
/// A key is tried verbatim, then with every non-alphanumeric character
/// replaced by `_`, then that form upper-cased.
#[derive(Debug, Clone, Default)]
pub struct EnvSource;

impl EnvSource {
    pub fn new() -> Self {
        Self
    }

    fn candidates(key: &str) -> [String; 3] {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let upper = sanitized.to_ascii_uppercase();
        [key.to_string(), sanitized, upper]
    }
}

impl PropertySource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        Self::candidates(key)
            .iter()
            .find_map(|candidate| std::env::var(candidate).ok())
    }

    fn name(&self) -> &str {
        "environment"
    }
}

/// Ordered collection of property sources.
#[derive(Debug, Default)]
pub struct DynamicProperties {
    sources: Vec<Box<dyn PropertySource>>,
}

impl DynamicProperties {
    /// No sources: every lookup is absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with lower precedence than those already present.
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Raw value from the first source that defines `key`.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            let value = source.get(key)?;
            tracing::trace!(key, source = source.name(), "Dynamic property found");
            Some(value)
        })
    }

    /// Typed value for `key`; decoding failures are configuration errors.
    pub fn get<T: FromProperty>(&self, key: &str) -> RestClientResult<Option<T>> {
        match self.get_raw(key) {
            Some(raw) => T::from_property(&raw)
                .map(Some)
                .map_err(|reason| RestClientError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                    reason,
                }),
            None => Ok(None),
        }
    }
}

/// Decoding of a raw property string.
pub trait FromProperty: Sized {
    fn from_property(raw: &str) -> Result<Self, String>;
}

impl FromProperty for bool {
    fn from_property(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(true),
            "false" | "no" | "n" | "off" | "0" => Ok(false),
            _ => Err("expected a boolean".to_string()),
        }
    }
}

macro_rules! from_str_property {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromProperty for $ty {
                fn from_property(raw: &str) -> Result<Self, String> {
                    raw.trim().parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_str_property!(u16, u32, u64, QueryParamStyle, MultipartEncoderMode, StoreType);

impl FromProperty for String {
    fn from_property(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}
