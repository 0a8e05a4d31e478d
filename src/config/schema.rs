//! Configuration schema definitions.
//!
//! This module defines the typed configuration consumed when building
//! clients. All types derive Serde traits for deserialization from config
//! files; keys are kebab-case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration shared by every client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConfigRoot {
    /// Per-client settings, keyed by configuration prefix.
    pub clients: HashMap<String, ClientConfig>,

    /// Encoder mode for form and multipart bodies.
    pub multipart_post_encoder_mode: Option<MultipartEncoderMode>,

    /// Disable content-type inference for endpoints without an explicit one.
    pub disable_smart_produces: Option<bool>,

    /// Accept any server certificate and hostname.
    pub trust_all: Option<bool>,

    /// Directories searched for `classpath:` resources.
    pub resource_dirs: Vec<PathBuf>,
}

impl ConfigRoot {
    /// Settings for a prefix, or `None` when the prefix is not configured.
    pub fn client(&self, prefix: &str) -> Option<&ClientConfig> {
        self.clients.get(prefix)
    }
}

/// Settings for one client prefix. Every field is optional.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientConfig {
    /// Base URL. This or `uri` is required unless the interface declares one.
    pub url: Option<String>,

    /// Base URI. Takes precedence over `url`.
    pub uri: Option<String>,

    /// Injection scope, simple or fully qualified name.
    pub scope: Option<String>,

    /// Comma-separated provider identifiers.
    pub providers: Option<String>,

    /// Connect timeout in milliseconds.
    pub connect_timeout: Option<u64>,

    /// Read timeout in milliseconds.
    pub read_timeout: Option<u64>,

    pub follow_redirects: Option<bool>,

    /// `<host>:<port>` of an HTTP proxy.
    pub proxy_address: Option<String>,

    pub query_param_style: Option<QueryParamStyle>,

    /// Trust store location, `classpath:` resource or file.
    pub trust_store: Option<String>,
    pub trust_store_password: Option<String>,
    pub trust_store_type: Option<String>,

    /// Key store location, `classpath:` resource or file.
    pub key_store: Option<String>,
    pub key_store_password: Option<String>,
    pub key_store_type: Option<String>,

    /// Registered hostname verifier identifier.
    pub hostname_verifier: Option<String>,

    /// Idle time in milliseconds before a pooled connection is evicted (0 = never).
    pub connection_ttl: Option<u32>,

    pub connection_pool_size: Option<u32>,

    pub max_redirects: Option<u32>,
}

/// How multiple values of one query parameter are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(try_from = "String", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryParamStyle {
    /// `k=a&k=b`
    #[default]
    MultiPairs,
    /// `k=a,b`
    CommaSeparated,
    /// `k[]=a&k[]=b`
    ArrayPairs,
}

impl FromStr for QueryParamStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "MULTI_PAIRS" => Ok(QueryParamStyle::MultiPairs),
            "COMMA_SEPARATED" => Ok(QueryParamStyle::CommaSeparated),
            "ARRAY_PAIRS" => Ok(QueryParamStyle::ArrayPairs),
            _ => Err("expected one of MULTI_PAIRS, COMMA_SEPARATED, ARRAY_PAIRS".to_string()),
        }
    }
}

impl TryFrom<String> for QueryParamStyle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Encoding used for form bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", rename_all = "UPPERCASE")]
pub enum MultipartEncoderMode {
    Rfc1738,
    Rfc3986,
    Html5,
}

impl FromStr for MultipartEncoderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RFC1738" => Ok(MultipartEncoderMode::Rfc1738),
            "RFC3986" => Ok(MultipartEncoderMode::Rfc3986),
            "HTML5" => Ok(MultipartEncoderMode::Html5),
            _ => Err("expected one of RFC1738, RFC3986, HTML5".to_string()),
        }
    }
}

impl TryFrom<String> for MultipartEncoderMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle the embedding application should give a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ClientScope {
    #[default]
    ApplicationScoped,
    Singleton,
    RequestScoped,
    Dependent,
}

impl FromStr for ClientScope {
    type Err = String;

    /// Accepts `Singleton` as well as `javax.inject.Singleton`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let simple = s.trim().rsplit('.').next().unwrap_or_default();
        match simple {
            "ApplicationScoped" => Ok(ClientScope::ApplicationScoped),
            "Singleton" => Ok(ClientScope::Singleton),
            "RequestScoped" => Ok(ClientScope::RequestScoped),
            "Dependent" => Ok(ClientScope::Dependent),
            _ => Err(format!("unknown scope '{}'", s)),
        }
    }
}
