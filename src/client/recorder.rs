//! A `ClientBuilder` that records what it is told.
//!
//! Used to show the effective settings of a client without opening
//! connections.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::client::builder::{ClientBuilder, ClientProperty};
use crate::client::filter::ResponseFilter;
use crate::config::QueryParamStyle;
use crate::error::RestClientResult;
use crate::keystore::KeyStore;
use crate::net::hostname::HostnameVerifier;

/// Loaded store, as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub source: String,
    pub store_type: String,
    pub entries: usize,
}

impl From<&KeyStore> for StoreSummary {
    fn from(store: &KeyStore) -> Self {
        Self {
            source: store.source().to_string(),
            store_type: store.store_type().to_string(),
            entries: store.len(),
        }
    }
}

/// Effective settings of one client.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientSettings {
    pub base_url: Option<String>,
    pub connect_timeout_ms: Option<u128>,
    pub read_timeout_ms: Option<u128>,
    pub providers: Vec<String>,
    pub trust_store: Option<StoreSummary>,
    pub key_store: Option<StoreSummary>,
    pub hostname_verifier: Option<String>,
    pub trust_all: bool,
    pub proxy_address: Option<String>,
    pub follow_redirects: Option<bool>,
    pub query_param_style: Option<QueryParamStyle>,
    pub properties: Vec<ClientProperty>,
}

impl ClientSettings {
    pub fn property(&self, name: &str) -> Option<&ClientProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }
}

#[derive(Debug, Default)]
pub struct SettingsRecorder {
    settings: ClientSettings,
}

impl SettingsRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientBuilder for SettingsRecorder {
    type Client = ClientSettings;

    fn base_url(&mut self, url: Url) {
        self.settings.base_url = Some(url.to_string());
    }

    fn connect_timeout(&mut self, timeout: Duration) {
        self.settings.connect_timeout_ms = Some(timeout.as_millis());
    }

    fn read_timeout(&mut self, timeout: Duration) {
        self.settings.read_timeout_ms = Some(timeout.as_millis());
    }

    fn register(&mut self, provider: Arc<dyn ResponseFilter>) {
        self.settings.providers.push(provider.name().to_string());
    }

    fn trust_store(&mut self, store: KeyStore) {
        self.settings.trust_store = Some(StoreSummary::from(&store));
    }

    fn key_store(&mut self, store: KeyStore, _password: String) {
        self.settings.key_store = Some(StoreSummary::from(&store));
    }

    fn hostname_verifier(&mut self, verifier: Arc<dyn HostnameVerifier>) {
        self.settings.hostname_verifier = Some(format!("{:?}", verifier));
    }

    fn trust_all(&mut self) {
        self.settings.trust_all = true;
    }

    fn proxy_address(&mut self, host: &str, port: u16) {
        self.settings.proxy_address = Some(format!("{}:{}", host, port));
    }

    fn follow_redirects(&mut self, follow: bool) {
        self.settings.follow_redirects = Some(follow);
    }

    fn query_param_style(&mut self, style: QueryParamStyle) {
        self.settings.query_param_style = Some(style);
    }

    fn property(&mut self, property: ClientProperty) {
        self.settings.properties.push(property);
    }

    fn build(self) -> RestClientResult<ClientSettings> {
        Ok(self.settings)
    }
}
