//! The contract between setting resolution and an HTTP client implementation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::client::filter::ResponseFilter;
use crate::config::MultipartEncoderMode;
use crate::config::QueryParamStyle;
use crate::error::RestClientResult;
use crate::keystore::KeyStore;
use crate::net::hostname::HostnameVerifier;

/// Implementation-specific settings passed through `ClientBuilder::property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "value", rename_all = "kebab-case")]
pub enum ClientProperty {
    ConnectionPoolSize(u32),
    ConnectionTtl(Duration),
    MaxRedirects(u32),
    MultipartEncoderMode(MultipartEncoderMode),
}

impl ClientProperty {
    pub fn name(&self) -> &'static str {
        match self {
            ClientProperty::ConnectionPoolSize(_) => "connection-pool-size",
            ClientProperty::ConnectionTtl(_) => "connection-ttl",
            ClientProperty::MaxRedirects(_) => "max-redirects",
            ClientProperty::MultipartEncoderMode(_) => "multipart-post-encoder-mode",
        }
    }
}

/// Receives resolved settings and produces a client.
///
/// Every setter is called at most once per construction, except `register`
/// and `property`. Settings that did not resolve are never passed.
pub trait ClientBuilder {
    type Client;

    fn base_url(&mut self, url: Url);

    fn connect_timeout(&mut self, timeout: Duration);

    fn read_timeout(&mut self, timeout: Duration);

    /// Add a response filter. Filters run in registration order.
    fn register(&mut self, provider: Arc<dyn ResponseFilter>);

    fn trust_store(&mut self, store: KeyStore);

    fn key_store(&mut self, store: KeyStore, password: String);

    fn hostname_verifier(&mut self, verifier: Arc<dyn HostnameVerifier>);

    /// Accept any server certificate.
    fn trust_all(&mut self);

    fn proxy_address(&mut self, host: &str, port: u16);

    fn follow_redirects(&mut self, follow: bool);

    fn query_param_style(&mut self, style: QueryParamStyle);

    fn property(&mut self, property: ClientProperty);

    fn build(self) -> RestClientResult<Self::Client>;
}
