//! `ClientBuilder` over reqwest.

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use url::Url;

use crate::client::builder::{ClientBuilder, ClientProperty};
use crate::client::filter::ResponseFilter;
use crate::client::proxy::ProxyAddress;
use crate::client::rest_client::RestClient;
use crate::config::{MultipartEncoderMode, QueryParamStyle};
use crate::error::{RestClientError, RestClientResult};
use crate::keystore::KeyStore;
use crate::net::hostname::HostnameVerifier;
use crate::net::tls::{self, TlsSettings};

/// Redirect limit when following is enabled without an explicit maximum.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Collects settings, then builds a [`RestClient`].
#[derive(Debug, Default)]
pub struct ReqwestClientBuilder {
    base_url: Option<Url>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    filters: Vec<Arc<dyn ResponseFilter>>,
    tls: TlsSettings,
    proxy: Option<ProxyAddress>,
    follow_redirects: bool,
    max_redirects: Option<u32>,
    query_style: QueryParamStyle,
    pool_size: Option<u32>,
    connection_ttl: Option<Duration>,
    encoder_mode: Option<MultipartEncoderMode>,
}

impl ReqwestClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn redirect_policy(&self) -> Policy {
        if self.follow_redirects {
            Policy::limited(self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS) as usize)
        } else {
            Policy::none()
        }
    }
}

impl ClientBuilder for ReqwestClientBuilder {
    type Client = RestClient;

    fn base_url(&mut self, url: Url) {
        self.base_url = Some(url);
    }

    fn connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = Some(timeout);
    }

    fn read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = Some(timeout);
    }

    fn register(&mut self, provider: Arc<dyn ResponseFilter>) {
        self.filters.push(provider);
    }

    fn trust_store(&mut self, store: KeyStore) {
        self.tls.trust_store = Some(store);
    }

    fn key_store(&mut self, store: KeyStore, password: String) {
        self.tls.key_store = Some((store, password));
    }

    fn hostname_verifier(&mut self, verifier: Arc<dyn HostnameVerifier>) {
        self.tls.hostname_verifier = Some(verifier);
    }

    fn trust_all(&mut self) {
        self.tls.trust_all = true;
    }

    fn proxy_address(&mut self, host: &str, port: u16) {
        self.proxy = Some(ProxyAddress {
            host: host.to_string(),
            port,
        });
    }

    fn follow_redirects(&mut self, follow: bool) {
        self.follow_redirects = follow;
    }

    fn query_param_style(&mut self, style: QueryParamStyle) {
        self.query_style = style;
    }

    fn property(&mut self, property: ClientProperty) {
        match property {
            ClientProperty::ConnectionPoolSize(size) => self.pool_size = Some(size),
            ClientProperty::ConnectionTtl(ttl) => self.connection_ttl = Some(ttl),
            ClientProperty::MaxRedirects(max) => self.max_redirects = Some(max),
            ClientProperty::MultipartEncoderMode(mode) => self.encoder_mode = Some(mode),
        }
    }

    fn build(self) -> RestClientResult<RestClient> {
        let base_url = self.base_url.clone().ok_or_else(|| RestClientError::InvalidValue {
            key: "url".to_string(),
            value: String::new(),
            reason: "no base URL was configured".to_string(),
        })?;

        let mut builder = reqwest::Client::builder().redirect(self.redirect_policy());

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.read_timeout {
            builder = builder.read_timeout(timeout);
        }
        if let Some(size) = self.pool_size {
            builder = builder.pool_max_idle_per_host(size as usize);
        }
        if let Some(ttl) = self.connection_ttl {
            builder = builder.pool_idle_timeout((!ttl.is_zero()).then_some(ttl));
        }
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.to_url())?);
        }
        if self.tls.is_customized() {
            builder = builder.use_preconfigured_tls(tls::client_config(&self.tls)?);
        }

        let http = builder.build()?;
        Ok(RestClient::new(
            http,
            base_url,
            self.query_style,
            self.encoder_mode,
            self.filters,
        ))
    }
}
