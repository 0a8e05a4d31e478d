//! Client construction from layered configuration.
//!
//! # Data Flow
//! ```text
//! RestClientContext (ConfigRoot, DynamicProperties, Registry)
//!     → RestClientBase (interface name, prefix, declared base URI)
//!     → base URL → timeouts → providers → TLS → redirects
//!       → query style → proxy → custom properties
//!     → ClientBuilder::build
//! ```
//!
//! Any failing step aborts construction; no partially configured client is
//! returned.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::client::builder::{ClientBuilder, ClientProperty};
use crate::client::filter::ResponseFilter;
use crate::client::proxy::ProxyAddress;
use crate::client::resolver::LayeredResolver;
use crate::client::rest_client::RestInterface;
use crate::config::keys::{self, structured_key};
use crate::config::{ClientScope, ConfigFile, ConfigRoot, DynamicProperties, EnvSource};
use crate::error::{RestClientError, RestClientResult, StoreKind};
use crate::keystore::{load_store, StoreType};
use crate::net::hostname::NOOP_HOSTNAME_VERIFIER;
use crate::net::transport::ReqwestClientBuilder;
use crate::registry::Registry;

/// Process-wide inputs shared by every client construction.
#[derive(Debug, Clone)]
pub struct RestClientContext {
    root: Arc<ConfigRoot>,
    properties: Arc<DynamicProperties>,
    registry: Arc<Registry>,
}

impl RestClientContext {
    pub fn new(root: ConfigRoot, properties: DynamicProperties, registry: Registry) -> Self {
        Self {
            root: Arc::new(root),
            properties: Arc::new(properties),
            registry: Arc::new(registry),
        }
    }

    /// Environment variables over the file's `[properties]`, with every
    /// link-time registration.
    pub fn from_config_file(file: ConfigFile) -> Self {
        let properties = DynamicProperties::new()
            .with_source(EnvSource::new())
            .with_source(file.property_source());
        Self::new(file.rest_client, properties, Registry::discover())
    }

    pub fn root(&self) -> &ConfigRoot {
        &self.root
    }

    pub fn properties(&self) -> &DynamicProperties {
        &self.properties
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Build a `T` for `prefix` (defaults to the interface name).
    pub fn create_client<T: RestInterface>(
        &self,
        base_uri: Option<&str>,
        prefix: Option<&str>,
        extra_providers: Vec<Arc<dyn ResponseFilter>>,
    ) -> RestClientResult<T> {
        RestClientBase::new(self, T::interface_name(), prefix)
            .with_base_uri(base_uri)
            .with_extra_providers(extra_providers)
            .create::<T>()
    }
}

/// One client construction.
#[derive(Debug)]
pub struct RestClientBase {
    interface_name: String,
    prefix: String,
    base_uri: Option<String>,
    extra_providers: Vec<Arc<dyn ResponseFilter>>,
    root: Arc<ConfigRoot>,
    properties: Arc<DynamicProperties>,
    registry: Arc<Registry>,
}

impl RestClientBase {
    pub fn new(context: &RestClientContext, interface_name: &str, prefix: Option<&str>) -> Self {
        Self {
            interface_name: interface_name.to_string(),
            prefix: prefix.unwrap_or(interface_name).to_string(),
            base_uri: None,
            extra_providers: Vec::new(),
            root: context.root.clone(),
            properties: context.properties.clone(),
            registry: context.registry.clone(),
        }
    }

    /// Base URI declared alongside the interface; the lowest-precedence source.
    pub fn with_base_uri(mut self, base_uri: Option<&str>) -> Self {
        self.base_uri = base_uri.map(str::to_string);
        self
    }

    /// Providers registered after the configured ones.
    pub fn with_extra_providers(mut self, providers: Vec<Arc<dyn ResponseFilter>>) -> Self {
        self.extra_providers = providers;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build a `T` over the reqwest transport.
    pub fn create<T: RestInterface>(&self) -> RestClientResult<T> {
        self.build(ReqwestClientBuilder::new()).map(T::from_client)
    }

    /// Configure `builder` and build it.
    pub fn build<B: ClientBuilder>(&self, mut builder: B) -> RestClientResult<B::Client> {
        self.configure(&mut builder)?;
        let client = builder.build()?;
        tracing::info!(
            prefix = %self.prefix,
            interface = %self.interface_name,
            "Rest client created"
        );
        Ok(client)
    }

    /// Run every configuration step against `builder`, in order.
    pub fn configure<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        self.configure_base_url(builder)?;
        self.configure_timeouts(builder)?;
        self.configure_providers(builder)?;
        self.configure_tls(builder)?;
        self.configure_redirects(builder)?;
        self.configure_query_param_style(builder)?;
        self.configure_proxy(builder)?;
        self.configure_custom_properties(builder)?;
        Ok(())
    }

    /// Lifecycle the embedding application should give this client.
    pub fn resolve_scope(&self) -> RestClientResult<ClientScope> {
        let resolver = self.resolver();
        match resolver.with_fallback(|c| c.scope.clone(), keys::SCOPE)? {
            Some(scope) => scope.parse().map_err(|reason| RestClientError::InvalidValue {
                key: keys::SCOPE.to_string(),
                value: scope,
                reason,
            }),
            None => Ok(ClientScope::default()),
        }
    }

    fn resolver(&self) -> LayeredResolver<'_> {
        LayeredResolver::new(
            self.root.client(&self.prefix),
            &self.properties,
            &self.interface_name,
            &self.prefix,
        )
    }

    fn configure_base_url<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let base_url = match non_empty(resolver.with_fallback(|c| c.uri.clone(), keys::URI)?) {
            Some(uri) => uri,
            None => match non_empty(resolver.with_fallback(|c| c.url.clone(), keys::URL)?) {
                Some(url) => url,
                None => non_empty(self.base_uri.clone()).ok_or_else(|| {
                    RestClientError::MissingBaseUrl {
                        prefix: self.prefix.clone(),
                        url_key: structured_key(&self.prefix, keys::URL),
                        uri_key: structured_key(&self.prefix, keys::URI),
                    }
                })?,
            },
        };

        let url = Url::parse(base_url.trim()).map_err(|source| RestClientError::InvalidBaseUrl {
            value: base_url.clone(),
            source,
        })?;
        tracing::debug!(prefix = %self.prefix, url = %url, "Base URL resolved");
        builder.base_url(url);
        Ok(())
    }

    fn configure_timeouts<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();
        if let Some(ms) = resolver.with_fallback(|c| c.connect_timeout, keys::CONNECT_TIMEOUT)? {
            builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = resolver.with_fallback(|c| c.read_timeout, keys::READ_TIMEOUT)? {
            builder.read_timeout(Duration::from_millis(ms));
        }
        Ok(())
    }

    fn configure_providers<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();
        if let Some(names) = resolver.with_fallback(|c| c.providers.clone(), keys::PROVIDERS)? {
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                builder.register(self.registry.provider(name)?);
                tracing::debug!(prefix = %self.prefix, provider = name, "Provider registered");
            }
        }
        for provider in &self.extra_providers {
            builder.register(provider.clone());
        }
        Ok(())
    }

    fn configure_tls<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();

        let verifier_name =
            resolver.with_fallback(|c| c.hostname_verifier.clone(), keys::HOSTNAME_VERIFIER)?;

        let trust_all = resolver
            .global_with_fallback(self.root.trust_all, keys::TLS_TRUST_ALL)?
            .unwrap_or(false);
        if trust_all {
            // A configured verifier is installed below instead
            if verifier_name.is_none() {
                builder
                    .hostname_verifier(self.registry.hostname_verifier(NOOP_HOSTNAME_VERIFIER)?);
            }
            builder.trust_all();
        }

        if let Some(path) = resolver.with_fallback(|c| c.trust_store.clone(), keys::TRUST_STORE)? {
            let password = resolver
                .with_fallback(|c| c.trust_store_password.clone(), keys::TRUST_STORE_PASSWORD)?;
            let store_type = self.store_type(
                resolver.with_fallback(|c| c.trust_store_type.clone(), keys::TRUST_STORE_TYPE)?,
                keys::TRUST_STORE_TYPE,
            )?;
            let store = load_store(
                StoreKind::TrustStore,
                &path,
                password.as_deref(),
                store_type,
                &self.registry,
                &self.root.resource_dirs,
            )?;
            builder.trust_store(store);
        }

        if let Some(path) = resolver.with_fallback(|c| c.key_store.clone(), keys::KEY_STORE)? {
            let password = resolver
                .with_fallback(|c| c.key_store_password.clone(), keys::KEY_STORE_PASSWORD)?
                .ok_or(RestClientError::MissingStorePassword(StoreKind::KeyStore))?;
            let store_type = self.store_type(
                resolver.with_fallback(|c| c.key_store_type.clone(), keys::KEY_STORE_TYPE)?,
                keys::KEY_STORE_TYPE,
            )?;
            let store = load_store(
                StoreKind::KeyStore,
                &path,
                Some(&password),
                store_type,
                &self.registry,
                &self.root.resource_dirs,
            )?;
            builder.key_store(store, password);
        }

        if let Some(name) = verifier_name {
            builder.hostname_verifier(self.registry.hostname_verifier(name.trim())?);
        }
        Ok(())
    }

    fn store_type(&self, raw: Option<String>, key: &str) -> RestClientResult<Option<StoreType>> {
        raw.map(|value| {
            value.parse().map_err(|reason| RestClientError::InvalidValue {
                key: key.to_string(),
                value,
                reason,
            })
        })
        .transpose()
    }

    fn configure_redirects<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();
        if let Some(follow) =
            resolver.with_fallback(|c| c.follow_redirects, keys::FOLLOW_REDIRECTS)?
        {
            builder.follow_redirects(follow);
        }

        let max = resolver.global_with_fallback(
            resolver.client_only(|c| c.max_redirects),
            keys::MAX_REDIRECTS,
        )?;
        if let Some(max) = max {
            builder.property(ClientProperty::MaxRedirects(max));
        }
        Ok(())
    }

    fn configure_query_param_style<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();
        if let Some(style) =
            resolver.with_fallback(|c| c.query_param_style, keys::QUERY_PARAM_STYLE)?
        {
            builder.query_param_style(style);
        }
        Ok(())
    }

    fn configure_proxy<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();
        if let Some(address) =
            resolver.with_fallback(|c| c.proxy_address.clone(), keys::PROXY_ADDRESS)?
        {
            let proxy = ProxyAddress::parse(address.trim())?;
            tracing::debug!(prefix = %self.prefix, proxy = %proxy, "Proxy configured");
            builder.proxy_address(&proxy.host, proxy.port);
        }
        Ok(())
    }

    fn configure_custom_properties<B: ClientBuilder>(&self, builder: &mut B) -> RestClientResult<()> {
        let resolver = self.resolver();

        if let Some(mode) = resolver.global_with_fallback(
            self.root.multipart_post_encoder_mode,
            keys::MULTIPART_POST_ENCODER_MODE,
        )? {
            builder.property(ClientProperty::MultipartEncoderMode(mode));
        }
        if let Some(size) = resolver.client_only(|c| c.connection_pool_size) {
            builder.property(ClientProperty::ConnectionPoolSize(size));
        }
        if let Some(ttl) = resolver.client_only(|c| c.connection_ttl) {
            builder.property(ClientProperty::ConnectionTtl(Duration::from_millis(u64::from(ttl))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::recorder::SettingsRecorder;
    use crate::config::{ClientConfig, MapSource, MultipartEncoderMode, QueryParamStyle};
    use crate::net::hostname::HostnameVerifier;
    use rustls::pki_types::CertificateDer;

    fn context(root: ConfigRoot, props: MapSource) -> RestClientContext {
        RestClientContext::new(root, DynamicProperties::new().with_source(props), Registry::new())
    }

    fn root_with(prefix: &str, config: ClientConfig) -> ConfigRoot {
        let mut root = ConfigRoot::default();
        root.clients.insert(prefix.to_string(), config);
        root
    }

    #[test]
    fn test_uri_beats_url_beats_declared() {
        let ctx = context(
            ConfigRoot::default(),
            MapSource::new("test")
                .with("echo/mp-rest/url", "http://url.example")
                .with("echo/mp-rest/uri", "http://uri.example"),
        );
        let settings = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .with_base_uri(Some("http://declared.example"))
            .build(SettingsRecorder::new())
            .unwrap();
        assert_eq!(settings.base_url.as_deref(), Some("http://uri.example/"));

        let ctx = context(ConfigRoot::default(), MapSource::new("empty"));
        let settings = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .with_base_uri(Some("http://declared.example"))
            .build(SettingsRecorder::new())
            .unwrap();
        assert_eq!(settings.base_url.as_deref(), Some("http://declared.example/"));
    }

    #[test]
    fn test_missing_base_url_names_both_keys() {
        let ctx = context(ConfigRoot::default(), MapSource::new("empty"));
        let err = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .with_base_uri(Some(""))
            .build(SettingsRecorder::new())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("rest-client.clients.\"echo\".url"));
        assert!(msg.contains("rest-client.clients.\"echo\".uri"));
    }

    #[test]
    fn test_invalid_base_url_echoes_value() {
        let ctx = context(
            root_with("echo", ClientConfig { url: Some("not a url".into()), ..Default::default() }),
            MapSource::new("empty"),
        );
        let err = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .build(SettingsRecorder::new())
            .unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_prefix_defaults_to_interface_name() {
        let ctx = context(
            ConfigRoot::default(),
            MapSource::new("test").with("app::Echo/mp-rest/url", "http://localhost"),
        );
        let base = RestClientBase::new(&ctx, "app::Echo", None);
        assert_eq!(base.prefix(), "app::Echo");
        assert!(base.build(SettingsRecorder::new()).is_ok());
    }

    #[test]
    fn test_unknown_provider_is_fatal() {
        let ctx = context(
            root_with(
                "echo",
                ClientConfig {
                    url: Some("http://localhost".into()),
                    providers: Some("app::Missing".into()),
                    ..Default::default()
                },
            ),
            MapSource::new("empty"),
        );
        let err = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .build(SettingsRecorder::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not find provider: app::Missing");
    }

    #[test]
    fn test_redirects_and_custom_properties() {
        let mut root = root_with(
            "echo",
            ClientConfig {
                url: Some("http://localhost".into()),
                follow_redirects: Some(true),
                connection_pool_size: Some(4),
                connection_ttl: Some(250),
                query_param_style: Some(QueryParamStyle::CommaSeparated),
                ..Default::default()
            },
        );
        root.multipart_post_encoder_mode = Some(MultipartEncoderMode::Rfc3986);
        let ctx = context(root, MapSource::new("test").with("rest-client.max-redirects", "5"));

        let settings = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .build(SettingsRecorder::new())
            .unwrap();
        assert_eq!(settings.follow_redirects, Some(true));
        assert_eq!(settings.query_param_style, Some(QueryParamStyle::CommaSeparated));
        assert_eq!(settings.property("max-redirects"), Some(&ClientProperty::MaxRedirects(5)));
        assert_eq!(
            settings.property("connection-pool-size"),
            Some(&ClientProperty::ConnectionPoolSize(4))
        );
        assert_eq!(
            settings.property("connection-ttl"),
            Some(&ClientProperty::ConnectionTtl(Duration::from_millis(250)))
        );
        assert_eq!(
            settings.property("multipart-post-encoder-mode"),
            Some(&ClientProperty::MultipartEncoderMode(MultipartEncoderMode::Rfc3986))
        );
    }

    #[test]
    fn test_trust_all_registers_noop_verifier() {
        let mut root = root_with(
            "echo",
            ClientConfig { url: Some("http://localhost".into()), ..Default::default() },
        );
        root.trust_all = Some(true);
        let ctx = context(root, MapSource::new("empty"));

        let settings = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .build(SettingsRecorder::new())
            .unwrap();
        assert!(settings.trust_all);
        assert_eq!(settings.hostname_verifier.as_deref(), Some("NoopHostnameVerifier"));
    }

    /// Records every hostname verifier handed to the builder.
    #[derive(Default)]
    struct VerifierLog {
        inner: SettingsRecorder,
        verifiers: Vec<String>,
    }

    impl ClientBuilder for VerifierLog {
        type Client = Vec<String>;

        fn base_url(&mut self, url: Url) {
            self.inner.base_url(url);
        }
        fn connect_timeout(&mut self, timeout: Duration) {
            self.inner.connect_timeout(timeout);
        }
        fn read_timeout(&mut self, timeout: Duration) {
            self.inner.read_timeout(timeout);
        }
        fn register(&mut self, provider: Arc<dyn ResponseFilter>) {
            self.inner.register(provider);
        }
        fn trust_store(&mut self, store: crate::keystore::KeyStore) {
            self.inner.trust_store(store);
        }
        fn key_store(&mut self, store: crate::keystore::KeyStore, password: String) {
            self.inner.key_store(store, password);
        }
        fn hostname_verifier(&mut self, verifier: Arc<dyn HostnameVerifier>) {
            self.verifiers.push(format!("{:?}", verifier));
        }
        fn trust_all(&mut self) {
            self.inner.trust_all();
        }
        fn proxy_address(&mut self, host: &str, port: u16) {
            self.inner.proxy_address(host, port);
        }
        fn follow_redirects(&mut self, follow: bool) {
            self.inner.follow_redirects(follow);
        }
        fn query_param_style(&mut self, style: QueryParamStyle) {
            self.inner.query_param_style(style);
        }
        fn property(&mut self, property: ClientProperty) {
            self.inner.property(property);
        }
        fn build(self) -> RestClientResult<Vec<String>> {
            Ok(self.verifiers)
        }
    }

    #[derive(Debug)]
    struct InternalHosts;

    impl HostnameVerifier for InternalHosts {
        fn verify(&self, hostname: &str, _certificate: &CertificateDer<'_>) -> bool {
            hostname.ends_with(".internal")
        }
    }

    fn internal_hosts() -> Result<Arc<dyn HostnameVerifier>, String> {
        Ok(Arc::new(InternalHosts))
    }

    #[test]
    fn test_configured_verifier_replaces_trust_all_noop() {
        let mut root = root_with(
            "echo",
            ClientConfig {
                url: Some("http://localhost".into()),
                hostname_verifier: Some("app::InternalHosts".into()),
                ..Default::default()
            },
        );
        root.trust_all = Some(true);
        let ctx = RestClientContext::new(
            root,
            DynamicProperties::new(),
            Registry::new().with_hostname_verifier("app::InternalHosts", internal_hosts),
        );

        let verifiers = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .build(VerifierLog::default())
            .unwrap();
        assert_eq!(verifiers, vec!["InternalHosts".to_string()]);
    }

    #[test]
    fn test_key_store_without_password_fails_first() {
        let ctx = context(
            root_with(
                "echo",
                ClientConfig {
                    url: Some("http://localhost".into()),
                    key_store: Some("classpath:missing.jks".into()),
                    ..Default::default()
                },
            ),
            MapSource::new("empty"),
        );
        let err = RestClientBase::new(&ctx, "app::Echo", Some("echo"))
            .build(SettingsRecorder::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "No password provided for keystore");
    }

    #[test]
    fn test_scope_resolution() {
        let ctx = context(
            ConfigRoot::default(),
            MapSource::new("test")
                .with("echo/mp-rest/scope", "javax.inject.Singleton")
                .with("bad/mp-rest/scope", "Session"),
        );
        let scope = RestClientBase::new(&ctx, "app::Echo", Some("echo")).resolve_scope();
        assert_eq!(scope.unwrap(), ClientScope::Singleton);

        let scope = RestClientBase::new(&ctx, "app::Other", Some("other")).resolve_scope();
        assert_eq!(scope.unwrap(), ClientScope::ApplicationScoped);

        assert!(RestClientBase::new(&ctx, "app::Bad", Some("bad")).resolve_scope().is_err());
    }
}
