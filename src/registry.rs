//! Named component registry.
//!
//! Providers, hostname verifiers and bundled resources are referenced from
//! configuration by string identifiers. The embedding application makes them
//! available either at link time:
//!
//! ```rust,ignore
//! use rest_client_config::registry::ProviderRegistration;
//!
//! inventory::submit! {
//!     ProviderRegistration::new("app::AuditFilter", || std::sync::Arc::new(AuditFilter))
//! }
//! ```
//!
//! or at runtime through the `with_*` builders. `Registry::discover` merges
//! every link-time registration into a fresh registry.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::filter::ResponseFilter;
use crate::error::{RestClientError, RestClientResult};
use crate::net::hostname::{HostnameVerifier, NoopHostnameVerifier, NOOP_HOSTNAME_VERIFIER};

/// Creates a provider instance.
pub type ProviderFactory = fn() -> Arc<dyn ResponseFilter>;

/// Creates a hostname verifier; `Err` describes why it could not be built.
pub type HostnameVerifierFactory = fn() -> Result<Arc<dyn HostnameVerifier>, String>;

/// Link-time provider registration.
pub struct ProviderRegistration {
    pub name: &'static str,
    pub factory: ProviderFactory,
}

impl ProviderRegistration {
    pub const fn new(name: &'static str, factory: ProviderFactory) -> Self {
        Self { name, factory }
    }
}

/// Link-time hostname verifier registration.
pub struct HostnameVerifierRegistration {
    pub name: &'static str,
    pub factory: HostnameVerifierFactory,
}

impl HostnameVerifierRegistration {
    pub const fn new(name: &'static str, factory: HostnameVerifierFactory) -> Self {
        Self { name, factory }
    }
}

/// Link-time bundled resource, addressed by `classpath:<path>`.
pub struct EmbeddedResource {
    pub path: &'static str,
    pub bytes: &'static [u8],
}

impl EmbeddedResource {
    pub const fn new(path: &'static str, bytes: &'static [u8]) -> Self {
        Self { path, bytes }
    }
}

inventory::collect!(ProviderRegistration);
inventory::collect!(HostnameVerifierRegistration);
inventory::collect!(EmbeddedResource);

inventory::submit! {
    HostnameVerifierRegistration::new(NOOP_HOSTNAME_VERIFIER, noop_verifier)
}

fn noop_verifier() -> Result<Arc<dyn HostnameVerifier>, String> {
    Ok(Arc::new(NoopHostnameVerifier))
}

/// Lookup table from identifiers to factories and resources.
#[derive(Clone)]
pub struct Registry {
    providers: HashMap<String, ProviderFactory>,
    verifiers: HashMap<String, HostnameVerifierFactory>,
    resources: HashMap<String, Cow<'static, [u8]>>,
}

impl Registry {
    /// Registry holding only the built-in no-op hostname verifier.
    pub fn new() -> Self {
        let mut verifiers: HashMap<String, HostnameVerifierFactory> = HashMap::new();
        verifiers.insert(NOOP_HOSTNAME_VERIFIER.to_string(), noop_verifier);
        Self {
            providers: HashMap::new(),
            verifiers,
            resources: HashMap::new(),
        }
    }

    /// Registry holding every link-time registration.
    pub fn discover() -> Self {
        let mut registry = Self::new();
        for reg in inventory::iter::<ProviderRegistration>() {
            registry.providers.insert(reg.name.to_string(), reg.factory);
        }
        for reg in inventory::iter::<HostnameVerifierRegistration>() {
            registry.verifiers.insert(reg.name.to_string(), reg.factory);
        }
        for res in inventory::iter::<EmbeddedResource>() {
            registry
                .resources
                .insert(res.path.trim_start_matches('/').to_string(), Cow::Borrowed(res.bytes));
        }

        tracing::debug!(
            providers = registry.providers.len(),
            hostname_verifiers = registry.verifiers.len(),
            resources = registry.resources.len(),
            "Registry discovered"
        );
        registry
    }

    pub fn with_provider(mut self, name: impl Into<String>, factory: ProviderFactory) -> Self {
        self.providers.insert(name.into(), factory);
        self
    }

    pub fn with_hostname_verifier(
        mut self,
        name: impl Into<String>,
        factory: HostnameVerifierFactory,
    ) -> Self {
        self.verifiers.insert(name.into(), factory);
        self
    }

    pub fn with_resource(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let path: String = path.into();
        self.resources
            .insert(path.trim_start_matches('/').to_string(), Cow::Owned(bytes));
        self
    }

    /// Instantiate the provider registered as `name`.
    pub fn provider(&self, name: &str) -> RestClientResult<Arc<dyn ResponseFilter>> {
        self.providers
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| RestClientError::ProviderNotFound(name.to_string()))
    }

    /// Instantiate the hostname verifier registered as `name`.
    pub fn hostname_verifier(&self, name: &str) -> RestClientResult<Arc<dyn HostnameVerifier>> {
        match self.verifiers.get(name) {
            Some(factory) => {
                factory().map_err(|reason| RestClientError::HostnameVerifierInstantiation {
                    name: name.to_string(),
                    reason,
                })
            }
            None if self.providers.contains_key(name) => {
                Err(RestClientError::NotAHostnameVerifier(name.to_string()))
            }
            None => Err(RestClientError::HostnameVerifierNotFound(name.to_string())),
        }
    }

    /// Bundled resource bytes.
    pub fn resource(&self, path: &str) -> Option<&[u8]> {
        self.resources.get(path).map(|bytes| bytes.as_ref())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.providers.keys().collect();
        providers.sort();
        let mut verifiers: Vec<_> = self.verifiers.keys().collect();
        verifiers.sort();
        f.debug_struct("Registry")
            .field("providers", &providers)
            .field("hostname_verifiers", &verifiers)
            .field("resources", &self.resources.len())
            .finish()
    }
}
