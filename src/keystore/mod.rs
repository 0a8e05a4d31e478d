//! TLS key and trust material.
//!
//! # Data Flow
//! ```text
//! "classpath:certs/ts.jks" | "file:/etc/ts.jks" | "/etc/ts.jks"
//!     → locate.rs (registry resources, resource dirs, filesystem)
//!     → jks.rs / pem.rs (parse, integrity check)
//!     → KeyStore (entries) handed to the client builder
//! ```
//!
//! # Design Decisions
//! - Store type defaults to JKS
//! - A password is required before any I/O happens
//! - JKS private keys stay protected until the transport recovers them

pub mod jks;
pub mod locate;
pub mod pem;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::str::FromStr;

use crate::error::{RestClientError, RestClientResult, StoreKind};
use crate::registry::Registry;

pub use locate::StoreLocation;

/// Store type used when none is configured.
pub const DEFAULT_STORE_TYPE: StoreType = StoreType::Jks;

/// Supported store formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Jks,
    Pem,
    Pkcs12,
}

impl FromStr for StoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JKS" => Ok(StoreType::Jks),
            "PEM" => Ok(StoreType::Pem),
            "PKCS12" | "P12" => Ok(StoreType::Pkcs12),
            _ => Err(format!("unknown store type '{}'", s)),
        }
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Jks => write!(f, "JKS"),
            StoreType::Pem => write!(f, "PEM"),
            StoreType::Pkcs12 => write!(f, "PKCS12"),
        }
    }
}

/// A private key as stored.
#[derive(Debug)]
pub enum ProtectedKey {
    /// Unencrypted key (PEM stores).
    Plain(PrivateKeyDer<'static>),
    /// JKS key-protector envelope (DER `EncryptedPrivateKeyInfo`).
    Jks(Vec<u8>),
}

impl Clone for ProtectedKey {
    fn clone(&self) -> Self {
        match self {
            ProtectedKey::Plain(key) => ProtectedKey::Plain(key.clone_key()),
            ProtectedKey::Jks(envelope) => ProtectedKey::Jks(envelope.clone()),
        }
    }
}

impl ProtectedKey {
    /// Recover the key, decrypting with `password` if needed.
    pub fn recover(&self, password: &str) -> Result<PrivateKeyDer<'static>, String> {
        match self {
            ProtectedKey::Plain(key) => Ok(key.clone_key()),
            ProtectedKey::Jks(envelope) => jks::recover_key(envelope, password),
        }
    }
}

/// One store entry.
#[derive(Debug, Clone)]
pub enum StoreEntry {
    TrustedCertificate {
        alias: String,
        certificate: CertificateDer<'static>,
    },
    PrivateKey {
        alias: String,
        key: ProtectedKey,
        chain: Vec<CertificateDer<'static>>,
    },
}

impl StoreEntry {
    pub fn alias(&self) -> &str {
        match self {
            StoreEntry::TrustedCertificate { alias, .. } | StoreEntry::PrivateKey { alias, .. } => {
                alias
            }
        }
    }
}

/// A loaded key or trust store.
#[derive(Debug, Clone)]
pub struct KeyStore {
    source: String,
    store_type: StoreType,
    entries: Vec<StoreEntry>,
}

impl KeyStore {
    pub fn new(source: impl Into<String>, store_type: StoreType, entries: Vec<StoreEntry>) -> Self {
        Self {
            source: source.into(),
            store_type,
            entries,
        }
    }

    /// The configured location this store was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    pub fn entries(&self) -> &[StoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Certificates usable as trust anchors: trusted entries plus the leaf of
    /// every key entry's chain.
    pub fn trusted_certificates(&self) -> Vec<CertificateDer<'static>> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                StoreEntry::TrustedCertificate { certificate, .. } => Some(certificate.clone()),
                StoreEntry::PrivateKey { chain, .. } => chain.first().cloned(),
            })
            .collect()
    }

    /// First private key entry, recovered with `password`, and its chain.
    pub fn client_identity(
        &self,
        password: &str,
    ) -> RestClientResult<Option<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)>> {
        let Some((alias, key, chain)) = self.entries.iter().find_map(|entry| match entry {
            StoreEntry::PrivateKey { alias, key, chain } => Some((alias, key, chain)),
            StoreEntry::TrustedCertificate { .. } => None,
        }) else {
            return Ok(None);
        };

        let key = key.recover(password).map_err(|reason| RestClientError::StoreLoad {
            kind: StoreKind::KeyStore,
            path: self.source.clone(),
            reason: format!("cannot recover key '{}': {}", alias, reason),
        })?;
        Ok(Some((chain.clone(), key)))
    }
}

/// Locate, open and parse a store.
///
/// The password is checked first; a store cannot be opened without one.
pub fn load_store(
    kind: StoreKind,
    path: &str,
    password: Option<&str>,
    store_type: Option<StoreType>,
    registry: &Registry,
    resource_dirs: &[std::path::PathBuf],
) -> RestClientResult<KeyStore> {
    let store_type = store_type.unwrap_or(DEFAULT_STORE_TYPE);
    let password = password.ok_or(RestClientError::MissingStorePassword(kind))?;

    let location = StoreLocation::parse(path);
    let bytes = location.read(registry, resource_dirs)?;

    let load_error = |reason: String| RestClientError::StoreLoad {
        kind,
        path: path.to_string(),
        reason,
    };

    let entries = match store_type {
        StoreType::Jks => jks::parse(&bytes, password).map_err(load_error)?,
        StoreType::Pem => pem::parse(&bytes).map_err(load_error)?,
        StoreType::Pkcs12 => {
            return Err(RestClientError::UnsupportedStoreType {
                kind,
                store_type: store_type.to_string(),
            })
        }
    };

    tracing::debug!(
        %kind,
        path,
        store_type = %store_type,
        entries = entries.len(),
        "Store loaded"
    );

    Ok(KeyStore::new(path, store_type, entries))
}
