//! Client-side rustls configuration from loaded stores.
//!
//! # Design Decisions
//! - The ring provider is used explicitly; no process-wide default is installed
//! - A trust store replaces the WebPKI roots instead of extending them
//! - Hostname verifiers only see certificates whose chain already validated

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::{RestClientError, RestClientResult};
use crate::keystore::KeyStore;
use crate::net::hostname::HostnameVerifier;

/// TLS inputs gathered by the client builder.
#[derive(Debug, Default)]
pub struct TlsSettings {
    pub trust_store: Option<KeyStore>,
    pub key_store: Option<(KeyStore, String)>,
    pub hostname_verifier: Option<Arc<dyn HostnameVerifier>>,
    pub trust_all: bool,
}

impl TlsSettings {
    /// Whether anything departs from the transport's default TLS setup.
    pub fn is_customized(&self) -> bool {
        self.trust_store.is_some()
            || self.key_store.is_some()
            || self.hostname_verifier.is_some()
            || self.trust_all
    }
}

/// Build a rustls client configuration.
pub fn client_config(settings: &TlsSettings) -> RestClientResult<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let verifier: Arc<dyn ServerCertVerifier> = if settings.trust_all {
        tracing::warn!("TLS certificate verification disabled (trust-all)");
        Arc::new(TrustAllVerifier {
            provider: provider.clone(),
        })
    } else {
        let roots = root_store(settings.trust_store.as_ref())?;
        let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .map_err(|e| RestClientError::Tls(format!("cannot build certificate verifier: {}", e)))?;
        Arc::new(HostnameFallbackVerifier {
            inner: webpki,
            hostname_verifier: settings.hostname_verifier.clone(),
        })
    };

    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| RestClientError::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(verifier);

    let identity = match &settings.key_store {
        Some((store, password)) => {
            let identity = store.client_identity(password)?;
            if identity.is_none() {
                tracing::warn!(
                    path = %store.source(),
                    "Key store holds no private key; continuing without client authentication"
                );
            }
            identity
        }
        None => None,
    };

    match identity {
        Some((chain, key)) => builder
            .with_client_auth_cert(chain, key)
            .map_err(|e| RestClientError::Tls(format!("invalid client certificate: {}", e))),
        None => Ok(builder.with_no_client_auth()),
    }
}

fn root_store(trust_store: Option<&KeyStore>) -> RestClientResult<RootCertStore> {
    let Some(store) = trust_store else {
        return Ok(webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect());
    };

    let mut roots = RootCertStore::empty();
    for cert in store.trusted_certificates() {
        roots.add(cert).map_err(|e| {
            RestClientError::Tls(format!("invalid trust anchor in {}: {}", store.source(), e))
        })?;
    }
    tracing::debug!(path = %store.source(), anchors = roots.len(), "Trust anchors loaded");
    Ok(roots)
}

/// WebPKI verification, with a second opinion on hostname mismatches.
#[derive(Debug)]
struct HostnameFallbackVerifier {
    inner: Arc<WebPkiServerVerifier>,
    hostname_verifier: Option<Arc<dyn HostnameVerifier>>,
}

impl ServerCertVerifier for HostnameFallbackVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let result = self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now);

        match (result, &self.hostname_verifier) {
            (
                Err(rustls::Error::InvalidCertificate(
                    CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. },
                )),
                Some(verifier),
            ) => {
                let hostname = server_name.to_str();
                if verifier.verify(&hostname, end_entity) {
                    tracing::debug!(hostname = %hostname, "Hostname accepted by custom verifier");
                    Ok(ServerCertVerified::assertion())
                } else {
                    Err(rustls::Error::InvalidCertificate(CertificateError::NotValidForName))
                }
            }
            (result, _) => result,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Accepts any certificate chain. Handshake signatures are still checked.
#[derive(Debug)]
struct TrustAllVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for TrustAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{StoreEntry, StoreType};

    #[test]
    fn test_default_settings_are_not_customized() {
        assert!(!TlsSettings::default().is_customized());
        let settings = TlsSettings {
            trust_all: true,
            ..Default::default()
        };
        assert!(settings.is_customized());
    }

    #[test]
    fn test_trust_all_config_builds() {
        let settings = TlsSettings {
            trust_all: true,
            ..Default::default()
        };
        assert!(client_config(&settings).is_ok());
    }

    #[test]
    fn test_webpki_roots_used_without_trust_store() {
        let config = client_config(&TlsSettings {
            hostname_verifier: Some(Arc::new(crate::net::hostname::NoopHostnameVerifier)),
            ..Default::default()
        });
        assert!(config.is_ok());
    }

    #[test]
    fn test_empty_trust_store_is_rejected() {
        let settings = TlsSettings {
            trust_store: Some(KeyStore::new("classpath:empty.jks", StoreType::Jks, Vec::new())),
            ..Default::default()
        };
        let err = client_config(&settings).unwrap_err();
        assert!(matches!(err, RestClientError::Tls(_)));
    }

    #[test]
    fn test_key_store_without_private_key_is_tolerated() {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let cert = rcgen::CertificateParams::new(vec!["localhost".into()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();
        let store = KeyStore::new(
            "file:trust-only.jks",
            StoreType::Jks,
            vec![StoreEntry::TrustedCertificate {
                alias: "ca".into(),
                certificate: cert.der().clone(),
            }],
        );
        let settings = TlsSettings {
            trust_store: Some(store.clone()),
            key_store: Some((store, "changeit".into())),
            ..Default::default()
        };
        assert!(client_config(&settings).is_ok());
    }
}
