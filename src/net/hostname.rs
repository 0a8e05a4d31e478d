//! Hostname verification hooks.

use rustls::pki_types::CertificateDer;

/// Identifier of the built-in verifier that accepts every hostname.
pub const NOOP_HOSTNAME_VERIFIER: &str = concat!(module_path!(), "::NoopHostnameVerifier");

/// Decides whether a certificate is acceptable for a hostname it was not
/// issued for.
///
/// Only consulted after the certificate chain itself validated and WebPKI
/// rejected the name.
pub trait HostnameVerifier: Send + Sync + std::fmt::Debug {
    fn verify(&self, hostname: &str, certificate: &CertificateDer<'_>) -> bool;
}

/// Accepts any hostname.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHostnameVerifier;

impl HostnameVerifier for NoopHostnameVerifier {
    fn verify(&self, _hostname: &str, _certificate: &CertificateDer<'_>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_accepts_anything() {
        let cert = CertificateDer::from(vec![0u8; 4]);
        assert!(NoopHostnameVerifier.verify("anything.invalid", &cert));
        assert!(NOOP_HOSTNAME_VERIFIER.ends_with("::NoopHostnameVerifier"));
    }
}
