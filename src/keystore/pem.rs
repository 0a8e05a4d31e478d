//! PEM stores.
//!
//! Certificates without a key become trusted entries. When the file also
//! holds a private key, the key and all certificates form one key entry.

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::Item;

use crate::keystore::{ProtectedKey, StoreEntry};

pub fn parse(bytes: &[u8]) -> Result<Vec<StoreEntry>, String> {
    let mut reader = bytes;
    let mut certificates: Vec<CertificateDer<'static>> = Vec::new();
    let mut key: Option<PrivateKeyDer<'static>> = None;

    for item in rustls_pemfile::read_all(&mut reader) {
        let item = item.map_err(|e| format!("invalid PEM: {}", e))?;
        let found = match item {
            Item::X509Certificate(cert) => {
                certificates.push(cert);
                continue;
            }
            Item::Pkcs1Key(k) => PrivateKeyDer::Pkcs1(k),
            Item::Pkcs8Key(k) => PrivateKeyDer::Pkcs8(k),
            Item::Sec1Key(k) => PrivateKeyDer::Sec1(k),
            _ => continue,
        };
        if key.replace(found).is_some() {
            return Err("more than one private key".to_string());
        }
    }

    if certificates.is_empty() && key.is_none() {
        return Err("no certificates or keys found".to_string());
    }

    let entries = match key {
        Some(key) => vec![StoreEntry::PrivateKey {
            alias: "0".to_string(),
            key: ProtectedKey::Plain(key),
            chain: certificates,
        }],
        None => certificates
            .into_iter()
            .enumerate()
            .map(|(i, certificate)| StoreEntry::TrustedCertificate {
                alias: i.to_string(),
                certificate,
            })
            .collect(),
    };
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pem_rejected() {
        let err = parse(b"not pem at all").unwrap_err();
        assert!(err.contains("no certificates"));
    }
}
