//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use der::asn1::{ObjectIdentifier, OctetStringRef};
use der::{Encode, Sequence};
use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use rest_client_config::keystore::jks::{
    apply_keystream, integrity_digest, password_bytes, KEY_PROTECTOR_OID,
};

/// Start a mock backend answering every request with `status` and a body
/// produced from the request target (`/path?query`).
pub async fn start_mock_backend<F>(status: &'static str, body: F) -> SocketAddr
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = Arc::new(body);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let body = body.clone();
                    tokio::spawn(async move {
                        let target = read_request_target(&mut socket).await;
                        let payload = body(&target);
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            payload.len(),
                            payload
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Backend whose body is the request target.
pub async fn start_echo_backend() -> SocketAddr {
    start_mock_backend("200 OK", |target| target.to_string()).await
}

/// HTTPS backend presenting `identity`; the body is the request target.
pub async fn start_tls_echo_backend(identity: &TestIdentity) -> SocketAddr {
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(
        vec![CertificateDer::from(identity.certificate.clone())],
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(identity.private_key.clone())),
    )
    .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let acceptor = acceptor.clone();
                    tokio::spawn(async move {
                        // Rejected handshakes end here
                        let Ok(mut stream) = acceptor.accept(socket).await else {
                            return;
                        };
                        let target = read_request_target(&mut stream).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            target.len(),
                            target
                        );
                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_target<S: AsyncRead + Unpin>(socket: &mut S) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    // Drain the body so closing the socket does not reset the connection
    while buf.len() < head_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string()
}

/// Self-signed certificate for `localhost` and its PKCS#8 key.
pub struct TestIdentity {
    pub certificate: Vec<u8>,
    pub certificate_pem: String,
    pub private_key: Vec<u8>,
}

pub fn generate_identity() -> TestIdentity {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let cert = rcgen::CertificateParams::new(vec!["localhost".into()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();
    TestIdentity {
        certificate: cert.der().to_vec(),
        certificate_pem: cert.pem(),
        private_key: key_pair.serialize_der(),
    }
}

pub enum JksEntry<'a> {
    Trusted {
        alias: &'a str,
        certificate: &'a [u8],
    },
    PrivateKey {
        alias: &'a str,
        identity: &'a TestIdentity,
    },
}

#[derive(Sequence)]
struct AlgorithmIdentifier {
    oid: ObjectIdentifier,
}

#[derive(Sequence)]
struct EncryptedPrivateKeyInfo<'a> {
    algorithm: AlgorithmIdentifier,
    encrypted_data: OctetStringRef<'a>,
}

/// Serialize a version 2 JKS store.
pub fn write_jks(password: &str, entries: &[JksEntry<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0xFEED_FEEDu32.to_be_bytes());
    body.extend_from_slice(&2u32.to_be_bytes());
    body.extend_from_slice(&(entries.len() as u32).to_be_bytes());

    for entry in entries {
        match entry {
            JksEntry::Trusted { alias, certificate } => {
                body.extend_from_slice(&2u32.to_be_bytes());
                write_utf(&mut body, alias);
                body.extend_from_slice(&0u64.to_be_bytes());
                write_cert(&mut body, certificate);
            }
            JksEntry::PrivateKey { alias, identity } => {
                body.extend_from_slice(&1u32.to_be_bytes());
                write_utf(&mut body, alias);
                body.extend_from_slice(&0u64.to_be_bytes());
                let envelope = protect_key(password, &identity.private_key);
                body.extend_from_slice(&(envelope.len() as u32).to_be_bytes());
                body.extend_from_slice(&envelope);
                body.extend_from_slice(&1u32.to_be_bytes());
                write_cert(&mut body, &identity.certificate);
            }
        }
    }

    let digest = integrity_digest(password, &body);
    body.extend_from_slice(&digest);
    body
}

fn protect_key(password: &str, key: &[u8]) -> Vec<u8> {
    let password = password_bytes(password);
    let salt = [0x5Au8; 20];

    let mut ctx = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    ctx.update(&password);
    ctx.update(key);
    let check = ctx.finish();

    let mut protected = salt.to_vec();
    protected.extend_from_slice(&apply_keystream(&password, &salt, key));
    protected.extend_from_slice(check.as_ref());

    EncryptedPrivateKeyInfo {
        algorithm: AlgorithmIdentifier {
            oid: KEY_PROTECTOR_OID,
        },
        encrypted_data: OctetStringRef::new(&protected).unwrap(),
    }
    .to_der()
    .unwrap()
}

fn write_utf(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn write_cert(out: &mut Vec<u8>, der: &[u8]) {
    write_utf(out, "X.509");
    out.extend_from_slice(&(der.len() as u32).to_be_bytes());
    out.extend_from_slice(der);
}
