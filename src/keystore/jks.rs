//! Java KeyStore (JKS) parsing.
//!
//! Layout (big-endian):
//! ```text
//! magic u32 = 0xFEEDFEED | version u32 (1, 2) | count u32
//! entry*:  tag u32 | alias utf | timestamp u64
//!     tag 1 (private key): len u32 | protected key | chain count u32 | cert*
//!     tag 2 (trusted cert): cert
//! cert:    [type utf, v2 only] | len u32 | DER
//! digest:  SHA-1(password as UTF-16BE ‖ "Mighty Aphrodite" ‖ everything above)
//! ```

use der::asn1::{AnyRef, ObjectIdentifier, OctetStringRef};
use der::{Decode, Sequence};
use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

use crate::keystore::{ProtectedKey, StoreEntry};

const MAGIC: u32 = 0xFEED_FEED;
const JCEKS_MAGIC: u32 = 0xCECE_CECE;
const TAG_PRIVATE_KEY: u32 = 1;
const TAG_TRUSTED_CERT: u32 = 2;
const WHITENER: &[u8] = b"Mighty Aphrodite";
const DIGEST_LEN: usize = 20;
const X509: &str = "X.509";

/// Algorithm of the proprietary JKS key protector.
pub const KEY_PROTECTOR_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.42.2.17.1.1");

#[derive(Sequence)]
struct AlgorithmIdentifier<'a> {
    oid: ObjectIdentifier,
    parameters: Option<AnyRef<'a>>,
}

#[derive(Sequence)]
struct EncryptedPrivateKeyInfo<'a> {
    algorithm: AlgorithmIdentifier<'a>,
    encrypted_data: OctetStringRef<'a>,
}

/// Parse a JKS store, verifying its integrity digest with `password`.
pub fn parse(bytes: &[u8], password: &str) -> Result<Vec<StoreEntry>, String> {
    if bytes.len() < 12 + DIGEST_LEN {
        return Err("store is truncated".to_string());
    }
    let (body, digest) = bytes.split_at(bytes.len() - DIGEST_LEN);

    let mut reader = Reader::new(body);
    match reader.u32()? {
        MAGIC => {}
        JCEKS_MAGIC => return Err("JCEKS stores are not supported".to_string()),
        other => return Err(format!("not a JKS store (magic {:#010x})", other)),
    }
    let version = reader.u32()?;
    if version != 1 && version != 2 {
        return Err(format!("unsupported JKS version {}", version));
    }

    if integrity_digest(password, body) != digest {
        return Err("keystore was tampered with, or password was incorrect".to_string());
    }

    let count = reader.u32()?;
    let mut entries = Vec::new();
    for _ in 0..count {
        let tag = reader.u32()?;
        let alias = reader.utf()?;
        let _timestamp = reader.u64()?;

        let entry = match tag {
            TAG_PRIVATE_KEY => {
                let key_len = reader.u32()? as usize;
                let key = reader.bytes(key_len)?.to_vec();
                let chain_len = reader.u32()?;
                let mut chain = Vec::new();
                for _ in 0..chain_len {
                    chain.push(reader.certificate(version)?);
                }
                StoreEntry::PrivateKey {
                    alias,
                    key: ProtectedKey::Jks(key),
                    chain,
                }
            }
            TAG_TRUSTED_CERT => StoreEntry::TrustedCertificate {
                certificate: reader.certificate(version)?,
                alias,
            },
            other => return Err(format!("unknown entry tag {} for alias '{}'", other, alias)),
        };
        entries.push(entry);
    }

    if !reader.is_empty() {
        return Err("trailing data after last entry".to_string());
    }

    Ok(entries)
}

/// Decrypt a key protected with the JKS key protector.
pub fn recover_key(envelope: &[u8], password: &str) -> Result<PrivateKeyDer<'static>, String> {
    let info = EncryptedPrivateKeyInfo::from_der(envelope)
        .map_err(|e| format!("malformed protected key: {}", e))?;
    if info.algorithm.oid != KEY_PROTECTOR_OID {
        return Err(format!("unsupported key protection algorithm {}", info.algorithm.oid));
    }

    let data = info.encrypted_data.as_bytes();
    if data.len() < 2 * DIGEST_LEN {
        return Err("protected key is truncated".to_string());
    }
    let (salt, rest) = data.split_at(DIGEST_LEN);
    let (encrypted, check) = rest.split_at(rest.len() - DIGEST_LEN);

    let password = password_bytes(password);
    let plaintext = apply_keystream(&password, salt, encrypted);

    let mut ctx = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    ctx.update(&password);
    ctx.update(&plaintext);
    if ctx.finish().as_ref() != check {
        return Err("password is incorrect or key is corrupted".to_string());
    }

    Ok(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(plaintext)))
}

/// XOR `input` with the SHA-1 keystream seeded by `salt`. Symmetric.
pub fn apply_keystream(password: &[u8], salt: &[u8], input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let mut block = salt.to_vec();
    for chunk in input.chunks(DIGEST_LEN) {
        let mut ctx = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
        ctx.update(password);
        ctx.update(&block);
        block = ctx.finish().as_ref().to_vec();
        output.extend(chunk.iter().zip(&block).map(|(b, k)| b ^ k));
    }
    output
}

/// Keyed digest protecting the store body.
pub fn integrity_digest(password: &str, body: &[u8]) -> Vec<u8> {
    let mut ctx = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    ctx.update(&password_bytes(password));
    ctx.update(WHITENER);
    ctx.update(body);
    ctx.finish().as_ref().to_vec()
}

/// Password characters as UTF-16BE bytes.
pub fn password_bytes(password: &str) -> Vec<u8> {
    password.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| "store is truncated".to_string())?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, String> {
        let b = self.bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_be_bytes(buf))
    }

    fn utf(&mut self) -> Result<String, String> {
        let len = self.u16()? as usize;
        Ok(String::from_utf8_lossy(self.bytes(len)?).into_owned())
    }

    fn certificate(&mut self, version: u32) -> Result<CertificateDer<'static>, String> {
        if version == 2 {
            let cert_type = self.utf()?;
            if cert_type != X509 {
                return Err(format!("unsupported certificate type '{}'", cert_type));
            }
        }
        let len = self.u32()? as usize;
        Ok(CertificateDer::from(self.bytes(len)?.to_vec()))
    }
}
