//! Java KeyStore (JKS) encoding
//!
//! Writes and reads Sun `JavaKeyStore` version 2 files. Private keys are
//! protected with the Sun key protector (a SHA-1 keystream XOR with a check
//! digest), and the whole store is sealed with a keyed SHA-1 digest.

use crate::credential::key::EncryptedKeyEnvelope;
use crate::utils::{CredentialError, Result};
use chrono::{DateTime, TimeZone, Utc};
use der::asn1::{AnyRef, ObjectIdentifier, OctetString};
use der::{Any, Decode, Encode};
use rand::RngCore;
use sha1::{Digest, Sha1};
use spki::AlgorithmIdentifierOwned;
use zeroize::Zeroizing;

const MAGIC: u32 = 0xFEED_FEED;
const VERSION: u32 = 2;
const PRIVATE_KEY_TAG: u32 = 1;
const TRUSTED_CERT_TAG: u32 = 2;
const CERT_TYPE: &str = "X.509";
const INTEGRITY_SALT: &[u8] = b"Mighty Aphrodite";
const SALT_LEN: usize = 20;
const DIGEST_LEN: usize = 20;

/// Sun proprietary key protection algorithm
pub const KEY_PROTECTOR_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.42.2.17.1.1");

const STORE_WHAT: &str = "keystore";
const KEY_WHAT: &str = "keystore key entry";

/// A private key entry read back from a keystore
pub struct JksKeyEntry {
    /// Alias as stored (lower case)
    pub alias: String,
    pub created: DateTime<Utc>,
    /// PKCS#8 `PrivateKeyInfo` DER
    pub key: Zeroizing<Vec<u8>>,
    /// Certificate chain DER, leaf first
    pub chain: Vec<Vec<u8>>,
}

impl std::fmt::Debug for JksKeyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JksKeyEntry")
            .field("alias", &self.alias)
            .field("created", &self.created)
            .field("key", &format_args!("<redacted {} bytes>", self.key.len()))
            .field("chain", &self.chain)
            .finish()
    }
}

/// Encode a keystore holding a single private key entry
pub fn encode_jks(alias: &str, key_der: &[u8], chain: &[&[u8]], password: &str) -> Result<Vec<u8>> {
    let password_bytes = Zeroizing::new(utf16_be(password));
    let protected = protect_key(key_der, &password_bytes)?;

    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC.to_be_bytes());
    out.extend_from_slice(&VERSION.to_be_bytes());
    out.extend_from_slice(&1u32.to_be_bytes());

    out.extend_from_slice(&PRIVATE_KEY_TAG.to_be_bytes());
    write_utf(&mut out, &alias.to_lowercase())?;
    out.extend_from_slice(&(Utc::now().timestamp_millis() as u64).to_be_bytes());
    write_bytes(&mut out, &protected)?;
    out.extend_from_slice(&(chain.len() as u32).to_be_bytes());
    for cert in chain {
        write_utf(&mut out, CERT_TYPE)?;
        write_bytes(&mut out, cert)?;
    }

    let digest = integrity_digest(&password_bytes, &out);
    out.extend_from_slice(&digest);
    Ok(out)
}

/// Decode a keystore, verifying its integrity and recovering every private key
pub fn decode_jks(data: &[u8], password: &str) -> Result<Vec<JksKeyEntry>> {
    if data.len() < DIGEST_LEN {
        return Err(parse_error("file too short"));
    }
    let password_bytes = Zeroizing::new(utf16_be(password));
    let (body, stored_digest) = data.split_at(data.len() - DIGEST_LEN);

    let mut reader = Reader::new(body);
    if reader.u32()? != MAGIC {
        return Err(parse_error("bad magic number"));
    }
    let version = reader.u32()?;
    if version != VERSION {
        return Err(parse_error(&format!("unsupported version {}", version)));
    }

    if integrity_digest(&password_bytes, body).as_slice() != stored_digest {
        return Err(CredentialError::Authentication { what: STORE_WHAT });
    }

    let count = reader.u32()?;
    let mut entries = Vec::new();
    for _ in 0..count {
        match reader.u32()? {
            PRIVATE_KEY_TAG => {
                let alias = reader.utf()?;
                let created = timestamp(reader.u64()?)?;
                let protected = reader.bytes()?;
                let key = recover_key(protected, &password_bytes)?;
                let chain_len = reader.u32()?;
                let mut chain = Vec::new();
                for _ in 0..chain_len {
                    chain.push(reader.certificate()?.to_vec());
                }
                entries.push(JksKeyEntry {
                    alias,
                    created,
                    key,
                    chain,
                });
            }
            TRUSTED_CERT_TAG => {
                let alias = reader.utf()?;
                reader.u64()?;
                reader.certificate()?;
                tracing::debug!(alias = %alias, "Skipping trusted certificate entry");
            }
            other => return Err(parse_error(&format!("unknown entry tag {}", other))),
        }
    }

    if !reader.is_empty() {
        return Err(parse_error("trailing data after entries"));
    }

    Ok(entries)
}

/// Find an entry the way JKS does, ignoring case
pub fn find_entry<'a>(entries: &'a [JksKeyEntry], alias: &str) -> Option<&'a JksKeyEntry> {
    let wanted = alias.to_lowercase();
    entries.iter().find(|entry| entry.alias == wanted)
}

fn protect_key(key_der: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let keystream = Zeroizing::new(keystream(password, &salt, key_der.len()));
    let mut protected = Vec::with_capacity(SALT_LEN + key_der.len() + DIGEST_LEN);
    protected.extend_from_slice(&salt);
    protected.extend(key_der.iter().zip(keystream.iter()).map(|(k, s)| k ^ s));
    protected.extend_from_slice(&check_digest(password, key_der));

    let envelope = EncryptedKeyEnvelope {
        algorithm: AlgorithmIdentifierOwned {
            oid: KEY_PROTECTOR_OID,
            parameters: Some(Any::from(AnyRef::NULL)),
        },
        encrypted_data: OctetString::new(protected).map_err(crypto_error)?,
    };
    envelope.to_der().map_err(crypto_error)
}

fn recover_key(protected: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let envelope = EncryptedKeyEnvelope::from_der(protected)
        .map_err(|e| parse_error(&format!("protected key: {}", e)))?;
    if envelope.algorithm.oid != KEY_PROTECTOR_OID {
        return Err(CredentialError::UnsupportedAlgorithm {
            algorithm: envelope.algorithm.oid.to_string(),
        });
    }

    let data = envelope.encrypted_data.as_bytes();
    if data.len() < SALT_LEN + DIGEST_LEN {
        return Err(parse_error("protected key too short"));
    }
    let (salt, rest) = data.split_at(SALT_LEN);
    let (encrypted, check) = rest.split_at(rest.len() - DIGEST_LEN);

    let keystream = Zeroizing::new(keystream(password, salt, encrypted.len()));
    let key: Zeroizing<Vec<u8>> = Zeroizing::new(
        encrypted
            .iter()
            .zip(keystream.iter())
            .map(|(e, s)| e ^ s)
            .collect(),
    );

    if check_digest(password, &key).as_slice() != check {
        return Err(CredentialError::Authentication { what: KEY_WHAT });
    }
    Ok(key)
}

/// `d0 = salt`, `dn = SHA1(password || dn-1)`, concatenated
fn keystream(password: &[u8], salt: &[u8], len: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(len + DIGEST_LEN);
    let mut block = salt.to_vec();
    while stream.len() < len {
        let mut hasher = Sha1::new();
        hasher.update(password);
        hasher.update(&block);
        block = hasher.finalize().to_vec();
        stream.extend_from_slice(&block);
    }
    stream.truncate(len);
    stream
}

fn check_digest(password: &[u8], key: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(password);
    hasher.update(key);
    to_array(&hasher.finalize())
}

fn integrity_digest(password: &[u8], body: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(password);
    hasher.update(INTEGRITY_SALT);
    hasher.update(body);
    to_array(&hasher.finalize())
}

fn to_array(digest: &[u8]) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(digest);
    out
}

fn utf16_be(password: &str) -> Vec<u8> {
    password.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

fn write_utf(out: &mut Vec<u8>, value: &str) -> Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| crypto_error(format!("string of {} bytes is too long", value.len())))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

fn write_bytes(out: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    let len = u32::try_from(value.len())
        .map_err(|_| crypto_error(format!("{} bytes is too long", value.len())))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value);
    Ok(())
}

fn timestamp(millis: u64) -> Result<DateTime<Utc>> {
    i64::try_from(millis)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or_else(|| parse_error("invalid entry timestamp"))
}

fn parse_error(message: &str) -> CredentialError {
    CredentialError::Parse {
        what: STORE_WHAT,
        message: message.to_string(),
    }
}

fn crypto_error(err: impl std::fmt::Display) -> CredentialError {
    CredentialError::CryptoProvider {
        message: format!("Failed to encode keystore: {}", err),
    }
}

/// Big-endian cursor over the keystore body
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.data.len() < len {
            return Err(parse_error("unexpected end of data"));
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let hi = self.u32()? as u64;
        let lo = self.u32()? as u64;
        Ok((hi << 32) | lo)
    }

    fn utf(&mut self) -> Result<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| parse_error("invalid UTF-8 string"))
    }

    fn bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.u32()? as usize;
        self.take(len)
    }

    fn certificate(&mut self) -> Result<&'a [u8]> {
        let cert_type = self.utf()?;
        if cert_type != CERT_TYPE {
            return Err(parse_error(&format!("unsupported certificate type {}", cert_type)));
        }
        self.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorKind;

    const KEY: &[u8] = include_bytes!("../../tests/fixtures/key.der");
    const CERT: &[u8] = include_bytes!("../../tests/fixtures/fiel.cer");

    #[test]
    fn test_round_trip_single_entry() {
        let store = encode_jks("AAAA010101AAA", KEY, &[CERT], "pass1234").unwrap();
        assert_eq!(&store[..4], &[0xfe, 0xed, 0xfe, 0xed]);

        let entries = decode_jks(&store, "pass1234").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].alias, "aaaa010101aaa");
        assert_eq!(entries[0].key.as_slice(), KEY);
        assert_eq!(entries[0].chain, vec![CERT.to_vec()]);

        let entry = find_entry(&entries, "AAAA010101AAA").unwrap();
        assert_eq!(entry.key.as_slice(), KEY);
    }

    #[test]
    fn test_wrong_password_fails_integrity() {
        let store = encode_jks("alias", KEY, &[CERT], "pass1234").unwrap();
        let err = decode_jks(&store, "pass12345").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_salt_is_random() {
        let a = encode_jks("alias", KEY, &[CERT], "pass1234").unwrap();
        let b = encode_jks("alias", KEY, &[CERT], "pass1234").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_key_fails_check() {
        let mut store = encode_jks("alias", KEY, &[CERT], "pass1234").unwrap();
        // Flip a byte inside the protected key, then reseal the store
        let body_len = store.len() - DIGEST_LEN;
        store[80] ^= 0x01;
        let password = utf16_be("pass1234");
        let digest = integrity_digest(&password, &store[..body_len]);
        store[body_len..].copy_from_slice(&digest);

        let err = decode_jks(&store, "pass1234").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_truncated_store() {
        let store = encode_jks("alias", KEY, &[CERT], "pass1234").unwrap();
        assert_eq!(decode_jks(&store[..10], "pass1234").unwrap_err().kind(), ErrorKind::Parse);
        assert_eq!(decode_jks(b"", "pass1234").unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_keystream_chains_digests() {
        let password = utf16_be("pw");
        let stream = keystream(&password, &[0u8; SALT_LEN], 45);
        assert_eq!(stream.len(), 45);

        let mut hasher = Sha1::new();
        hasher.update(&password);
        hasher.update([0u8; SALT_LEN]);
        let first = hasher.finalize();
        assert_eq!(&stream[..20], first.as_slice());
    }
}
