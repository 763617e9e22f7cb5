//! Output container construction

use crate::credential::jks;
use crate::models::{BundleFormat, CertificateRecord, Identifier, OutputContainer, PrivateKeyMaterial};
use crate::utils::{CredentialError, Result};
use sha2::Digest;

/// Wrap a decrypted key for unencrypted `PRIVATE KEY` PEM output
pub fn key_pem(key: PrivateKeyMaterial) -> OutputContainer {
    OutputContainer::Pem { key }
}

/// `PUBLIC KEY` and `CERTIFICATE` PEM output for a certificate
pub fn certificate_pem(record: &CertificateRecord) -> OutputContainer {
    OutputContainer::PemCertBundle {
        public_key_info: record.public_key_info.clone(),
        certificate: record.der.clone(),
    }
}

/// The bundle password: the target when given and non-empty, else the source
pub fn resolve_target_password<'a>(source: &'a str, target: Option<&'a str>) -> &'a str {
    match target {
        Some(target) if !target.is_empty() => target,
        _ => source,
    }
}

/// Check a bundle password against the format's length policy
pub fn validate_bundle_password(password: &str, format: BundleFormat) -> Result<()> {
    let policy = format.password_policy();
    let len = password.chars().count();
    if policy.contains(&len) {
        return Ok(());
    }

    Err(CredentialError::Validation {
        field: "target password",
        message: format!(
            "{} keystores need {} to {} characters, got {}",
            format,
            policy.start(),
            policy.end(),
            len
        ),
    })
}

/// Build a single-entry keystore holding `key` and `record` under `alias`.
///
/// The same password protects the key entry and the store integrity.
pub fn protected_bundle(
    key: &PrivateKeyMaterial,
    record: &CertificateRecord,
    alias: Identifier,
    password: &str,
    format: BundleFormat,
) -> Result<OutputContainer> {
    validate_bundle_password(password, format)?;

    let store = match format {
        BundleFormat::P12 => pkcs12_store(key, record, &alias, password)?,
        BundleFormat::Jks => jks::encode_jks(alias.as_str(), key.pkcs8_der(), &[record.der.as_slice()], password)?,
    };

    tracing::debug!(alias = %alias, %format, size = store.len(), "Built keystore");

    Ok(OutputContainer::ProtectedBundle {
        alias,
        format,
        store,
    })
}

fn pkcs12_store(
    key: &PrivateKeyMaterial,
    record: &CertificateRecord,
    alias: &Identifier,
    password: &str,
) -> Result<Vec<u8>> {
    let mut keystore = p12_keystore::KeyStore::new();

    let cert = p12_keystore::Certificate::from_der(&record.der).map_err(|e| {
        CredentialError::CryptoProvider {
            message: format!("Failed to load certificate for PKCS#12: {}", e),
        }
    })?;

    let local_key_id = {
        let mut hasher = sha2::Sha256::new();
        hasher.update(&record.der);
        hasher.finalize().to_vec()
    };

    let chain = p12_keystore::PrivateKeyChain::new(key.pkcs8_der().to_vec(), &local_key_id, vec![cert]);
    keystore.add_entry(alias.as_str(), p12_keystore::KeyStoreEntry::PrivateKeyChain(chain));

    keystore
        .writer(password)
        .write()
        .map_err(|e| CredentialError::CryptoProvider {
            message: format!("Failed to serialize PKCS#12: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{decrypt_private_key, extract_identifier, parse_certificate};
    use crate::utils::ErrorKind;

    const FIEL_KEY: &[u8] = include_bytes!("../../tests/fixtures/fiel.key");
    const FIEL_CER: &[u8] = include_bytes!("../../tests/fixtures/fiel.cer");
    const PLAIN_KEY: &[u8] = include_bytes!("../../tests/fixtures/key.der");

    fn inputs() -> (PrivateKeyMaterial, CertificateRecord, Identifier) {
        let key = decrypt_private_key(FIEL_KEY, "12345678a").unwrap();
        let record = parse_certificate(FIEL_CER).unwrap();
        let alias = extract_identifier(&record).unwrap();
        (key, record, alias)
    }

    #[test]
    fn test_resolve_target_password() {
        assert_eq!(resolve_target_password("source", None), "source");
        assert_eq!(resolve_target_password("source", Some("")), "source");
        assert_eq!(resolve_target_password("source", Some("target")), "target");
    }

    #[test]
    fn test_validate_bundle_password() {
        let err = validate_bundle_password("abc", BundleFormat::Jks).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(validate_bundle_password(&"x".repeat(21), BundleFormat::Jks).is_err());
        assert!(validate_bundle_password("abcde", BundleFormat::Jks).is_ok());
        assert!(validate_bundle_password("a", BundleFormat::P12).is_ok());
        assert!(validate_bundle_password("", BundleFormat::P12).is_err());
    }

    #[test]
    fn test_certificate_pem_contents() {
        let record = parse_certificate(FIEL_CER).unwrap();
        match certificate_pem(&record) {
            OutputContainer::PemCertBundle {
                public_key_info,
                certificate,
            } => {
                assert_eq!(certificate, FIEL_CER);
                assert_eq!(public_key_info, record.public_key_info);
            }
            other => panic!("unexpected container {:?}", other),
        }
    }

    #[test]
    fn test_pkcs12_bundle_round_trip() {
        let (key, record, alias) = inputs();
        let container = protected_bundle(&key, &record, alias, "pass1234", BundleFormat::P12).unwrap();
        let store = match container {
            OutputContainer::ProtectedBundle { store, alias, .. } => {
                assert_eq!(alias.as_str(), "AAAA010101AAA");
                store
            }
            other => panic!("unexpected container {:?}", other),
        };

        let keystore = p12_keystore::KeyStore::from_pkcs12(&store, "pass1234").unwrap();
        let entries: Vec<_> = keystore.entries().collect();
        assert_eq!(entries.len(), 1);
        let (entry_alias, entry) = entries[0];
        assert_eq!(entry_alias.as_str(), "AAAA010101AAA");
        match entry {
            p12_keystore::KeyStoreEntry::PrivateKeyChain(chain) => {
                assert_eq!(chain.key(), PLAIN_KEY);
                assert_eq!(chain.chain().len(), 1);
                assert_eq!(chain.chain()[0].as_der(), FIEL_CER);
            }
            _ => panic!("expected a private key entry"),
        }

        assert!(p12_keystore::KeyStore::from_pkcs12(&store, "wrong").is_err());
    }

    #[test]
    fn test_jks_bundle_round_trip() {
        let (key, record, alias) = inputs();
        let container = protected_bundle(&key, &record, alias, "pass1234", BundleFormat::Jks).unwrap();
        assert_eq!(container.suffix(), ".jks");
        let OutputContainer::ProtectedBundle { store, .. } = container else {
            panic!("expected a protected bundle");
        };

        let entries = jks::decode_jks(&store, "pass1234").unwrap();
        assert_eq!(entries.len(), 1);
        let entry = jks::find_entry(&entries, "AAAA010101AAA").unwrap();
        assert_eq!(entry.key.as_slice(), PLAIN_KEY);
        assert_eq!(entry.chain, vec![FIEL_CER.to_vec()]);
    }

    #[test]
    fn test_short_jks_password_rejected() {
        let (key, record, alias) = inputs();
        let err = protected_bundle(&key, &record, alias, "abc", BundleFormat::Jks).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
