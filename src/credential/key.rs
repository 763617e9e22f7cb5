//! Password protected private key decryption
//!
//! SAT issues the FIEL private key as a DER `EncryptedPrivateKeyInfo`
//! (PKCS#8) protected with PBES2: PBKDF2 with HMAC-SHA1 and DES-EDE3-CBC.
//! AES-CBC and the SHA-2 PRFs are accepted as well.

use crate::models::{KeyAlgorithm, PrivateKeyMaterial};
use crate::utils::{CredentialError, Result};
use der::asn1::OctetString;
use der::{Decode, Encode, Sequence};
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use spki::AlgorithmIdentifierOwned;
use std::borrow::Cow;
use std::path::Path;
use zeroize::Zeroizing;

/// Accepted source password length, in characters
pub const MIN_PASSWORD_LEN: usize = 1;
pub const MAX_PASSWORD_LEN: usize = 128;

const KEY_WHAT: &str = "private key";
const CONTAINER_WHAT: &str = "encrypted private key";
const ENCRYPTED_KEY_TAG: &str = "ENCRYPTED PRIVATE KEY";

/// `AlgorithmIdentifier` plus an OCTET STRING.
///
/// This is the outer shape of an `EncryptedPrivateKeyInfo` decoded without
/// interpreting the algorithm, so framing errors can be told apart from
/// unsupported schemes. JKS stores its protected keys in the same shape.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub(crate) struct EncryptedKeyEnvelope {
    pub algorithm: AlgorithmIdentifierOwned,
    pub encrypted_data: OctetString,
}

/// Read and decrypt a private key file
pub fn read_private_key(path: &Path, password: &str) -> Result<PrivateKeyMaterial> {
    validate_source_password(password)?;
    let data = std::fs::read(path).map_err(|e| CredentialError::io(path, e))?;
    decrypt_private_key(&data, password)
}

/// Check the source password against the 1–128 character policy
pub fn validate_source_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        Ok(())
    } else {
        Err(CredentialError::Validation {
            field: "password",
            message: format!(
                "must be between {} and {} characters, got {}",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN, len
            ),
        })
    }
}

/// Decrypt an `EncryptedPrivateKeyInfo` (DER, or an `ENCRYPTED PRIVATE KEY` PEM block)
pub fn decrypt_private_key(data: &[u8], password: &str) -> Result<PrivateKeyMaterial> {
    validate_source_password(password)?;
    let der = container_der(data)?;
    let info = decode_container(&der)?;

    let plaintext = Zeroizing::new(
        info.encryption_algorithm
            .decrypt(password, info.encrypted_data)
            .map_err(scheme_error)?,
    );

    // Padding can survive a wrong password by chance; the structure check catches it.
    let algorithm = match PrivateKeyInfo::try_from(plaintext.as_slice()) {
        Ok(key_info) => KeyAlgorithm::from_oid(&key_info.algorithm.oid.to_string()),
        Err(_) => return Err(CredentialError::Authentication { what: KEY_WHAT }),
    };

    tracing::debug!(%algorithm, "Decrypted private key");
    Ok(PrivateKeyMaterial::new(plaintext, algorithm))
}

/// Encrypt `key` again using the scheme and parameters (salt, iteration
/// count, IV) found in `container`.
pub fn reencrypt_private_key(
    container: &[u8],
    key: &PrivateKeyMaterial,
    password: &str,
) -> Result<Vec<u8>> {
    validate_source_password(password)?;
    let der = container_der(container)?;
    let info = decode_container(&der)?;

    let ciphertext = match &info.encryption_algorithm {
        pkcs5::EncryptionScheme::Pbes2(params) => params
            .encrypt(password, key.pkcs8_der())
            .map_err(|e| CredentialError::CryptoProvider {
                message: format!("Failed to encrypt private key: {}", e),
            })?,
        _ => {
            return Err(CredentialError::UnsupportedAlgorithm {
                algorithm: "PBES1 encryption".to_string(),
            })
        }
    };

    EncryptedPrivateKeyInfo {
        encryption_algorithm: info.encryption_algorithm,
        encrypted_data: &ciphertext,
    }
    .to_der()
    .map_err(|e| CredentialError::CryptoProvider {
        message: format!("Failed to encode encrypted private key: {}", e),
    })
}

/// Strip PEM armor if present
fn container_der(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if let Ok(text) = std::str::from_utf8(data) {
        if text.contains("-----BEGIN ") {
            let block = ::pem::parse(data).map_err(|e| CredentialError::Parse {
                what: CONTAINER_WHAT,
                message: format!("Failed to parse PEM: {}", e),
            })?;
            if block.tag() != ENCRYPTED_KEY_TAG {
                return Err(CredentialError::Parse {
                    what: CONTAINER_WHAT,
                    message: format!(
                        "expected an {} block, found {}",
                        ENCRYPTED_KEY_TAG,
                        block.tag()
                    ),
                });
            }
            return Ok(Cow::Owned(block.into_contents()));
        }
    }

    Ok(Cow::Borrowed(data))
}

fn decode_container(der: &[u8]) -> Result<EncryptedPrivateKeyInfo<'_>> {
    let envelope = EncryptedKeyEnvelope::from_der(der).map_err(|e| CredentialError::Parse {
        what: CONTAINER_WHAT,
        message: e.to_string(),
    })?;

    EncryptedPrivateKeyInfo::try_from(der).map_err(|e| {
        let unknown_oid = matches!(
            &e,
            pkcs8::Error::Asn1(inner) if matches!(inner.kind(), der::ErrorKind::OidUnknown { .. })
        );
        if envelope.algorithm.oid != pkcs5::pbes2::PBES2_OID || unknown_oid {
            CredentialError::UnsupportedAlgorithm {
                algorithm: scheme_name(&envelope.algorithm.oid.to_string()),
            }
        } else {
            CredentialError::Parse {
                what: CONTAINER_WHAT,
                message: format!("invalid PBES2 parameters: {}", e),
            }
        }
    })
}

fn scheme_name(oid: &str) -> String {
    let name = match oid {
        "1.2.840.113549.1.5.13" => "PBES2",
        "1.2.840.113549.1.12.1.1" => "pbeWithSHAAnd128BitRC4",
        "1.2.840.113549.1.12.1.3" => "pbeWithSHAAnd3-KeyTripleDES-CBC",
        "1.2.840.113549.1.12.1.6" => "pbeWithSHAAnd40BitRC2-CBC",
        _ => return oid.to_string(),
    };
    format!("{} ({})", name, oid)
}

fn scheme_error(err: pkcs5::Error) -> CredentialError {
    match err {
        pkcs5::Error::DecryptFailed => CredentialError::Authentication { what: KEY_WHAT },
        other => CredentialError::UnsupportedAlgorithm {
            algorithm: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorKind;

    const FIEL_KEY: &[u8] = include_bytes!("../../tests/fixtures/fiel.key");
    const AES_KEY: &[u8] = include_bytes!("../../tests/fixtures/aes.key");
    const PBE_KEY: &[u8] = include_bytes!("../../tests/fixtures/pbe.key");
    const FIEL_KEY_PEM: &[u8] = include_bytes!("../../tests/fixtures/fiel-key.pem");
    const PLAIN_KEY: &[u8] = include_bytes!("../../tests/fixtures/key.der");
    const PASSWORD: &str = "12345678a";

    #[test]
    fn test_decrypt_sat_key() {
        let key = decrypt_private_key(FIEL_KEY, PASSWORD).unwrap();
        assert_eq!(key.algorithm(), &KeyAlgorithm::Rsa);
        assert_eq!(key.pkcs8_der(), PLAIN_KEY);
    }

    #[test]
    fn test_decrypt_aes_and_pem_variants() {
        let aes = decrypt_private_key(AES_KEY, PASSWORD).unwrap();
        assert_eq!(aes.pkcs8_der(), PLAIN_KEY);

        let pem = decrypt_private_key(FIEL_KEY_PEM, PASSWORD).unwrap();
        assert_eq!(pem.pkcs8_der(), PLAIN_KEY);
    }

    #[test]
    fn test_wrong_password_is_authentication_error() {
        let long = "x".repeat(128);
        for wrong in ["12345678", "12345678A", "wrong", "a", long.as_str()] {
            let err = decrypt_private_key(FIEL_KEY, wrong).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authentication, "password {:?}", wrong);
        }
        let err = decrypt_private_key(AES_KEY, "not it").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = decrypt_private_key(PBE_KEY, PASSWORD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAlgorithm);
    }

    #[test]
    fn test_malformed_container_is_parse_error() {
        let err = decrypt_private_key(b"\x30\x03\x02\x01", PASSWORD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = decrypt_private_key(&FIEL_KEY[..FIEL_KEY.len() - 10], PASSWORD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        // An unencrypted key is not a valid input
        let err = decrypt_private_key(PLAIN_KEY, PASSWORD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_malformed_pbes2_parameters_is_parse_error() {
        // PBES2 OID with NULL parameters instead of the KDF and cipher sequence
        let container = [
            0x30, 0x12, 0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x05,
            0x0d, 0x05, 0x00, 0x04, 0x01, 0x00,
        ];
        let err = decrypt_private_key(&container, PASSWORD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_password_length_policy() {
        let err = decrypt_private_key(FIEL_KEY, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = decrypt_private_key(FIEL_KEY, &"x".repeat(129)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Length counts characters, not bytes
        assert!(validate_source_password(&"ñ".repeat(128)).is_ok());
    }

    #[test]
    fn test_reencrypt_round_trip() {
        for container in [FIEL_KEY, AES_KEY] {
            let key = decrypt_private_key(container, PASSWORD).unwrap();
            let again = reencrypt_private_key(container, &key, PASSWORD).unwrap();
            let decrypted = decrypt_private_key(&again, PASSWORD).unwrap();
            assert_eq!(decrypted.pkcs8_der(), key.pkcs8_der());
        }
    }

    #[test]
    fn test_reencrypt_with_new_password() {
        let key = decrypt_private_key(FIEL_KEY, PASSWORD).unwrap();
        let again = reencrypt_private_key(FIEL_KEY, &key, "otra-clave").unwrap();
        assert_eq!(
            decrypt_private_key(&again, PASSWORD).unwrap_err().kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            decrypt_private_key(&again, "otra-clave").unwrap().pkcs8_der(),
            PLAIN_KEY
        );
    }
}
