//! Decrypted key material and the taxpayer identifier

use std::fmt;
use zeroize::Zeroizing;

/// Algorithm of a decrypted private key, taken from its PKCS#8 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
    Ed25519,
    Other(String),
}

impl KeyAlgorithm {
    pub fn from_oid(oid: &str) -> Self {
        match oid {
            "1.2.840.113549.1.1.1" => KeyAlgorithm::Rsa,
            "1.2.840.10045.2.1" => KeyAlgorithm::Ec,
            "1.3.101.112" => KeyAlgorithm::Ed25519,
            other => KeyAlgorithm::Other(other.to_string()),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa => write!(f, "RSA"),
            KeyAlgorithm::Ec => write!(f, "EC"),
            KeyAlgorithm::Ed25519 => write!(f, "Ed25519"),
            KeyAlgorithm::Other(oid) => write!(f, "{}", oid),
        }
    }
}

/// A decrypted private key as PKCS#8 `PrivateKeyInfo` DER.
///
/// The bytes are wiped when the value is dropped and never shown by `Debug`.
/// Not `Clone`; the material moves from the decryptor to the container builder.
pub struct PrivateKeyMaterial {
    der: Zeroizing<Vec<u8>>,
    algorithm: KeyAlgorithm,
}

impl PrivateKeyMaterial {
    pub(crate) fn new(der: Zeroizing<Vec<u8>>, algorithm: KeyAlgorithm) -> Self {
        Self { der, algorithm }
    }

    /// PKCS#8 `PrivateKeyInfo` DER bytes
    pub fn pkcs8_der(&self) -> &[u8] {
        &self.der
    }

    pub fn algorithm(&self) -> &KeyAlgorithm {
        &self.algorithm
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("der", &format_args!("<redacted {} bytes>", self.der.len()))
            .finish()
    }
}

/// Taxpayer identifier (RFC) of the credential holder.
///
/// Construct it with [`str::parse`] or through
/// [`extract_identifier`](crate::credential::extract_identifier), both of
/// which enforce the 12/13 character format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub(crate) String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
