//! Output containers produced by the builder and persisted by the writer

use crate::models::{Identifier, PrivateKeyMaterial};
use serde::Deserialize;
use std::fmt;
use std::ops::RangeInclusive;

/// Password protected keystore format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    /// PKCS#12 / PFX
    #[default]
    #[serde(alias = "pkcs12", alias = "pfx")]
    P12,
    /// Java KeyStore
    Jks,
}

impl BundleFormat {
    /// Suffix appended to the stripped source path
    pub fn suffix(&self) -> &'static str {
        match self {
            BundleFormat::P12 => ".p12",
            BundleFormat::Jks => ".jks",
        }
    }

    /// Accepted password length, in characters
    pub fn password_policy(&self) -> RangeInclusive<usize> {
        match self {
            BundleFormat::P12 => 1..=128,
            BundleFormat::Jks => 5..=20,
        }
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleFormat::P12 => write!(f, "PKCS#12"),
            BundleFormat::Jks => write!(f, "JKS"),
        }
    }
}

/// A conversion result ready to be written next to its source file
#[derive(Debug)]
pub enum OutputContainer {
    /// Unencrypted `PRIVATE KEY` PEM
    Pem { key: PrivateKeyMaterial },
    /// `PUBLIC KEY` followed by `CERTIFICATE` PEM
    PemCertBundle {
        public_key_info: Vec<u8>,
        certificate: Vec<u8>,
    },
    /// An encoded single-entry keystore, already protected with its password
    ProtectedBundle {
        alias: Identifier,
        format: BundleFormat,
        store: Vec<u8>,
    },
}

impl OutputContainer {
    /// Suffix appended to the stripped source path
    pub fn suffix(&self) -> &'static str {
        match self {
            OutputContainer::Pem { .. } => ".pem",
            OutputContainer::PemCertBundle { .. } => "_CER.pem",
            OutputContainer::ProtectedBundle { format, .. } => format.suffix(),
        }
    }
}
