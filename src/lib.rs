//! fiel-convert library
//!
//! Converts SAT e.firma (FIEL) credentials:
//! - Decrypts the PKCS#8 encrypted private key
//! - Parses the X.509 certificate and extracts the holder's RFC
//! - Writes the key or certificate as PEM
//! - Builds a PKCS#12 or JKS keystore with the RFC as alias
//!
//! # Usage
//!
//! ```rust,no_run
//! use fiel_convert::credential::build_protected_bundle;
//! use fiel_convert::models::BundleFormat;
//! use std::path::Path;
//!
//! let path = build_protected_bundle(
//!     Path::new("fiel.key"),
//!     Path::new("fiel.cer"),
//!     "12345678a",
//!     None,
//!     BundleFormat::P12,
//! )?;
//! println!("Wrote {}", path.display());
//! # Ok::<(), fiel_convert::ConversionError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod credential;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use cli::Cli;
pub use config::Settings;
pub use models::{BundleFormat, CertificateRecord, Identifier, OutputContainer, PrivateKeyMaterial};
pub use utils::{ConversionError, CredentialError, ErrorKind, Result};
