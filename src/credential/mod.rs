//! FIEL credential conversion
//!
//! Decrypts the SAT private key, parses the certificate, extracts the
//! taxpayer identifier and writes PEM files or a password protected keystore.

pub mod builder;
pub mod convert;
pub mod identifier;
pub mod jks;
pub mod key;
pub mod reader;
pub mod runner;

pub use builder::{protected_bundle, resolve_target_password, validate_bundle_password};
pub use convert::{derive_output_path, output_path, write_container};
pub use identifier::{extract_identifier, UNIQUE_IDENTIFIER_OID};
pub use key::{decrypt_private_key, read_private_key, reencrypt_private_key};
pub use reader::{parse_certificate, read_certificate};
pub use runner::{
    build_protected_bundle, convert_cert_to_pem, convert_key_to_pem, run_conversions,
    ConversionOutcome, ConversionRequest, OutputKind,
};
