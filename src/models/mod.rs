//! Data models for fiel-convert
//!
//! This module contains the transient values passed between the conversion
//! stages. Nothing here is persisted between invocations.

pub mod certificate;
pub mod container;
pub mod credential;

pub use certificate::{CertificateRecord, DnAttribute, OpaqueExtension};
pub use container::{BundleFormat, OutputContainer};
pub use credential::{Identifier, KeyAlgorithm, PrivateKeyMaterial};
