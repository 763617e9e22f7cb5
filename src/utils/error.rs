//! Custom error types for fiel-convert
//!
//! This module defines the failure modes of credential conversion using
//! `thiserror`. `CredentialError` is what every component returns;
//! `ConversionError` adds the operation and path the failure belongs to.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures produced while decrypting, parsing, building or writing credentials
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("Password does not decrypt the {what}")]
    Authentication { what: &'static str },

    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Cannot extract taxpayer identifier: {message}")]
    Extraction { message: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Cryptographic operation failed: {message}")]
    CryptoProvider { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Field-less discriminant of [`CredentialError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Authentication,
    UnsupportedAlgorithm,
    Extraction,
    Validation,
    CryptoProvider,
    Io,
}

impl CredentialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CredentialError::Parse { .. } => ErrorKind::Parse,
            CredentialError::Authentication { .. } => ErrorKind::Authentication,
            CredentialError::UnsupportedAlgorithm { .. } => ErrorKind::UnsupportedAlgorithm,
            CredentialError::Extraction { .. } => ErrorKind::Extraction,
            CredentialError::Validation { .. } => ErrorKind::Validation,
            CredentialError::CryptoProvider { .. } => ErrorKind::CryptoProvider,
            CredentialError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CredentialError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }
}

/// The core operations a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    KeyToPem,
    CertificateToPem,
    ProtectedBundle,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::KeyToPem => write!(f, "Key to PEM conversion"),
            Operation::CertificateToPem => write!(f, "Certificate to PEM conversion"),
            Operation::ProtectedBundle => write!(f, "Keystore generation"),
        }
    }
}

/// A [`CredentialError`] tagged with the operation and file it concerns
#[derive(Error, Debug)]
#[error("{operation} failed for {}: {source}", .path.display())]
pub struct ConversionError {
    pub operation: Operation,
    pub path: PathBuf,
    pub source: CredentialError,
}

impl ConversionError {
    pub fn new(operation: Operation, path: impl Into<PathBuf>, source: CredentialError) -> Self {
        Self {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// Process exit status a CLI should use for this failure
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation => 2,
            ErrorKind::Authentication => 3,
            _ => 1,
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias using CredentialError
pub type Result<T> = std::result::Result<T, CredentialError>;
