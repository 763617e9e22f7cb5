//! Conversion operations
//!
//! Each operation reads its inputs, converts and writes one file next to the
//! source, returning the written path or a [`ConversionError`].

use crate::credential::{builder, convert, extract_identifier, read_certificate, read_private_key};
use crate::models::BundleFormat;
use crate::utils::{ConversionError, CredentialError, Operation};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Decrypt `key_path` and write it as `<stem>.pem`
pub fn convert_key_to_pem(key_path: &Path, password: &str) -> Result<PathBuf, ConversionError> {
    let tag = |e| ConversionError::new(Operation::KeyToPem, key_path, e);

    let key = read_private_key(key_path, password).map_err(tag)?;
    convert::write_container(&builder::key_pem(key), key_path).map_err(tag)
}

/// Write the public key and certificate of `cert_path` as `<stem>_CER.pem`
pub fn convert_cert_to_pem(cert_path: &Path) -> Result<PathBuf, ConversionError> {
    let tag = |e| ConversionError::new(Operation::CertificateToPem, cert_path, e);

    let record = read_certificate(cert_path).map_err(tag)?;
    convert::write_container(&builder::certificate_pem(&record), cert_path).map_err(tag)
}

/// Build a password protected keystore from the key and certificate.
///
/// The output is written next to the certificate. `new_password` replaces
/// the source password for the keystore when given and non-empty; it is
/// checked against the format's policy before any file is read.
pub fn build_protected_bundle(
    key_path: &Path,
    cert_path: &Path,
    password: &str,
    new_password: Option<&str>,
    format: BundleFormat,
) -> Result<PathBuf, ConversionError> {
    let on_key = |e| ConversionError::new(Operation::ProtectedBundle, key_path, e);
    let on_cert = |e| ConversionError::new(Operation::ProtectedBundle, cert_path, e);

    let target = builder::resolve_target_password(password, new_password);
    builder::validate_bundle_password(target, format).map_err(on_cert)?;

    let key = read_private_key(key_path, password).map_err(on_key)?;
    let record = read_certificate(cert_path).map_err(on_cert)?;
    let alias = extract_identifier(&record).map_err(on_cert)?;

    let container = builder::protected_bundle(&key, &record, alias, target, format).map_err(on_cert)?;
    convert::write_container(&container, cert_path).map_err(on_cert)
}

/// An output a caller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    KeyPem,
    CertificatePem,
    Bundle(BundleFormat),
}

impl OutputKind {
    pub fn operation(&self) -> Operation {
        match self {
            OutputKind::KeyPem => Operation::KeyToPem,
            OutputKind::CertificatePem => Operation::CertificateToPem,
            OutputKind::Bundle(_) => Operation::ProtectedBundle,
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::KeyPem => write!(f, "Key PEM"),
            OutputKind::CertificatePem => write!(f, "Certificate PEM"),
            OutputKind::Bundle(format) => write!(f, "{} keystore", format),
        }
    }
}

/// Inputs shared by several conversions in one session
#[derive(Default)]
pub struct ConversionRequest {
    pub key_path: Option<PathBuf>,
    pub cert_path: Option<PathBuf>,
    pub password: Zeroizing<String>,
    pub new_password: Option<Zeroizing<String>>,
    pub outputs: Vec<OutputKind>,
}

/// Result of one requested output
#[derive(Debug)]
pub struct ConversionOutcome {
    pub output: OutputKind,
    pub result: Result<PathBuf, ConversionError>,
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every requested output independently; one failure does not stop the rest
pub fn run_conversions(request: &ConversionRequest) -> Vec<ConversionOutcome> {
    request
        .outputs
        .iter()
        .map(|&output| {
            let result = run_one(request, output);
            match &result {
                Ok(path) => tracing::info!(%output, path = %path.display(), "Conversion succeeded"),
                Err(e) => tracing::warn!(%output, error = %e, "Conversion failed"),
            }
            ConversionOutcome { output, result }
        })
        .collect()
}

fn run_one(request: &ConversionRequest, output: OutputKind) -> Result<PathBuf, ConversionError> {
    let key_path = || required(request.key_path.as_deref(), output, "key path");
    let cert_path = || required(request.cert_path.as_deref(), output, "certificate path");

    match output {
        OutputKind::KeyPem => convert_key_to_pem(key_path()?, &request.password),
        OutputKind::CertificatePem => convert_cert_to_pem(cert_path()?),
        OutputKind::Bundle(format) => build_protected_bundle(
            key_path()?,
            cert_path()?,
            &request.password,
            request.new_password.as_deref().map(String::as_str),
            format,
        ),
    }
}

fn required<'a>(
    path: Option<&'a Path>,
    output: OutputKind,
    field: &'static str,
) -> Result<&'a Path, ConversionError> {
    path.ok_or_else(|| {
        ConversionError::new(
            output.operation(),
            PathBuf::new(),
            CredentialError::Validation {
                field,
                message: "no file was given".to_string(),
            },
        )
    })
}
