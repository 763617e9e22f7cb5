//! Certificate reading
//!
//! Decodes the FIEL `.cer` file (DER, or PEM for convenience) into a
//! [`CertificateRecord`]. Signatures and chains are not verified.

use crate::models::{CertificateRecord, DnAttribute, OpaqueExtension};
use crate::utils::{CredentialError, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::borrow::Cow;
use std::path::Path;
use x509_parser::prelude::*;

const CERT_WHAT: &str = "certificate";

/// Read and parse a certificate file
pub fn read_certificate(path: &Path) -> Result<CertificateRecord> {
    let data = std::fs::read(path).map_err(|e| CredentialError::io(path, e))?;
    parse_certificate(&data)
}

/// Parse a DER certificate, or the first `CERTIFICATE` block of PEM data
pub fn parse_certificate(data: &[u8]) -> Result<CertificateRecord> {
    let der = certificate_der(data)?;

    let (rest, cert) = X509Certificate::from_der(&der).map_err(|e| CredentialError::Parse {
        what: CERT_WHAT,
        message: format!("{:?}", e),
    })?;
    if !rest.is_empty() {
        return Err(CredentialError::Parse {
            what: CERT_WHAT,
            message: format!("{} trailing bytes after certificate", rest.len()),
        });
    }

    let record = CertificateRecord {
        der: der.to_vec(),
        serial: cert.raw_serial().to_vec(),
        issuer: collect_attributes(cert.issuer()),
        subject: collect_attributes(cert.subject()),
        not_before: asn1_time_to_datetime(cert.validity().not_before)?,
        not_after: asn1_time_to_datetime(cert.validity().not_after)?,
        public_key_info: cert.public_key().raw.to_vec(),
        extensions: cert
            .extensions()
            .iter()
            .map(|ext| OpaqueExtension {
                oid: ext.oid.to_id_string(),
                critical: ext.critical,
                value: ext.value.to_vec(),
            })
            .collect(),
    };

    tracing::debug!(
        subject = %record.subject_display(),
        issuer = %record.issuer_display(),
        serial = %record.serial_hex(),
        number = ?record.certificate_number(),
        not_after = %record.not_after,
        "Parsed certificate"
    );

    Ok(record)
}

fn certificate_der(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if let Ok(text) = std::str::from_utf8(data) {
        if text.contains("-----BEGIN ") {
            let pems = ::pem::parse_many(data).map_err(|e| CredentialError::Parse {
                what: CERT_WHAT,
                message: format!("Failed to parse PEM: {}", e),
            })?;
            let cert_pem = pems
                .into_iter()
                .find(|p| p.tag() == "CERTIFICATE")
                .ok_or_else(|| CredentialError::Parse {
                    what: CERT_WHAT,
                    message: "No CERTIFICATE block found in PEM data".to_string(),
                })?;
            return Ok(Cow::Owned(cert_pem.into_contents()));
        }
    }

    Ok(Cow::Borrowed(data))
}

fn collect_attributes(name: &X509Name) -> Vec<DnAttribute> {
    let mut attributes = Vec::new();

    for rdn in name.iter() {
        for attr in rdn.iter() {
            let value = match attr.as_str() {
                Ok(s) => s.to_string(),
                Err(_) => {
                    let raw = attr.attr_value().data;
                    match std::str::from_utf8(raw) {
                        Ok(s) => s.to_string(),
                        Err(_) => format!("#{}", hex::encode(raw)),
                    }
                }
            };
            attributes.push(DnAttribute::new(attr.attr_type().to_id_string(), value));
        }
    }

    attributes
}

/// Convert ASN.1 time to chrono DateTime
fn asn1_time_to_datetime(time: ASN1Time) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(time.timestamp(), 0)
        .single()
        .ok_or_else(|| CredentialError::Parse {
            what: CERT_WHAT,
            message: "Invalid timestamp in certificate".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorKind;

    const FIEL_CER: &[u8] = include_bytes!("../../tests/fixtures/fiel.cer");
    const FIEL_CER_PEM: &[u8] = include_bytes!("../../tests/fixtures/fiel-cert.pem");

    #[test]
    fn test_parse_sat_certificate() {
        let record = parse_certificate(FIEL_CER).unwrap();
        assert_eq!(record.der, FIEL_CER);
        assert_eq!(
            record.certificate_number().as_deref(),
            Some("30001000000500003416")
        );
        assert_eq!(
            record.subject_value("2.5.4.45"),
            Some("AAAA010101AAA / HEGT761003S2")
        );
        assert_eq!(record.subject_value("2.5.4.3"), Some("JUAN PEREZ LOPEZ"));
        assert_eq!(record.subject[0].oid, "2.5.4.3");
        // Self-signed fixture
        assert_eq!(record.issuer_display(), record.subject_display());
        assert!(record.not_before < record.not_after);
        assert_eq!(record.public_key_info[0], 0x30);
        assert!(!record.extensions.is_empty());
    }

    #[test]
    fn test_pem_input_matches_der() {
        let from_pem = parse_certificate(FIEL_CER_PEM).unwrap();
        assert_eq!(from_pem.der, FIEL_CER);
    }

    #[test]
    fn test_malformed_certificate() {
        let err = parse_certificate(b"this is not a certificate").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse_certificate(&FIEL_CER[..200]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let mut padded = FIEL_CER.to_vec();
        padded.extend_from_slice(&[0, 0]);
        assert_eq!(
            parse_certificate(&padded).unwrap_err().kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_pem_without_certificate_block() {
        let data = b"-----BEGIN PUBLIC KEY-----\nMAA=\n-----END PUBLIC KEY-----\n";
        let err = parse_certificate(data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
