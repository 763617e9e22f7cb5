//! Parsed certificate record

use chrono::{DateTime, Utc};

/// One attribute of a distinguished name, in encoded order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnAttribute {
    /// Dotted attribute type OID
    pub oid: String,
    /// String value, or `#` followed by hex when the value is not a string
    pub value: String,
}

impl DnAttribute {
    pub fn new(oid: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            value: value.into(),
        }
    }
}

/// Certificate extension kept as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueExtension {
    pub oid: String,
    pub critical: bool,
    pub value: Vec<u8>,
}

/// A decoded X.509 certificate.
///
/// Only what format conversion needs is decoded; the signature is not checked.
#[derive(Debug, Clone)]
pub struct CertificateRecord {
    /// Exact DER encoding of the certificate
    pub der: Vec<u8>,
    /// Raw serial number bytes
    pub serial: Vec<u8>,
    pub issuer: Vec<DnAttribute>,
    pub subject: Vec<DnAttribute>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// DER SubjectPublicKeyInfo
    pub public_key_info: Vec<u8>,
    pub extensions: Vec<OpaqueExtension>,
}

/// Short names used when rendering a DN for display
const DN_LABELS: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.5", "serialNumber"),
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.9", "STREET"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.41", "name"),
    ("2.5.4.45", "uniqueIdentifier"),
    ("0.9.2342.19200300.100.1.1", "UID"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("1.2.840.113549.1.9.1", "emailAddress"),
];

impl CertificateRecord {
    /// First subject value for the given attribute OID
    pub fn subject_value(&self, oid: &str) -> Option<&str> {
        self.subject
            .iter()
            .find(|attr| attr.oid == oid)
            .map(|attr| attr.value.as_str())
    }

    /// Serial number as colon separated hex
    pub fn serial_hex(&self) -> String {
        self.serial
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// SAT certificate number.
    ///
    /// SAT encodes the 20 digit certificate number as the ASCII bytes of the
    /// serial. Returns `None` for serials that are not printable digits.
    pub fn certificate_number(&self) -> Option<String> {
        if !self.serial.is_empty() && self.serial.iter().all(u8::is_ascii_digit) {
            Some(String::from_utf8_lossy(&self.serial).into_owned())
        } else {
            None
        }
    }

    /// Subject rendered RFC 2253 style, most significant RDN last.
    ///
    /// For diagnostics only; nothing reads values back out of this string.
    pub fn subject_display(&self) -> String {
        render_dn(&self.subject)
    }

    pub fn issuer_display(&self) -> String {
        render_dn(&self.issuer)
    }
}

fn render_dn(attributes: &[DnAttribute]) -> String {
    attributes
        .iter()
        .rev()
        .map(|attr| {
            let label = DN_LABELS
                .iter()
                .find(|(oid, _)| *oid == attr.oid)
                .map(|(_, label)| *label)
                .unwrap_or(attr.oid.as_str());
            format!("{}={}", label, escape_dn_value(&attr.value))
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_dn_value(value: &str) -> String {
    if value.starts_with('#') && value.len() > 1 && value[1..].bytes().all(|b| b.is_ascii_hexdigit()) {
        return value.to_string();
    }

    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let edge_space = c == ' ' && (i == 0 || i == last);
        let leading_hash = c == '#' && i == 0;
        if matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';') || edge_space || leading_hash {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
