//! Taxpayer identifier (RFC) extraction

use crate::models::{CertificateRecord, Identifier};
use crate::utils::CredentialError;
use std::str::FromStr;

/// `uniqueIdentifier`; SAT stores `RFC / representative RFC` in it
pub const UNIQUE_IDENTIFIER_OID: &str = "2.5.4.45";

/// Legal entity RFC length
pub const LEGAL_ENTITY_LEN: usize = 12;
/// Natural person RFC length
pub const NATURAL_PERSON_LEN: usize = 13;

/// Extract the holder's RFC from the certificate subject
pub fn extract_identifier(record: &CertificateRecord) -> Result<Identifier, CredentialError> {
    let value = record
        .subject_value(UNIQUE_IDENTIFIER_OID)
        .ok_or_else(|| CredentialError::Extraction {
            message: format!(
                "subject has no uniqueIdentifier ({}) attribute",
                UNIQUE_IDENTIFIER_OID
            ),
        })?;

    let first = value.split('/').next().unwrap_or_default();
    let identifier: Identifier = first.parse()?;

    tracing::debug!(identifier = %identifier, "Extracted identifier");
    Ok(identifier)
}

impl FromStr for Identifier {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = s.trim();
        let chars: Vec<char> = candidate.chars().collect();

        if chars.len() != LEGAL_ENTITY_LEN && chars.len() != NATURAL_PERSON_LEN {
            return Err(CredentialError::Extraction {
                message: format!(
                    "identifier {:?} must be {} or {} characters, got {}",
                    candidate,
                    LEGAL_ENTITY_LEN,
                    NATURAL_PERSON_LEN,
                    chars.len()
                ),
            });
        }

        // Name letters, then YYMMDD, then a three character homoclave.
        let prefix = chars.len() - 9;
        let well_formed = chars[..prefix].iter().all(|c| is_name_char(*c))
            && chars[prefix..prefix + 6].iter().all(char::is_ascii_digit)
            && chars[prefix + 6..].iter().all(char::is_ascii_alphanumeric);
        let uppercase = chars
            .iter()
            .all(|c| !c.is_ascii_alphabetic() || c.is_ascii_uppercase());

        if !well_formed || !uppercase {
            return Err(CredentialError::Extraction {
                message: format!("identifier {:?} is not a valid RFC", candidate),
            });
        }

        Ok(Identifier(candidate.to_string()))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_uppercase() || c == '&' || c == 'Ñ'
}
