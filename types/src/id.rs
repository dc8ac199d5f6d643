//! Unique identifier types for the three registry namespaces.
//!
//! Formats follow the national-registry conventions the core models:
//! - identity numbers: 12 decimal digits, first digit nonzero
//! - tax identifiers: `AAAAA9999A`
//! - entity identifiers: 2-char region code + 10-char core + entity digit
//!   + `Z` + checksum char (15 chars total)
//!
//! Allocation (and collision avoidance) lives in the registry crate; these
//! types only validate shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 12-digit identity number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityId(String);

impl IdentityId {
    pub const LEN: usize = 12;

    /// Wrap a raw string, validating shape.
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdFormatError> {
        let s = raw.into();
        let ok = s.len() == Self::LEN
            && s.bytes().all(|b| b.is_ascii_digit())
            && !s.starts_with('0');
        if ok {
            Ok(Self(s))
        } else {
            Err(IdFormatError::Identity(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tax identifier in `AAAAA9999A` format.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxId(String);

impl TaxId {
    pub const LEN: usize = 10;

    pub fn parse(raw: impl Into<String>) -> Result<Self, IdFormatError> {
        let s = raw.into();
        let b = s.as_bytes();
        let ok = b.len() == Self::LEN
            && b[..5].iter().all(|c| c.is_ascii_uppercase())
            && b[5..9].iter().all(|c| c.is_ascii_digit())
            && b[9].is_ascii_uppercase();
        if ok {
            Ok(Self(s))
        } else {
            Err(IdFormatError::Tax(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A structured business-entity identifier embedding a 2-char region code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub const LEN: usize = 15;

    pub fn parse(raw: impl Into<String>) -> Result<Self, IdFormatError> {
        let s = raw.into();
        let b = s.as_bytes();
        let ok = b.len() == Self::LEN
            && b[..2].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            && b[2..12].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            && b[12].is_ascii_digit()
            && b[12] != b'0'
            && b[13] == b'Z'
            && (b[14].is_ascii_uppercase() || b[14].is_ascii_digit());
        if ok {
            Ok(Self(s))
        } else {
            Err(IdFormatError::Entity(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The embedded 2-char region code.
    pub fn region_code(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A malformed identifier string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdFormatError {
    Identity(String),
    Tax(String),
    Entity(String),
}

impl fmt::Display for IdFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdFormatError::Identity(s) => write!(f, "malformed identity number: {s}"),
            IdFormatError::Tax(s) => write!(f, "malformed tax identifier: {s}"),
            IdFormatError::Entity(s) => write!(f, "malformed entity identifier: {s}"),
        }
    }
}

impl std::error::Error for IdFormatError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_id_accepts_valid() {
        assert!(IdentityId::parse("912345678901").is_ok());
    }

    #[test]
    fn identity_id_rejects_leading_zero_and_bad_length() {
        assert!(IdentityId::parse("012345678901").is_err());
        assert!(IdentityId::parse("12345").is_err());
        assert!(IdentityId::parse("91234567890a").is_err());
    }

    #[test]
    fn tax_id_shape() {
        assert!(TaxId::parse("ABCDE1234F").is_ok());
        assert!(TaxId::parse("ABCDE12345").is_err());
        assert!(TaxId::parse("abcde1234F").is_err());
    }

    #[test]
    fn entity_id_shape_and_region() {
        let id = EntityId::parse("27ABCDE1234F1Z5").unwrap();
        assert_eq!(id.region_code(), "27");
        assert!(EntityId::parse("27ABCDE1234F0Z5").is_err()); // zero entity digit
        assert!(EntityId::parse("27ABCDE1234F1Y5").is_err()); // missing Z
    }
}
