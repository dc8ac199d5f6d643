//! Status enums shared across the registry and evaluation crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verification status of an identity profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Unverified,
    Verified,
}

/// Legal form of a business entity.
///
/// A sole proprietorship must have exactly one owner; the other forms
/// allow any non-empty owner set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    SoleProprietor,
    Partnership,
    PrivateLimited,
    PublicLimited,
}

impl EntityType {
    pub fn requires_single_owner(&self) -> bool {
        matches!(self, EntityType::SoleProprietor)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::SoleProprietor => "SOLE_PROPRIETOR",
            EntityType::Partnership => "PARTNERSHIP",
            EntityType::PrivateLimited => "PRIVATE_LIMITED",
            EntityType::PublicLimited => "PUBLIC_LIMITED",
        };
        write!(f, "{s}")
    }
}

/// Payment status of an invoice. Transitions are free-form but always
/// logged to the audit trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Defaulted,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Unpaid => "UNPAID",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Defaulted => "DEFAULTED",
        };
        write!(f, "{s}")
    }
}
