//! Consumer credential storage trait.

use crate::StoreError;
use praman_types::Timestamp;
use serde::{Deserialize, Serialize};

/// A persisted consumer credential.
///
/// Only a digest of the secret is stored; the plaintext secret is returned
/// once at mint time and never again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Case-normalized consumer name (duplicate-check key).
    pub consumer: String,
    pub api_key: String,
    /// Hex SHA-256 digest of the plaintext secret.
    pub secret_digest: String,
    pub created_at: Timestamp,
    pub revoked: bool,
}

pub trait CredentialStore {
    fn get_credential_by_key(&self, api_key: &str) -> Result<Option<CredentialRecord>, StoreError>;
    /// The active (non-revoked) credential for a consumer name, if any.
    fn get_active_credential(&self, consumer: &str)
        -> Result<Option<CredentialRecord>, StoreError>;
    fn put_credential(&self, record: &CredentialRecord) -> Result<(), StoreError>;
}
