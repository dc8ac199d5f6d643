//! Identity profile storage trait.

use crate::StoreError;
use praman_types::{ChannelKey, IdentityId, Timestamp, VerificationStatus};
use serde::{Deserialize, Serialize};

/// A persisted identity profile.
///
/// Immutable once created except for the blacklist flag (administrative)
/// and verification-status transitions. Never deleted; identity numbers
/// are never reused.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: IdentityId,
    pub name: String,
    /// The contact channel the profile was verified against (phone).
    pub channel: ChannelKey,
    pub email: Option<String>,
    pub address: Option<String>,
    pub status: VerificationStatus,
    /// Administratively set; never touched by issuance flows.
    pub blacklisted: bool,
    pub created_at: Timestamp,
}

/// Trait for identity profile storage operations.
pub trait ProfileStore {
    fn get_profile(&self, id: &IdentityId) -> Result<ProfileRecord, StoreError>;
    fn get_profile_by_channel(&self, channel: &ChannelKey)
        -> Result<Option<ProfileRecord>, StoreError>;
    fn put_profile(&self, record: &ProfileRecord) -> Result<(), StoreError>;
    fn profile_exists(&self, id: &IdentityId) -> Result<bool, StoreError>;
    fn profile_count(&self) -> Result<u64, StoreError>;
    fn iter_profiles(&self) -> Result<Vec<ProfileRecord>, StoreError>;
}
