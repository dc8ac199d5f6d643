//! Tax identifier storage trait.

use crate::StoreError;
use praman_types::{IdentityId, TaxId, Timestamp};
use serde::{Deserialize, Serialize};

/// A persisted tax identifier, linked one-to-one to an identity profile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaxRecord {
    pub id: TaxId,
    pub identity: IdentityId,
    pub created_at: Timestamp,
}

pub trait TaxStore {
    /// The tax identifier linked to a profile, if any (at most one).
    fn get_tax_by_identity(&self, identity: &IdentityId) -> Result<Option<TaxRecord>, StoreError>;
    fn put_tax(&self, record: &TaxRecord) -> Result<(), StoreError>;
    fn tax_exists(&self, id: &TaxId) -> Result<bool, StoreError>;
}
