//! Compliance record storage trait.

use crate::StoreError;
use praman_types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// One filed compliance record. Append-only; an entity's current standing
/// is its most recently filed record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub entity: EntityId,
    pub filed_at: Timestamp,
    /// Score in [0, 100].
    pub score: u8,
}

pub trait ComplianceStore {
    fn append_compliance(&self, record: &ComplianceRecord) -> Result<(), StoreError>;
    /// All records for an entity, most recently filed first.
    fn list_compliance_by_entity(
        &self,
        entity: &EntityId,
    ) -> Result<Vec<ComplianceRecord>, StoreError>;
}
