//! Audit trail storage trait.

use crate::StoreError;
use praman_types::Timestamp;
use serde::{Deserialize, Serialize};

/// One audit entry. Every successful registry mutation (including every
/// invoice status transition) appends one of these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub actor: String,
    pub action: String,
    pub entity_kind: String,
    pub entity_ref: String,
    pub at: Timestamp,
}

pub trait AuditStore {
    fn append_audit(&self, record: &AuditRecord) -> Result<(), StoreError>;
    /// The most recent `limit` entries, newest first.
    fn recent_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError>;
}
