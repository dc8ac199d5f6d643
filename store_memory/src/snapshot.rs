//! Bincode snapshot format for the in-memory store.

use praman_store::{
    AuditRecord, ComplianceRecord, CredentialRecord, EntityRecord, InvoiceRecord, ProfileRecord,
    StoreError, TaxRecord,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable snapshot of every table. Indices are rebuilt on restore.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub profiles: Vec<ProfileRecord>,
    pub tax_records: Vec<TaxRecord>,
    pub entities: Vec<EntityRecord>,
    pub invoices: Vec<InvoiceRecord>,
    pub compliance: Vec<ComplianceRecord>,
    pub credentials: Vec<CredentialRecord>,
    pub audit: Vec<AuditRecord>,
}

impl StoreSnapshot {
    /// Write the snapshot to disk (atomic: temp file + rename).
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let bytes =
            bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(|e| StoreError::Backend(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Read a snapshot from disk.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
