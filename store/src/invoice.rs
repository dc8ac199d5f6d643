//! Invoice storage trait.

use crate::StoreError;
use praman_types::{EntityId, InvoiceStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// One line of an invoice. Amounts are integer minor currency units;
/// tax rates are basis points (1800 = 18%).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub classification_code: Option<String>,
    pub quantity: u32,
    pub unit_price_minor: i64,
    pub tax_rate_bps: u32,
}

/// A persisted invoice. Totals are derived server-side from the line
/// items at record time; caller-supplied totals are never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Internal invoice id (not the caller-supplied reference number).
    pub id: String,
    pub entity: EntityId,
    pub counterparty: EntityId,
    /// Caller-supplied reference, unique per issuing entity.
    pub ref_number: String,
    pub date: Timestamp,
    pub line_items: Vec<LineItem>,
    pub taxable_minor: i64,
    pub tax_minor: i64,
    pub grand_total_minor: i64,
    pub status: InvoiceStatus,
    pub created_at: Timestamp,
}

pub trait InvoiceStore {
    fn get_invoice(&self, id: &str) -> Result<InvoiceRecord, StoreError>;
    /// Look up by (issuing entity, reference number) — the per-entity
    /// uniqueness key.
    fn get_invoice_by_ref(
        &self,
        entity: &EntityId,
        ref_number: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError>;
    fn put_invoice(&self, record: &InvoiceRecord) -> Result<(), StoreError>;
    fn list_invoices_by_entity(&self, entity: &EntityId) -> Result<Vec<InvoiceRecord>, StoreError>;
}
