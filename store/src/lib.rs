//! Abstract storage traits for the praman issuance core.
//!
//! Every storage backend (in-memory, or a future embedded-database backend)
//! implements these traits. The registry and credential crates depend only
//! on the traits; uniqueness checks and atomic commit sequencing live above
//! this layer, behind the registry's issuance lock.

pub mod audit;
pub mod compliance;
pub mod credential;
pub mod entity;
pub mod error;
pub mod invoice;
pub mod profile;
pub mod tax;

pub use audit::{AuditRecord, AuditStore};
pub use compliance::{ComplianceRecord, ComplianceStore};
pub use credential::{CredentialRecord, CredentialStore};
pub use entity::{EntityRecord, EntityStore};
pub use error::StoreError;
pub use invoice::{InvoiceRecord, InvoiceStore, LineItem};
pub use profile::{ProfileRecord, ProfileStore};
pub use tax::{TaxRecord, TaxStore};
