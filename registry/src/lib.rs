//! Identity registry — unique identifier allocation and record storage for
//! identity profiles, tax identifiers, business entities, invoices, and
//! compliance records, enforcing the cross-entity invariants.
//!
//! All mutations run under a single issuance lock: invariants are checked
//! and identifiers allocated before any record is written, so a failed
//! commit leaves no partial state behind.

pub mod allocator;
pub mod error;
pub mod registry;

pub use error::RegistryError;
pub use registry::{
    EntitySummary, NewEntity, NewIdentity, NewInvoice, Registry, RegistryStore,
};
