//! In-memory storage backend for the praman issuance core.
//!
//! Implements every trait from `praman-store` with mutex-guarded maps.
//! Durability is provided by bincode snapshots: the daemon restores one at
//! startup and writes one on shutdown. Indices (channel, reference number)
//! are rebuilt from the records on restore rather than persisted.

pub mod snapshot;
pub mod store;

pub use snapshot::StoreSnapshot;
pub use store::MemoryStore;
