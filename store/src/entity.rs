//! Business entity storage trait.

use crate::StoreError;
use praman_types::{EntityId, EntityType, IdentityId, Timestamp};
use serde::{Deserialize, Serialize};

/// A persisted business entity with its owner links.
///
/// Owner links are stored in registration order; the first entry is the
/// primary owner whose contact channel was verified at registration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    pub address: Option<String>,
    pub region_code: String,
    /// Administratively set; excludes the entity from positive evaluation.
    pub suspended: bool,
    pub owners: Vec<IdentityId>,
    pub created_at: Timestamp,
}

pub trait EntityStore {
    fn get_entity(&self, id: &EntityId) -> Result<EntityRecord, StoreError>;
    fn put_entity(&self, record: &EntityRecord) -> Result<(), StoreError>;
    fn entity_exists(&self, id: &EntityId) -> Result<bool, StoreError>;
    fn iter_entities(&self) -> Result<Vec<EntityRecord>, StoreError>;
}
