//! Mutex-guarded map storage implementing the `praman-store` traits.

use crate::snapshot::StoreSnapshot;
use praman_store::{
    AuditRecord, AuditStore, ComplianceRecord, ComplianceStore, CredentialRecord, CredentialStore,
    EntityRecord, EntityStore, InvoiceRecord, InvoiceStore, ProfileRecord, ProfileStore, StoreError,
    TaxRecord, TaxStore,
};
use praman_types::{ChannelKey, EntityId, IdentityId, TaxId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Thread-safe in-memory store.
///
/// Each table sits behind its own mutex; cross-table atomicity is the
/// registry's responsibility (records are staged and only written after
/// every invariant check has passed, under the registry issuance lock).
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, ProfileRecord>>,
    channel_index: Mutex<HashMap<ChannelKey, String>>,
    tax_records: Mutex<HashMap<String, TaxRecord>>,
    tax_by_identity: Mutex<HashMap<String, String>>,
    entities: Mutex<HashMap<String, EntityRecord>>,
    invoices: Mutex<HashMap<String, InvoiceRecord>>,
    invoice_ref_index: Mutex<HashMap<(String, String), String>>,
    compliance: Mutex<Vec<ComplianceRecord>>,
    credentials: Mutex<HashMap<String, CredentialRecord>>,
    audit: Mutex<Vec<AuditRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            channel_index: Mutex::new(HashMap::new()),
            tax_records: Mutex::new(HashMap::new()),
            tax_by_identity: Mutex::new(HashMap::new()),
            entities: Mutex::new(HashMap::new()),
            invoices: Mutex::new(HashMap::new()),
            invoice_ref_index: Mutex::new(HashMap::new()),
            compliance: Mutex::new(Vec::new()),
            credentials: Mutex::new(HashMap::new()),
            audit: Mutex::new(Vec::new()),
        }
    }

    /// Capture the full store contents for persistence.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            profiles: self.profiles.lock().unwrap().values().cloned().collect(),
            tax_records: self.tax_records.lock().unwrap().values().cloned().collect(),
            entities: self.entities.lock().unwrap().values().cloned().collect(),
            invoices: self.invoices.lock().unwrap().values().cloned().collect(),
            compliance: self.compliance.lock().unwrap().clone(),
            credentials: self.credentials.lock().unwrap().values().cloned().collect(),
            audit: self.audit.lock().unwrap().clone(),
        }
    }

    /// Rebuild a store (including indices) from a snapshot.
    pub fn restore(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        {
            let mut profiles = store.profiles.lock().unwrap();
            let mut channel_index = store.channel_index.lock().unwrap();
            for p in snapshot.profiles {
                channel_index.insert(p.channel.clone(), p.id.as_str().to_string());
                profiles.insert(p.id.as_str().to_string(), p);
            }
        }
        {
            let mut tax_records = store.tax_records.lock().unwrap();
            let mut tax_by_identity = store.tax_by_identity.lock().unwrap();
            for t in snapshot.tax_records {
                tax_by_identity.insert(t.identity.as_str().to_string(), t.id.as_str().to_string());
                tax_records.insert(t.id.as_str().to_string(), t);
            }
        }
        {
            let mut entities = store.entities.lock().unwrap();
            for e in snapshot.entities {
                entities.insert(e.id.as_str().to_string(), e);
            }
        }
        {
            let mut invoices = store.invoices.lock().unwrap();
            let mut ref_index = store.invoice_ref_index.lock().unwrap();
            for i in snapshot.invoices {
                ref_index.insert(
                    (i.entity.as_str().to_string(), i.ref_number.clone()),
                    i.id.clone(),
                );
                invoices.insert(i.id.clone(), i);
            }
        }
        *store.compliance.lock().unwrap() = snapshot.compliance;
        {
            let mut credentials = store.credentials.lock().unwrap();
            for c in snapshot.credentials {
                credentials.insert(c.api_key.clone(), c);
            }
        }
        *store.audit.lock().unwrap() = snapshot.audit;
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for MemoryStore {
    fn get_profile(&self, id: &IdentityId) -> Result<ProfileRecord, StoreError> {
        self.profiles
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn get_profile_by_channel(
        &self,
        channel: &ChannelKey,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        let index = self.channel_index.lock().unwrap();
        match index.get(channel) {
            Some(id) => Ok(self.profiles.lock().unwrap().get(id).cloned()),
            None => Ok(None),
        }
    }

    fn put_profile(&self, record: &ProfileRecord) -> Result<(), StoreError> {
        self.channel_index
            .lock()
            .unwrap()
            .insert(record.channel.clone(), record.id.as_str().to_string());
        self.profiles
            .lock()
            .unwrap()
            .insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    fn profile_exists(&self, id: &IdentityId) -> Result<bool, StoreError> {
        Ok(self.profiles.lock().unwrap().contains_key(id.as_str()))
    }

    fn profile_count(&self) -> Result<u64, StoreError> {
        Ok(self.profiles.lock().unwrap().len() as u64)
    }

    fn iter_profiles(&self) -> Result<Vec<ProfileRecord>, StoreError> {
        Ok(self.profiles.lock().unwrap().values().cloned().collect())
    }
}

impl TaxStore for MemoryStore {
    fn get_tax_by_identity(&self, identity: &IdentityId) -> Result<Option<TaxRecord>, StoreError> {
        let index = self.tax_by_identity.lock().unwrap();
        match index.get(identity.as_str()) {
            Some(id) => Ok(self.tax_records.lock().unwrap().get(id).cloned()),
            None => Ok(None),
        }
    }

    fn put_tax(&self, record: &TaxRecord) -> Result<(), StoreError> {
        self.tax_by_identity.lock().unwrap().insert(
            record.identity.as_str().to_string(),
            record.id.as_str().to_string(),
        );
        self.tax_records
            .lock()
            .unwrap()
            .insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    fn tax_exists(&self, id: &TaxId) -> Result<bool, StoreError> {
        Ok(self.tax_records.lock().unwrap().contains_key(id.as_str()))
    }
}

impl EntityStore for MemoryStore {
    fn get_entity(&self, id: &EntityId) -> Result<EntityRecord, StoreError> {
        self.entities
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn put_entity(&self, record: &EntityRecord) -> Result<(), StoreError> {
        self.entities
            .lock()
            .unwrap()
            .insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    fn entity_exists(&self, id: &EntityId) -> Result<bool, StoreError> {
        Ok(self.entities.lock().unwrap().contains_key(id.as_str()))
    }

    fn iter_entities(&self) -> Result<Vec<EntityRecord>, StoreError> {
        Ok(self.entities.lock().unwrap().values().cloned().collect())
    }
}

impl InvoiceStore for MemoryStore {
    fn get_invoice(&self, id: &str) -> Result<InvoiceRecord, StoreError> {
        self.invoices
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn get_invoice_by_ref(
        &self,
        entity: &EntityId,
        ref_number: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        let index = self.invoice_ref_index.lock().unwrap();
        match index.get(&(entity.as_str().to_string(), ref_number.to_string())) {
            Some(id) => Ok(self.invoices.lock().unwrap().get(id).cloned()),
            None => Ok(None),
        }
    }

    fn put_invoice(&self, record: &InvoiceRecord) -> Result<(), StoreError> {
        self.invoice_ref_index.lock().unwrap().insert(
            (record.entity.as_str().to_string(), record.ref_number.clone()),
            record.id.clone(),
        );
        self.invoices
            .lock()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn list_invoices_by_entity(&self, entity: &EntityId) -> Result<Vec<InvoiceRecord>, StoreError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .values()
            .filter(|i| &i.entity == entity)
            .cloned()
            .collect())
    }
}

impl ComplianceStore for MemoryStore {
    fn append_compliance(&self, record: &ComplianceRecord) -> Result<(), StoreError> {
        self.compliance.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn list_compliance_by_entity(
        &self,
        entity: &EntityId,
    ) -> Result<Vec<ComplianceRecord>, StoreError> {
        let mut records: Vec<ComplianceRecord> = self
            .compliance
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.entity == entity)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.filed_at.cmp(&a.filed_at));
        Ok(records)
    }
}

impl CredentialStore for MemoryStore {
    fn get_credential_by_key(&self, api_key: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.credentials.lock().unwrap().get(api_key).cloned())
    }

    fn get_active_credential(
        &self,
        consumer: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .values()
            .find(|c| c.consumer == consumer && !c.revoked)
            .cloned())
    }

    fn put_credential(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        self.credentials
            .lock()
            .unwrap()
            .insert(record.api_key.clone(), record.clone());
        Ok(())
    }
}

impl AuditStore for MemoryStore {
    fn append_audit(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.audit.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn recent_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError> {
        let audit = self.audit.lock().unwrap();
        Ok(audit.iter().rev().take(limit).cloned().collect())
    }
}
