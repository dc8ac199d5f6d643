//! The registry service — commit operations, lookups, audit trail.

use crate::allocator;
use crate::error::RegistryError;
use praman_challenge::ChallengeStore;
use praman_store::{
    AuditRecord, AuditStore, ComplianceRecord, ComplianceStore, EntityRecord, EntityStore,
    InvoiceRecord, InvoiceStore, LineItem, ProfileRecord, ProfileStore, TaxRecord, TaxStore,
};
use praman_types::{
    ChannelKey, ChannelType, CoreParams, EntityId, EntityType, IdentityId, InvoiceStatus,
    Timestamp, VerificationStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Everything the registry needs from a storage backend.
pub trait RegistryStore:
    ProfileStore + TaxStore + EntityStore + InvoiceStore + ComplianceStore + AuditStore
{
}

impl<T> RegistryStore for T where
    T: ProfileStore + TaxStore + EntityStore + InvoiceStore + ComplianceStore + AuditStore
{
}

/// Input for `create_identity`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewIdentity {
    pub name: String,
    pub channel_value: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Input for `register_entity`. `owners` is ordered; the first entry is
/// the primary owner whose channel must carry a fresh verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewEntity {
    pub name: String,
    pub entity_type: EntityType,
    pub address: Option<String>,
    pub region_code: String,
    pub owners: Vec<IdentityId>,
}

/// Input for `record_invoice`. Caller-supplied totals are deliberately
/// absent: totals are derived from the line items here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewInvoice {
    pub entity: EntityId,
    pub counterparty: EntityId,
    pub ref_number: String,
    pub date: Timestamp,
    pub line_items: Vec<LineItem>,
}

/// Aggregated view of an entity for dashboards and evaluation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: EntityId,
    pub name: String,
    pub suspended: bool,
    /// Most recently filed compliance score, if any records exist.
    pub current_compliance: Option<u8>,
    /// Mean of all filed scores, rounded down.
    pub compliance_average: Option<u8>,
    pub unpaid_invoices: usize,
}

/// The identity registry.
///
/// Mutations take the issuance lock for their full duration; identifier
/// allocation and invariant checks therefore never race, and no record is
/// written until every check has passed.
pub struct Registry<S> {
    store: Arc<S>,
    challenges: Arc<ChallengeStore>,
    params: CoreParams,
    issuance_lock: Mutex<()>,
}

impl<S: RegistryStore> Registry<S> {
    pub fn new(store: Arc<S>, challenges: Arc<ChallengeStore>, params: CoreParams) -> Self {
        Self {
            store,
            challenges,
            params,
            issuance_lock: Mutex::new(()),
        }
    }

    pub fn challenges(&self) -> &Arc<ChallengeStore> {
        &self.challenges
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ── Identity ─────────────────────────────────────────────────────────

    /// Create an identity profile after a verified challenge on its phone
    /// channel. The challenge is spent here; a failure after this point
    /// requires a fresh challenge.
    pub fn create_identity(
        &self,
        req: &NewIdentity,
        now: Timestamp,
    ) -> Result<ProfileRecord, RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();
        let channel = ChannelKey::new(ChannelType::Phone, req.channel_value.clone());

        if self.store.get_profile_by_channel(&channel)?.is_some() {
            return Err(RegistryError::DuplicateChannel);
        }
        self.challenges
            .spend(&channel, now)
            .map_err(|_| RegistryError::UnverifiedChannel)?;

        let id = allocator::allocate_identity_id(self.store.as_ref())?;
        let record = ProfileRecord {
            id: id.clone(),
            name: req.name.clone(),
            channel,
            email: req.email.clone(),
            address: req.address.clone(),
            status: VerificationStatus::Verified,
            blacklisted: false,
            created_at: now,
        };
        self.store.put_profile(&record)?;
        self.audit("CREATE_IDENTITY", "IdentityProfile", id.as_str(), now)?;
        tracing::info!(identity = %id, "identity profile created");
        Ok(record)
    }

    pub fn lookup_identity(&self, id: &IdentityId) -> Result<ProfileRecord, RegistryError> {
        self.store
            .get_profile(id)
            .map_err(|_| RegistryError::NotFound(id.to_string()))
    }

    /// Search profiles by name substring (case-insensitive) or identifier
    /// prefix. With `linkable_only`, blacklisted profiles are excluded.
    /// Results are capped and ordered by identifier for stable paging.
    pub fn search_identity(
        &self,
        fragment: &str,
        linkable_only: bool,
    ) -> Result<Vec<ProfileRecord>, RegistryError> {
        let needle = fragment.to_lowercase();
        let mut hits: Vec<ProfileRecord> = self
            .store
            .iter_profiles()?
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle) || p.id.as_str().starts_with(fragment)
            })
            .filter(|p| !(linkable_only && p.blacklisted))
            .collect();
        hits.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        hits.truncate(self.params.search_limit);
        Ok(hits)
    }

    /// Administrative blacklist toggle. Never called by issuance flows.
    pub fn set_blacklist(
        &self,
        id: &IdentityId,
        flag: bool,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();
        let mut record = self
            .store
            .get_profile(id)
            .map_err(|_| RegistryError::NotFound(id.to_string()))?;
        record.blacklisted = flag;
        self.store.put_profile(&record)?;
        let action = if flag { "BLACKLIST" } else { "UNBLACKLIST" };
        self.audit(action, "IdentityProfile", id.as_str(), now)?;
        Ok(())
    }

    // ── Tax identifiers ──────────────────────────────────────────────────

    /// Issue the tax identifier for a profile. At most one per profile;
    /// requires a fresh verified challenge on the profile's own channel.
    pub fn issue_tax_identifier(
        &self,
        identity: &IdentityId,
        now: Timestamp,
    ) -> Result<TaxRecord, RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();
        let profile = self
            .store
            .get_profile(identity)
            .map_err(|_| RegistryError::NotFound(identity.to_string()))?;
        if profile.blacklisted {
            return Err(RegistryError::Blacklisted(identity.to_string()));
        }
        if self.store.get_tax_by_identity(identity)?.is_some() {
            return Err(RegistryError::AlreadyLinked(identity.to_string()));
        }
        self.challenges
            .spend(&profile.channel, now)
            .map_err(|_| RegistryError::UnverifiedChannel)?;

        let id = allocator::allocate_tax_id(self.store.as_ref())?;
        let record = TaxRecord {
            id: id.clone(),
            identity: identity.clone(),
            created_at: now,
        };
        self.store.put_tax(&record)?;
        self.audit("ISSUE_TAX_ID", "TaxIdentifier", id.as_str(), now)?;
        tracing::info!(
            tax = %praman_utils::mask_identifier(id.as_str()),
            identity = %identity,
            "tax identifier issued"
        );
        Ok(record)
    }

    // ── Entities ─────────────────────────────────────────────────────────

    /// Register a business entity. The owner set is assembled client-side,
    /// so cardinality, duplicates, existence, and blacklist are all checked
    /// here at commit time, before any write.
    pub fn register_entity(
        &self,
        req: &NewEntity,
        now: Timestamp,
    ) -> Result<EntityRecord, RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();

        if req.owners.is_empty() {
            return Err(RegistryError::EmptyOwnerSet);
        }
        if req.entity_type.requires_single_owner() && req.owners.len() != 1 {
            return Err(RegistryError::OwnerCardinalityViolation(req.owners.len()));
        }
        let mut seen = HashSet::new();
        for owner in &req.owners {
            if !seen.insert(owner.as_str()) {
                return Err(RegistryError::DuplicateOwner(owner.to_string()));
            }
        }
        if !is_valid_region_code(&req.region_code) {
            return Err(RegistryError::InvalidRegionCode(req.region_code.clone()));
        }

        let mut primary_channel = None;
        for owner in &req.owners {
            let profile = self
                .store
                .get_profile(owner)
                .map_err(|_| RegistryError::UnknownOwner(owner.to_string()))?;
            if profile.blacklisted {
                return Err(RegistryError::OwnerBlacklisted(owner.to_string()));
            }
            primary_channel.get_or_insert(profile.channel);
        }
        match primary_channel {
            Some(channel) => self
                .challenges
                .spend(&channel, now)
                .map_err(|_| RegistryError::UnverifiedChannel)?,
            None => return Err(RegistryError::EmptyOwnerSet),
        }

        let id = allocator::allocate_entity_id(self.store.as_ref(), &req.region_code)?;
        let record = EntityRecord {
            id: id.clone(),
            name: req.name.clone(),
            entity_type: req.entity_type,
            address: req.address.clone(),
            region_code: req.region_code.clone(),
            suspended: false,
            owners: req.owners.clone(),
            created_at: now,
        };
        self.store.put_entity(&record)?;
        self.audit("REGISTER_ENTITY", "BusinessEntity", id.as_str(), now)?;
        tracing::info!(entity = %id, owners = record.owners.len(), "entity registered");
        Ok(record)
    }

    pub fn lookup_entity(&self, id: &EntityId) -> Result<EntityRecord, RegistryError> {
        self.store
            .get_entity(id)
            .map_err(|_| RegistryError::NotFound(id.to_string()))
    }

    pub fn search_entity(&self, fragment: &str) -> Result<Vec<EntityRecord>, RegistryError> {
        let needle = fragment.to_lowercase();
        let mut hits: Vec<EntityRecord> = self
            .store
            .iter_entities()?
            .into_iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle) || e.id.as_str().starts_with(fragment)
            })
            .collect();
        hits.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        hits.truncate(self.params.search_limit);
        Ok(hits)
    }

    /// Administrative suspension toggle.
    pub fn set_entity_suspended(
        &self,
        id: &EntityId,
        flag: bool,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();
        let mut record = self
            .store
            .get_entity(id)
            .map_err(|_| RegistryError::NotFound(id.to_string()))?;
        record.suspended = flag;
        self.store.put_entity(&record)?;
        let action = if flag { "SUSPEND_ENTITY" } else { "UNSUSPEND_ENTITY" };
        self.audit(action, "BusinessEntity", id.as_str(), now)?;
        Ok(())
    }

    /// Aggregate an entity's current standing for dashboards/evaluation.
    pub fn entity_summary(&self, id: &EntityId) -> Result<EntitySummary, RegistryError> {
        let entity = self.lookup_entity(id)?;
        let compliance = self.store.list_compliance_by_entity(id)?;
        let current_compliance = compliance.first().map(|r| r.score);
        let compliance_average = if compliance.is_empty() {
            None
        } else {
            let sum: u32 = compliance.iter().map(|r| r.score as u32).sum();
            Some((sum / compliance.len() as u32) as u8)
        };
        let unpaid_invoices = self
            .store
            .list_invoices_by_entity(id)?
            .iter()
            .filter(|i| i.status == InvoiceStatus::Unpaid)
            .count();
        Ok(EntitySummary {
            id: entity.id,
            name: entity.name,
            suspended: entity.suspended,
            current_compliance,
            compliance_average,
            unpaid_invoices,
        })
    }

    // ── Invoices ─────────────────────────────────────────────────────────

    /// Record an invoice. Totals are recomputed from the line items;
    /// anything the caller supplied for them is ignored by construction.
    pub fn record_invoice(
        &self,
        req: &NewInvoice,
        now: Timestamp,
    ) -> Result<InvoiceRecord, RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();

        if req.entity == req.counterparty {
            return Err(RegistryError::SelfDealing);
        }
        self.store
            .get_entity(&req.entity)
            .map_err(|_| RegistryError::NotFound(req.entity.to_string()))?;
        if self
            .store
            .get_invoice_by_ref(&req.entity, &req.ref_number)?
            .is_some()
        {
            return Err(RegistryError::DuplicateReference(req.ref_number.clone()));
        }
        validate_line_items(&req.line_items)?;
        let (taxable_minor, tax_minor) = compute_totals(&req.line_items)?;

        let record = InvoiceRecord {
            id: allocator::allocate_invoice_id(),
            entity: req.entity.clone(),
            counterparty: req.counterparty.clone(),
            ref_number: req.ref_number.clone(),
            date: req.date,
            line_items: req.line_items.clone(),
            taxable_minor,
            tax_minor,
            grand_total_minor: taxable_minor + tax_minor,
            status: InvoiceStatus::Unpaid,
            created_at: now,
        };
        self.store.put_invoice(&record)?;
        self.audit("RECORD_INVOICE", "Invoice", &record.id, now)?;
        Ok(record)
    }

    /// Set an invoice's status. Any transition within the enumerated set
    /// is permitted; every transition lands in the audit trail.
    pub fn update_invoice_status(
        &self,
        invoice_id: &str,
        status: InvoiceStatus,
        now: Timestamp,
    ) -> Result<InvoiceRecord, RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();
        let mut record = self
            .store
            .get_invoice(invoice_id)
            .map_err(|_| RegistryError::NotFound(invoice_id.to_string()))?;
        let previous = record.status;
        record.status = status;
        self.store.put_invoice(&record)?;
        self.audit(
            &format!("INVOICE_STATUS_{previous}_TO_{status}"),
            "Invoice",
            invoice_id,
            now,
        )?;
        Ok(record)
    }

    pub fn list_invoices(&self, entity: &EntityId) -> Result<Vec<InvoiceRecord>, RegistryError> {
        let mut invoices = self.store.list_invoices_by_entity(entity)?;
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    // ── Compliance ───────────────────────────────────────────────────────

    /// Append a compliance record. History is never overwritten.
    pub fn file_compliance_record(
        &self,
        entity: &EntityId,
        score: u32,
        now: Timestamp,
    ) -> Result<ComplianceRecord, RegistryError> {
        let _guard = self.issuance_lock.lock().unwrap();
        if score > 100 {
            return Err(RegistryError::ScoreOutOfRange(score));
        }
        self.store
            .get_entity(entity)
            .map_err(|_| RegistryError::NotFound(entity.to_string()))?;
        let record = ComplianceRecord {
            entity: entity.clone(),
            filed_at: now,
            score: score as u8,
        };
        self.store.append_compliance(&record)?;
        self.audit("FILE_COMPLIANCE", "ComplianceRecord", entity.as_str(), now)?;
        Ok(record)
    }

    pub fn compliance_history(
        &self,
        entity: &EntityId,
    ) -> Result<Vec<ComplianceRecord>, RegistryError> {
        Ok(self.store.list_compliance_by_entity(entity)?)
    }

    // ── Audit ────────────────────────────────────────────────────────────

    fn audit(
        &self,
        action: &str,
        entity_kind: &str,
        entity_ref: &str,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        self.store.append_audit(&AuditRecord {
            actor: "REGISTRY".into(),
            action: action.into(),
            entity_kind: entity_kind.into(),
            entity_ref: entity_ref.into(),
            at: now,
        })?;
        Ok(())
    }

    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditRecord>, RegistryError> {
        Ok(self.store.recent_audit(limit)?)
    }
}

fn is_valid_region_code(code: &str) -> bool {
    code.len() == 2
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn validate_line_items(items: &[LineItem]) -> Result<(), RegistryError> {
    if items.is_empty() {
        return Err(RegistryError::InvalidLineItem(
            "invoice has no line items".into(),
        ));
    }
    for (i, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(RegistryError::InvalidLineItem(format!(
                "line {i} has no description"
            )));
        }
        if item.unit_price_minor <= 0 {
            return Err(RegistryError::InvalidLineItem(format!(
                "line {i} has non-positive unit price"
            )));
        }
        if item.quantity == 0 {
            return Err(RegistryError::InvalidLineItem(format!(
                "line {i} has zero quantity"
            )));
        }
    }
    Ok(())
}

/// Derive (taxable, tax) from the line items. Tax rounds down per line.
/// Amounts are caller-supplied; anything that overflows i64 is rejected.
fn compute_totals(items: &[LineItem]) -> Result<(i64, i64), RegistryError> {
    let mut taxable = 0i64;
    let mut tax = 0i64;
    for (i, item) in items.iter().enumerate() {
        let line = (item.quantity as i64)
            .checked_mul(item.unit_price_minor)
            .ok_or_else(|| overflow(i))?;
        taxable = taxable.checked_add(line).ok_or_else(|| overflow(i))?;
        let line_tax = line
            .checked_mul(item.tax_rate_bps as i64)
            .ok_or_else(|| overflow(i))?
            / 10_000;
        tax = tax.checked_add(line_tax).ok_or_else(|| overflow(i))?;
    }
    if taxable.checked_add(tax).is_none() {
        return Err(overflow(items.len() - 1));
    }
    Ok((taxable, tax))
}

fn overflow(line: usize) -> RegistryError {
    RegistryError::InvalidLineItem(format!("line {line} amount overflows"))
}
