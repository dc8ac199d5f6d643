//! Assembles evaluation inputs from registry state.
//!
//! The scoring itself is pure (`praman-evaluation`); this module does the
//! record fetching and ratio computation on behalf of the evaluation
//! endpoint.

use crate::error::RpcError;
use praman_evaluation::score::{EntityFacts, OwnerFacts, TransactionFacts};
use praman_evaluation::EvaluationInput;
use praman_registry::{Registry, RegistryStore};
use praman_types::{EntityId, IdentityId, InvoiceStatus, TaxId, Timestamp, VerificationStatus};
use serde::Deserialize;

const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_YEAR: u64 = 365 * SECS_PER_DAY;

/// Body of the signed evaluation request.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub identity_id: String,
    /// When supplied, checked against the identity's actual linkage; a
    /// mismatch feeds the owner score.
    pub tax_id: Option<String>,
    pub entity_id: Option<String>,
}

/// Fetch everything the scoring functions need for one subject.
pub fn assemble_input<S: RegistryStore>(
    registry: &Registry<S>,
    req: &EvaluateRequest,
    now: Timestamp,
) -> Result<EvaluationInput, RpcError> {
    let identity = IdentityId::parse(req.identity_id.clone())
        .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
    let profile = registry.lookup_identity(&identity)?;

    // The subject must re-verify their channel before each evaluation;
    // the challenge spent at issuance does not carry over.
    if !registry.challenges().has_verified(&profile.channel, now) {
        return Err(RpcError::InvalidRequest(
            "channel verification is required before evaluation".into(),
        ));
    }

    let linked_tax = registry
        .store()
        .get_tax_by_identity(&identity)
        .map_err(praman_registry::RegistryError::from)?;

    let linkage_mismatch = match &req.tax_id {
        Some(raw) => {
            let claimed =
                TaxId::parse(raw.clone()).map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
            linked_tax.as_ref().map(|t| &t.id) != Some(&claimed)
        }
        None => false,
    };

    let owner = OwnerFacts {
        identity_verified: profile.status == VerificationStatus::Verified,
        tax_linked: linked_tax.is_some(),
        blacklisted: profile.blacklisted,
        defaults_count: 0,
        linkage_mismatch,
    };

    let (entity, transactions) = match &req.entity_id {
        None => (None, None),
        Some(raw) => {
            let id = EntityId::parse(raw.clone())
                .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
            let record = registry.lookup_entity(&id)?;

            let history = registry.compliance_history(&id)?;
            let compliance_avg = if history.is_empty() {
                0
            } else {
                history.iter().map(|r| r.score as u32).sum::<u32>() / history.len() as u32
            };
            let age_years = (now.as_secs().saturating_sub(record.created_at.as_secs())
                / SECS_PER_YEAR) as u32;

            let invoices = registry.list_invoices(&id)?;
            let transactions = if invoices.is_empty() {
                None
            } else {
                let total = invoices.len() as u32;
                let paid = invoices
                    .iter()
                    .filter(|i| i.status == InvoiceStatus::Paid)
                    .count() as f64;
                let defaulted = invoices
                    .iter()
                    .filter(|i| i.status == InvoiceStatus::Defaulted)
                    .count() as f64;
                // Settled invoices contribute zero delay; open ones count
                // the days since their invoice date.
                let delay_days: f64 = invoices
                    .iter()
                    .map(|i| match i.status {
                        InvoiceStatus::Paid => 0.0,
                        InvoiceStatus::Unpaid | InvoiceStatus::Defaulted => {
                            now.as_secs().saturating_sub(i.date.as_secs()) as f64
                                / SECS_PER_DAY as f64
                        }
                    })
                    .sum();
                Some(TransactionFacts {
                    total_invoices: total,
                    paid_ratio: paid / total as f64,
                    default_ratio: defaulted / total as f64,
                    avg_delay_days: delay_days / total as f64,
                })
            };

            (
                Some(EntityFacts {
                    compliance_avg,
                    age_years,
                    suspended: record.suspended,
                }),
                transactions,
            )
        }
    };

    Ok(EvaluationInput {
        owner,
        entity,
        transactions,
    })
}
