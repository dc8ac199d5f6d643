//! The composite evaluation report returned to external consumers.

use crate::score::{
    composite_score, entity_score, owner_score, transaction_score, EntityFacts, OwnerFacts,
    TransactionFacts, NO_ENTITY_SCORE, NO_HISTORY_SCORE,
};
use serde::{Deserialize, Serialize};

/// Composite score below this fails the overall verification decision.
const MIN_PASSING_SCORE: u32 = 350;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    HighRisk,
    MediumRisk,
    LowRisk,
    Excellent,
}

impl RiskCategory {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=300 => RiskCategory::HighRisk,
            301..=600 => RiskCategory::MediumRisk,
            601..=800 => RiskCategory::LowRisk,
            _ => RiskCategory::Excellent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Approve,
    Reject,
}

/// Everything `evaluate` needs, assembled by the caller from registry
/// records. `entity` is `None` when the subject has no registered entity;
/// `transactions` is only meaningful when an entity exists.
#[derive(Clone, Debug, Default)]
pub struct EvaluationInput {
    pub owner: OwnerFacts,
    pub entity: Option<EntityFacts>,
    pub transactions: Option<TransactionFacts>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub verified: bool,
    pub composite_score: u32,
    pub risk_category: RiskCategory,
    pub recommendation: Recommendation,
    pub owner_score: u32,
    pub entity_score: u32,
    pub transaction_score: u32,
    /// Failure reasons, empty when `verified` is true.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reasons: Vec<String>,
}

/// Produce the full evaluation report from pre-fetched facts.
///
/// Blacklisting and suspension force a reject regardless of the scores, as
/// does a composite below the passing threshold.
pub fn evaluate(input: &EvaluationInput) -> EvaluationReport {
    let owner = owner_score(&input.owner);
    let entity = input.entity.as_ref().map_or(NO_ENTITY_SCORE, entity_score);
    let transaction = input
        .transactions
        .as_ref()
        .map_or(NO_HISTORY_SCORE, transaction_score);
    let composite = composite_score(owner, entity, transaction);

    let risk_category = RiskCategory::from_score(composite);
    let mut recommendation = match risk_category {
        RiskCategory::HighRisk | RiskCategory::MediumRisk => Recommendation::Reject,
        RiskCategory::LowRisk | RiskCategory::Excellent => Recommendation::Approve,
    };

    let mut reasons = Vec::new();
    if input.owner.blacklisted {
        reasons.push("OWNER_BLACKLISTED".to_string());
    }
    if input.entity.is_some_and(|e| e.suspended) {
        reasons.push("ENTITY_SUSPENDED".to_string());
    }
    if composite < MIN_PASSING_SCORE {
        reasons.push("LOW_COMPOSITE_SCORE".to_string());
    }
    let verified = reasons.is_empty();
    if !verified {
        recommendation = Recommendation::Reject;
    }

    EvaluationReport {
        verified,
        composite_score: composite,
        risk_category,
        recommendation,
        owner_score: owner,
        entity_score: entity,
        transaction_score: transaction,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_input() -> EvaluationInput {
        EvaluationInput {
            owner: OwnerFacts {
                identity_verified: true,
                tax_linked: true,
                ..Default::default()
            },
            entity: Some(EntityFacts {
                compliance_avg: 90,
                age_years: 10,
                suspended: false,
            }),
            transactions: Some(TransactionFacts {
                total_invoices: 10,
                paid_ratio: 0.9,
                default_ratio: 0.0,
                avg_delay_days: 5.0,
            }),
        }
    }

    #[test]
    fn clean_subject_is_verified_low_risk() {
        let report = evaluate(&clean_input());
        assert!(report.verified);
        assert_eq!(report.composite_score, 776);
        assert_eq!(report.risk_category, RiskCategory::LowRisk);
        assert_eq!(report.recommendation, Recommendation::Approve);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn blacklisted_owner_forces_reject_with_reason() {
        let mut input = clean_input();
        input.owner.blacklisted = true;
        let report = evaluate(&input);
        assert!(!report.verified);
        assert_eq!(report.recommendation, Recommendation::Reject);
        assert!(report.reasons.contains(&"OWNER_BLACKLISTED".to_string()));
    }

    #[test]
    fn suspended_entity_forces_reject_even_with_passing_score() {
        let mut input = clean_input();
        input.entity = Some(EntityFacts {
            compliance_avg: 95,
            age_years: 10,
            suspended: true,
        });
        let report = evaluate(&input);
        assert!(!report.verified);
        assert_eq!(report.recommendation, Recommendation::Reject);
        assert!(report.reasons.contains(&"ENTITY_SUSPENDED".to_string()));
    }

    #[test]
    fn missing_entity_uses_neutral_components() {
        let input = EvaluationInput {
            owner: OwnerFacts {
                identity_verified: true,
                tax_linked: true,
                ..Default::default()
            },
            entity: None,
            transactions: None,
        };
        let report = evaluate(&input);
        assert_eq!(report.entity_score, NO_ENTITY_SCORE);
        assert_eq!(report.transaction_score, NO_HISTORY_SCORE);
        assert!(report.verified);
    }

    #[test]
    fn low_composite_reports_reason() {
        let input = EvaluationInput {
            owner: OwnerFacts {
                blacklisted: true,
                defaults_count: 5,
                ..Default::default()
            },
            entity: Some(EntityFacts {
                compliance_avg: 10,
                age_years: 0,
                suspended: true,
            }),
            transactions: Some(TransactionFacts {
                total_invoices: 10,
                paid_ratio: 0.0,
                default_ratio: 0.9,
                avg_delay_days: 120.0,
            }),
        };
        let report = evaluate(&input);
        assert!(!report.verified);
        assert_eq!(report.risk_category, RiskCategory::HighRisk);
        assert!(report.reasons.contains(&"LOW_COMPOSITE_SCORE".to_string()));
    }

    #[test]
    fn risk_category_boundaries() {
        assert_eq!(RiskCategory::from_score(300), RiskCategory::HighRisk);
        assert_eq!(RiskCategory::from_score(301), RiskCategory::MediumRisk);
        assert_eq!(RiskCategory::from_score(600), RiskCategory::MediumRisk);
        assert_eq!(RiskCategory::from_score(601), RiskCategory::LowRisk);
        assert_eq!(RiskCategory::from_score(800), RiskCategory::LowRisk);
        assert_eq!(RiskCategory::from_score(801), RiskCategory::Excellent);
    }
}
