//! Component score formulas. All outputs are clamped to 0..=1000.

/// Neutral entity score used when the subject has no registered entity.
pub const NO_ENTITY_SCORE: u32 = 600;

/// Neutral transaction score used when no invoice history exists.
pub const NO_HISTORY_SCORE: u32 = 650;

/// Inputs to the owner component.
#[derive(Clone, Copy, Debug, Default)]
pub struct OwnerFacts {
    pub identity_verified: bool,
    pub tax_linked: bool,
    pub blacklisted: bool,
    pub defaults_count: u32,
    /// Tax identifier on file belongs to a different identity.
    pub linkage_mismatch: bool,
}

/// Inputs to the entity component.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityFacts {
    /// Mean compliance score over all filed records, 0..=100.
    pub compliance_avg: u32,
    pub age_years: u32,
    pub suspended: bool,
}

/// Inputs to the transaction component.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionFacts {
    pub total_invoices: u32,
    pub paid_ratio: f64,
    pub default_ratio: f64,
    pub avg_delay_days: f64,
}

/// Owner component: 700 base, adjusted for verification, tax linkage,
/// blacklisting, past defaults, and linkage mismatch.
pub fn owner_score(facts: &OwnerFacts) -> u32 {
    let mut score: i64 = 700;
    if facts.identity_verified {
        score += 100;
    }
    if facts.tax_linked {
        score += 50;
    } else {
        score -= 200;
    }
    if facts.blacklisted {
        score -= 500;
    }
    if facts.linkage_mismatch {
        score -= 150;
    }
    score -= facts.defaults_count as i64 * 100;
    clamp(score)
}

/// Entity component: 70% compliance, 30% age bonus, minus suspension and
/// poor-compliance penalties.
pub fn entity_score(facts: &EntityFacts) -> u32 {
    let compliance_component = (facts.compliance_avg * 10).min(1000) as f64;
    let age_bonus = (facts.age_years * 20).min(200) as f64;
    let base = compliance_component * 0.7 + age_bonus * 0.3;

    let mut penalties = 0.0;
    if facts.suspended {
        penalties += 500.0;
    }
    if facts.compliance_avg < 50 {
        penalties += 150.0;
    }
    clamp((base - penalties) as i64)
}

/// Transaction component from invoice history. Empty history returns the
/// neutral score rather than penalizing a new entity.
pub fn transaction_score(facts: &TransactionFacts) -> u32 {
    if facts.total_invoices == 0 {
        return NO_HISTORY_SCORE;
    }
    let mut score: i64 = 700;
    if facts.paid_ratio > 0.8 {
        score += 100;
    } else if facts.paid_ratio > 0.6 {
        score += 50;
    }
    if facts.default_ratio > 0.4 {
        score -= 400;
    } else if facts.default_ratio > 0.2 {
        score -= 200;
    }
    if facts.avg_delay_days > 60.0 {
        score -= 200;
    } else if facts.avg_delay_days > 30.0 {
        score -= 100;
    }
    clamp(score)
}

/// Weighted composite: owner 40%, entity 40%, transaction 20%.
pub fn composite_score(owner: u32, entity: u32, transaction: u32) -> u32 {
    (owner as f64 * 0.4 + entity as f64 * 0.4 + transaction as f64 * 0.2) as u32
}

fn clamp(score: i64) -> u32 {
    score.clamp(0, 1000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clean_verified_owner_scores_850() {
        let facts = OwnerFacts {
            identity_verified: true,
            tax_linked: true,
            ..Default::default()
        };
        assert_eq!(owner_score(&facts), 850);
    }

    #[test]
    fn blacklisted_owner_loses_500() {
        let facts = OwnerFacts {
            identity_verified: true,
            tax_linked: true,
            blacklisted: true,
            ..Default::default()
        };
        assert_eq!(owner_score(&facts), 350);
    }

    #[test]
    fn unlinked_owner_is_penalized_not_rewarded() {
        let facts = OwnerFacts {
            identity_verified: true,
            ..Default::default()
        };
        assert_eq!(owner_score(&facts), 600);
    }

    #[test]
    fn defaults_floor_at_zero() {
        let facts = OwnerFacts {
            defaults_count: 20,
            ..Default::default()
        };
        assert_eq!(owner_score(&facts), 0);
    }

    #[test]
    fn entity_score_weights_compliance_and_age() {
        let facts = EntityFacts {
            compliance_avg: 90,
            age_years: 10,
            suspended: false,
        };
        // 900 * 0.7 + 200 * 0.3 = 690
        assert_eq!(entity_score(&facts), 690);
    }

    #[test]
    fn suspended_entity_with_poor_compliance_hits_both_penalties() {
        let facts = EntityFacts {
            compliance_avg: 40,
            age_years: 1,
            suspended: true,
        };
        // 400 * 0.7 + 20 * 0.3 - 500 - 150 = -364 -> 0
        assert_eq!(entity_score(&facts), 0);
    }

    #[test]
    fn empty_history_is_neutral() {
        assert_eq!(transaction_score(&TransactionFacts::default()), NO_HISTORY_SCORE);
    }

    #[test]
    fn prompt_payers_gain_and_defaulters_lose() {
        let good = TransactionFacts {
            total_invoices: 10,
            paid_ratio: 0.9,
            default_ratio: 0.0,
            avg_delay_days: 5.0,
        };
        assert_eq!(transaction_score(&good), 800);

        let bad = TransactionFacts {
            total_invoices: 10,
            paid_ratio: 0.1,
            default_ratio: 0.5,
            avg_delay_days: 90.0,
        };
        assert_eq!(transaction_score(&bad), 100);
    }

    #[test]
    fn composite_uses_40_40_20_weights() {
        assert_eq!(composite_score(850, 690, 800), 776);
        assert_eq!(composite_score(0, 0, 0), 0);
        assert_eq!(composite_score(1000, 1000, 1000), 1000);
    }

    proptest! {
        #[test]
        fn all_scores_stay_in_range(
            verified in any::<bool>(),
            linked in any::<bool>(),
            blacklisted in any::<bool>(),
            defaults in 0u32..50,
            compliance in 0u32..=100,
            age in 0u32..100,
            suspended in any::<bool>(),
            invoices in 0u32..1000,
            paid in 0.0f64..=1.0,
            defaulted in 0.0f64..=1.0,
            delay in 0.0f64..365.0,
        ) {
            let o = owner_score(&OwnerFacts {
                identity_verified: verified,
                tax_linked: linked,
                blacklisted,
                defaults_count: defaults,
                linkage_mismatch: false,
            });
            let e = entity_score(&EntityFacts { compliance_avg: compliance, age_years: age, suspended });
            let t = transaction_score(&TransactionFacts {
                total_invoices: invoices,
                paid_ratio: paid,
                default_ratio: defaulted,
                avg_delay_days: delay,
            });
            prop_assert!(o <= 1000);
            prop_assert!(e <= 1000);
            prop_assert!(t <= 1000);
            prop_assert!(composite_score(o, e, t) <= 1000);
        }
    }
}
