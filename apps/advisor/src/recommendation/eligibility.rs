//! Eligibility matching: two-tier filter over the catalog.
//!
//! Algorithm:
//! 1. Exact tier: age in range, income ≥ minimum, goal in `suitableFor`, risk in `risk`.
//!    If anything qualifies, that set is the answer and the partial tier is never run.
//! 2. Partial tier: age and income hold, plus the goal OR the risk matches.
//!
//! Output keeps catalog order within the winning tier; there is no relevance sort.

use crate::models::product::ProductRecord;
use crate::models::profile::UserProfile;
use crate::models::recommendation::{MatchTier, MatchedProduct};
use crate::recommendation::premium::estimate;

/// Per-product predicate results for one profile.
#[derive(Debug, Clone, Copy)]
struct Eligibility {
    age: bool,
    income: bool,
    goal: bool,
    risk: bool,
}

impl Eligibility {
    fn evaluate(product: &ProductRecord, profile: &UserProfile) -> Self {
        Self {
            age: product.covers_age(profile.age),
            income: product.affordable_at(profile.income),
            goal: product.suitable_for.contains(&profile.financial_goal),
            risk: product.risk.contains(&profile.risk_appetite),
        }
    }

    fn is_exact(self) -> bool {
        self.age && self.income && self.goal && self.risk
    }

    fn is_partial(self) -> bool {
        self.age && self.income && (self.goal || self.risk)
    }
}

/// Matches a profile against the catalog. Deterministic and side-effect free;
/// an empty result means "no recommendations", not an error.
pub fn match_products(catalog: &[ProductRecord], profile: &UserProfile) -> Vec<MatchedProduct> {
    let evaluated: Vec<(&ProductRecord, Eligibility)> = catalog
        .iter()
        .map(|product| (product, Eligibility::evaluate(product, profile)))
        .collect();

    let exact: Vec<MatchedProduct> = evaluated
        .iter()
        .filter(|(_, e)| e.is_exact())
        .map(|(product, e)| to_matched(product, profile, MatchTier::Exact, *e))
        .collect();

    if !exact.is_empty() {
        return exact;
    }

    evaluated
        .iter()
        .filter(|(_, e)| e.is_partial())
        .map(|(product, e)| to_matched(product, profile, MatchTier::Partial, *e))
        .collect()
}

fn to_matched(
    product: &ProductRecord,
    profile: &UserProfile,
    tier: MatchTier,
    eligibility: Eligibility,
) -> MatchedProduct {
    let premium = estimate(profile.income, product.premium_factor);
    MatchedProduct::new(
        product.clone(),
        premium.monthly,
        premium.annual,
        tier,
        eligibility.goal,
        eligibility.risk,
    )
}
