use serde::{Deserialize, Serialize};

use crate::models::product::ProductRecord;

/// Which eligibility tier admitted a product. A single result never mixes tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    Exact,
    Partial,
}

/// A catalog product that passed eligibility, with premiums for the requesting profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedProduct {
    #[serde(flatten)]
    pub product: ProductRecord,
    pub monthly_premium: f64,
    /// Always `monthly_premium * 12`, never recomputed from income.
    pub annual_premium: f64,
    pub match_tier: MatchTier,
    pub matched_on_goal: bool,
    pub matched_on_risk: bool,
    pub partial_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_summary: Option<String>,
}

impl MatchedProduct {
    pub fn new(
        product: ProductRecord,
        monthly_premium: f64,
        annual_premium: f64,
        match_tier: MatchTier,
        matched_on_goal: bool,
        matched_on_risk: bool,
    ) -> Self {
        let partial_match = match_tier == MatchTier::Partial;
        let match_summary =
            partial_match.then(|| partial_match_summary(matched_on_goal, matched_on_risk));
        Self {
            product,
            monthly_premium,
            annual_premium,
            match_tier,
            matched_on_goal,
            matched_on_risk,
            partial_match,
            match_summary,
        }
    }

    pub fn name(&self) -> &str {
        &self.product.name
    }
}

fn partial_match_summary(on_goal: bool, on_risk: bool) -> String {
    match (on_goal, on_risk) {
        (true, true) => "Matches your financial goal and Matches your risk appetite".to_string(),
        (true, false) => "Matches your financial goal".to_string(),
        (false, true) => "Matches your risk appetite".to_string(),
        (false, false) => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationSource {
    AIGenerated,
    Template,
}

/// Why a result fell back to the template path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradationReason {
    /// No credential configured; no network call was attempted.
    ConfigurationMissing,
    /// Every configured model failed.
    ProvidersExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub products: Vec<MatchedProduct>,
    pub narrative: String,
    pub source: RecommendationSource,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<DegradationReason>,
}

impl RecommendationResult {
    pub fn generated(products: Vec<MatchedProduct>, narrative: String) -> Self {
        Self {
            products,
            narrative,
            source: RecommendationSource::AIGenerated,
            degraded: false,
            degradation: None,
        }
    }

    /// Template output requested directly by the caller (AI mode switched off).
    pub fn template(products: Vec<MatchedProduct>, narrative: String) -> Self {
        Self {
            products,
            narrative,
            source: RecommendationSource::Template,
            degraded: false,
            degradation: None,
        }
    }

    pub fn degraded(
        products: Vec<MatchedProduct>,
        narrative: String,
        reason: DegradationReason,
    ) -> Self {
        Self {
            products,
            narrative,
            source: RecommendationSource::Template,
            degraded: true,
            degradation: Some(reason),
        }
    }
}
