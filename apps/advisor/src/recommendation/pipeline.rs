//! Recommendation pipeline: match → premiums → template or model narrative.

use tracing::info;

use crate::catalog::ProductCatalog;
use crate::models::profile::UserProfile;
use crate::models::recommendation::RecommendationResult;
use crate::recommendation::eligibility::match_products;
use crate::recommendation::orchestrator::RecommendationOrchestrator;
use crate::recommendation::template;

/// Runs the full pipeline for one validated profile.
///
/// With `use_ai` off the template narrative is returned as a normal, non-degraded
/// result. With it on, the orchestrator decides (and degrades on its own).
pub async fn recommend_for_profile(
    catalog: &ProductCatalog,
    orchestrator: &RecommendationOrchestrator,
    profile: &UserProfile,
    use_ai: bool,
) -> RecommendationResult {
    let matches = match_products(catalog.products(), profile);
    info!(
        "Matched {} of {} products (age={}, goal={}, risk={})",
        matches.len(),
        catalog.len(),
        profile.age,
        profile.financial_goal,
        profile.risk_appetite
    );

    if !use_ai {
        let narrative = template::render(profile, &matches);
        return RecommendationResult::template(matches, narrative);
    }

    orchestrator.recommend(profile, matches).await
}
