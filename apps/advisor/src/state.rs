use std::sync::Arc;

use crate::catalog::ProductCatalog;
use crate::recommendation::orchestrator::RecommendationOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ProductCatalog>,
    pub orchestrator: Arc<RecommendationOrchestrator>,
}
