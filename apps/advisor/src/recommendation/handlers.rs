//! Axum route handlers for the Recommendation API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::product::{Goal, ProductRecord, RiskLevel};
use crate::models::profile::UserProfile;
use crate::models::recommendation::RecommendationResult;
use crate::recommendation::pipeline::recommend_for_profile;
use crate::recommendation::prompts::{FALLBACK_MESSAGE, GENERIC_FALLBACK_REPLY};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRecommendationRequest {
    pub prompt: String,
}

/// `error = true` marks a fallback reply, not a failed request; the status is still 200.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRecommendationResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub age: u32,
    pub income: f64,
    pub financial_goal: Goal,
    pub risk_appetite: RiskLevel,
    #[serde(default = "default_use_ai")]
    pub use_ai: bool,
}

fn default_use_ai() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatusResponse {
    pub has_api_key: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate-recommendation
///
/// Sends a caller-built prompt through model failover. Upstream failure and a
/// missing key both produce the generic fallback reply with `error: true`.
pub async fn handle_generate_recommendation(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRecommendationRequest>, JsonRejection>,
) -> Result<Json<GenerateRecommendationResponse>, AppError> {
    let Json(request) = payload?;
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let preview: String = request.prompt.chars().take(100).collect();
    info!("Received recommendation request with prompt: {preview}...");

    match state.orchestrator.complete(&request.prompt).await {
        Ok(generated) => Ok(Json(GenerateRecommendationResponse {
            reply: generated.text,
            error: None,
            message: None,
        })),
        Err(e) => {
            warn!("Error generating recommendation: {e}");
            Ok(Json(GenerateRecommendationResponse {
                reply: GENERIC_FALLBACK_REPLY.to_string(),
                error: Some(true),
                message: Some(FALLBACK_MESSAGE.to_string()),
            }))
        }
    }
}

/// POST /api/recommendations
///
/// Full pipeline for a profile: match, price, narrate.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResult>, AppError> {
    let Json(request) = payload?;
    let profile = UserProfile::new(
        request.age,
        request.income,
        request.financial_goal,
        request.risk_appetite,
    )?;

    let result =
        recommend_for_profile(&state.catalog, &state.orchestrator, &profile, request.use_ai).await;
    Ok(Json(result))
}

/// GET /api/check-config
pub async fn handle_check_config(State(state): State<AppState>) -> Json<ConfigStatusResponse> {
    let has_api_key = state.orchestrator.has_credentials();
    Json(ConfigStatusResponse {
        has_api_key,
        message: if has_api_key {
            "API key is configured".to_string()
        } else {
            "API key is missing".to_string()
        },
    })
}

/// GET /api/products
pub async fn handle_list_products(State(state): State<AppState>) -> Json<ProductListResponse> {
    Json(ProductListResponse {
        products: state.catalog.products().to_vec(),
    })
}

/// GET /api/products/:id
pub async fn handle_get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductRecord>, AppError> {
    state
        .catalog
        .products()
        .iter()
        .find(|p| p.id == product_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))
}
