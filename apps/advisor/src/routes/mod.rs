pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommendation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/check-config", get(handlers::handle_check_config))
        .route(
            "/api/generate-recommendation",
            post(handlers::handle_generate_recommendation),
        )
        .route("/api/recommendations", post(handlers::handle_recommendations))
        .route("/api/products", get(handlers::handle_list_products))
        .route("/api/products/:id", get(handlers::handle_get_product))
        .with_state(state)
}
