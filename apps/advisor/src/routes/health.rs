use axum::Json;
use serde_json::{json, Value};

/// GET /api/health
/// Fixed liveness payload with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running properly",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "advisor-api"
    }))
}
