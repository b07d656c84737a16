//! Health Check API

use axum::Json;
use serde_json::{Value, json};

/// GET /health
/// Simple liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
