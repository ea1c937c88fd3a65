// ABOUTME: Liveness endpoint
// ABOUTME: Answers without authentication or database access

use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "ok",
    }))
}
