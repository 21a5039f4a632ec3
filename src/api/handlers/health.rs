use axum::Json;
use serde_json::{json, Value};

/// Liveness probe. Does not touch any upstream.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
