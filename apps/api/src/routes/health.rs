use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and the connected sources.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let sources: Vec<&str> = state.sources.iter().map(|source| source.name()).collect();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "sources": sources
    }))
}
