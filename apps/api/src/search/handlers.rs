use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::SearchQuery;
use crate::search::{spawn_search, SearchOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub query: SearchQuery,
    /// Overrides the configured result count.
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// POST /api/v1/search
///
/// Searches every configured source. Answers 502 only when all of them failed;
/// partial failures are listed in `failures` next to the ranked resumes. A search
/// task that dies answers 500.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    request.query.validate().map_err(AppError::Validation)?;

    let top_n = request.top_n.unwrap_or(state.config.top_n);
    let outcome = spawn_search(state.sources.clone(), request.query, top_n).await?;

    if outcome.all_failed(state.sources.len()) {
        return Err(AppError::AllSourcesFailed(outcome.failures));
    }
    Ok(Json(outcome))
}
