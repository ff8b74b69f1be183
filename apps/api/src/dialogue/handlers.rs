use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::dialogue::{dispatch, render, Action, DialogueState, Input, ReplyOption, Session};
use crate::errors::AppError;
use crate::search::spawn_search;
use crate::state::AppState;

const SEARCH_FAILED: &str = "Search failed: none of the job sites could be reached. Please try again later.";

#[derive(Debug, Serialize)]
pub struct DialogueResponse {
    pub message: String,
    pub options: Vec<ReplyOption>,
    /// Absent once the session has ended (or never started).
    pub state: Option<DialogueState>,
}

/// POST /api/v1/dialogue/:chat_id
///
/// Body is `{"text": "..."}` for typed messages and commands, or `{"choice": "..."}`
/// for a pressed option.
pub async fn handle_dialogue(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(input): Json<Input>,
) -> Json<DialogueResponse> {
    let (reply, session_state) = {
        let mut sessions = state.sessions.lock().await;
        let reply = dispatch(&mut sessions, &chat_id, input, &state.dialogue_options);
        (reply, sessions.get(&chat_id).map(Session::state))
    };

    let mut message = reply.message;
    if let Some(Action::Search(query)) = reply.action {
        info!("Chat {chat_id} searching for '{}'", query.keywords.trim());
        message = match spawn_search(state.sources.clone(), query, state.config.top_n).await {
            Ok(outcome) if !outcome.all_failed(state.sources.len()) => render::format_results(&outcome),
            Ok(_) => SEARCH_FAILED.to_string(),
            Err(e) => {
                error!("Chat {chat_id} search failed: {e:?}");
                SEARCH_FAILED.to_string()
            }
        };
    }

    Json(DialogueResponse {
        message,
        options: reply.options,
        state: session_state,
    })
}

/// DELETE /api/v1/dialogue/:chat_id
pub async fn handle_end_dialogue(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .lock()
        .await
        .remove(&chat_id)
        .ok_or_else(|| AppError::NotFound(format!("No dialogue for chat {chat_id}")))?;
    Ok(StatusCode::NO_CONTENT)
}
