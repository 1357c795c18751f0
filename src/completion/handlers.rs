use axum::{extract::State, Json};
use tracing::instrument;

use super::types::{CompletionEvent, SubmitResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for submitting a finished game session.
///
/// POST /completions
/// Returns the player's rank (for accepted wins) and their streak after the
/// event was applied. Rejections carry `accepted: false` and a reason.
#[instrument(name = "submit_completion", skip(state, event), fields(player_id = %event.player_id, word_id = %event.word_id))]
pub async fn submit_completion(
    State(state): State<AppState>,
    Json(event): Json<CompletionEvent>,
) -> Result<Json<SubmitResponse>, AppError> {
    let response = state.completion_service.submit(event).await?;
    Ok(Json(response))
}
