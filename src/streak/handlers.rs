use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use super::types::StreakResponse;
use crate::shared::{AppError, AppState};

/// HTTP handler for reading a player's streak.
///
/// GET /streaks/{player_id}
/// Unknown players get the zero record, not a 404: a streak of zero is the
/// correct answer for someone who has never won.
#[instrument(name = "get_streak", skip(state))]
pub async fn get_streak(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<StreakResponse>, AppError> {
    let record = state.streak_service.get_streak(&player_id).await?;
    Ok(Json(record.into()))
}
