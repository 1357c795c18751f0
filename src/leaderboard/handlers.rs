use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{FinalizeRequest, FinalizeResponse, LeaderboardQuery, LeaderboardResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for reading a leaderboard.
///
/// GET /leaderboard/{word_id}?date=YYYY-MM-DD
/// Serves today's live ranking when the date is omitted or today, otherwise
/// the finalized snapshot (finalizing it on demand if the scheduler missed
/// that day).
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(word_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let response = state
        .leaderboard_service
        .leaderboard_for(&word_id, query.date)
        .await?;

    Ok(Json(response))
}

/// HTTP handler for the administrative finalize operation.
///
/// POST /admin/finalize
/// Idempotent: repeat calls for the same (word, date) are no-op successes.
#[instrument(name = "finalize_day", skip(state, request), fields(word_id = %request.word_id, date = %request.date))]
pub async fn finalize_day(
    State(state): State<AppState>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<FinalizeResponse>, AppError> {
    let outcome = state
        .leaderboard_service
        .finalize(&request.word_id, request.date)
        .await?;

    info!(
        already_finalized = outcome.already_finalized,
        entry_count = outcome.snapshot.entries.len(),
        "Finalize request completed"
    );

    Ok(Json(FinalizeResponse {
        finalized: true,
        already_finalized: outcome.already_finalized,
    }))
}
