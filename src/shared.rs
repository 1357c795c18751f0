use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::completion::service::CompletionService;
use crate::leaderboard::service::LeaderboardService;
use crate::streak::service::StreakService;
use crate::word::repository::WordRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub completion_service: Arc<CompletionService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    pub streak_service: Arc<StreakService>,
    pub word_repository: Arc<dyn WordRepository>,
}

impl AppState {
    pub fn new(
        completion_service: Arc<CompletionService>,
        leaderboard_service: Arc<LeaderboardService>,
        streak_service: Arc<StreakService>,
        word_repository: Arc<dyn WordRepository>,
    ) -> Self {
        Self {
            completion_service,
            leaderboard_service,
            streak_service,
            word_repository,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DependencyMissing(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            // Conflicts are retried internally; one only escapes here when the
            // retry budget is exhausted, and the caller may safely retry.
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Builds a fully in-memory application state.
///
/// Used by `main` in development and by the handler and integration tests.
/// Production wiring swaps the leaderboard and streak repositories for their
/// PostgreSQL implementations.
pub fn in_memory_state(word_repository: Arc<dyn WordRepository>) -> AppState {
    use crate::completion::repository::InMemoryCompletionRepository;
    use crate::leaderboard::repository::InMemoryLeaderboardRepository;
    use crate::player::repository::InMemoryPlayerRepository;
    use crate::streak::repository::InMemoryStreakRepository;

    let leaderboard_service = Arc::new(LeaderboardService::new(Arc::new(
        InMemoryLeaderboardRepository::new(),
    )));
    let streak_service = Arc::new(StreakService::new(Arc::new(
        InMemoryStreakRepository::new(),
    )));
    let completion_service = Arc::new(CompletionService::new(
        Arc::new(InMemoryPlayerRepository::new()),
        Arc::clone(&word_repository),
        Arc::new(InMemoryCompletionRepository::new()),
        Arc::clone(&leaderboard_service),
        Arc::clone(&streak_service),
    ));

    AppState::new(
        completion_service,
        leaderboard_service,
        streak_service,
        word_repository,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AppError::Validation("guess_count must be at least 1".to_string());
        assert!(err.to_string().contains("guess_count"));

        let err = AppError::DependencyMissing("word missing-word not found".to_string());
        assert!(err.to_string().contains("missing-word"));
    }
}
