// Library crate for the daily word-game ranking server
// This file exposes the public API for integration tests

pub mod completion;
pub mod leaderboard;
pub mod player;
pub mod schedule;
pub mod scoring;
pub mod shared;
pub mod streak;
pub mod word;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

// Re-export commonly used types for easier access in tests
pub use completion::{CompletionEvent, CompletionService, SubmitResponse};
pub use leaderboard::{LeaderboardRepository, LeaderboardService, LiveLeaderboardEntry};
pub use shared::{in_memory_state, AppError, AppState};
pub use streak::{StreakRecord, StreakService};
pub use word::{WordChallenge, WordRepository};

/// Builds the HTTP router over the given application state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Word ranking server" }))
        .route("/completions", post(completion::handlers::submit_completion))
        .route("/leaderboard/:word_id", get(leaderboard::handlers::get_leaderboard))
        .route("/admin/finalize", post(leaderboard::handlers::finalize_day))
        .route("/streaks/:player_id", get(streak::handlers::get_streak))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
