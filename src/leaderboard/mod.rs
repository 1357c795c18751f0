pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;

pub use models::{DailySnapshot, LiveLeaderboardEntry, SnapshotEntry};
pub use repository::{
    InMemoryLeaderboardRepository, LeaderboardRepository, PostgresLeaderboardRepository,
};
pub use service::{FinalizeOutcome, LeaderboardService, SubmitOutcome};
