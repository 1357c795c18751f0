use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the live leaderboard table, one row per (word, player).
///
/// Holds the best known winning metric for the word's still-open day. The
/// rank is recomputed for the whole word whenever any row for that word
/// changes; `0` means "not yet ranked" and is only visible inside a
/// recomputation window.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LiveLeaderboardEntry {
    pub word_id: String,
    pub player_id: String,
    pub guess_count: i32,
    pub elapsed_seconds: i32,
    pub score: i32,
    pub completed_at: DateTime<Utc>,
    pub rank: i32,
}

impl LiveLeaderboardEntry {
    /// Total ordering key: faster time wins, then fewer guesses, then the
    /// earlier completion. The timestamp tiebreak makes the order strict so
    /// ranks are always unique and contiguous.
    pub fn ranking_key(&self) -> (i32, i32, DateTime<Utc>) {
        (self.elapsed_seconds, self.guess_count, self.completed_at)
    }

    /// Strictly-better comparison used for upsert gating: lower elapsed time
    /// first, then fewer guesses. Equal metrics are not better.
    pub fn is_strictly_better_than(&self, other: &LiveLeaderboardEntry) -> bool {
        (self.elapsed_seconds, self.guess_count) < (other.elapsed_seconds, other.guess_count)
    }
}

/// One ranked line inside a finalized snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub rank: i32,
    pub player_id: String,
    pub guess_count: i32,
    pub elapsed_seconds: i32,
    pub score: i32,
}

/// Immutable ranking for a (word, date) once the day has elapsed.
///
/// The `finalized` flag transitions false -> true exactly once; after that
/// no process may alter the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub word_id: String,
    pub date: NaiveDate,
    pub entries: Vec<SnapshotEntry>,
    pub finalized: bool,
    pub finalized_at: DateTime<Utc>,
}
