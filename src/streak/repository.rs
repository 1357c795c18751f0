use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::StreakRecord;
use crate::shared::AppError;

/// Trait for streak storage.
///
/// `apply_win` and `apply_loss` are atomic read-modify-writes: the transition
/// happens entirely inside the store so two concurrent completions for the
/// same player cannot interleave between read and write.
#[async_trait]
pub trait StreakRepository: Send + Sync {
    async fn apply_win(&self, player_id: &str, date: NaiveDate)
        -> Result<StreakRecord, AppError>;

    async fn apply_loss(&self, player_id: &str) -> Result<StreakRecord, AppError>;

    async fn get(&self, player_id: &str) -> Result<Option<StreakRecord>, AppError>;
}

/// In-memory implementation of StreakRepository for development and testing
pub struct InMemoryStreakRepository {
    records: Mutex<HashMap<String, StreakRecord>>,
}

impl Default for InMemoryStreakRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStreakRepository {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StreakRepository for InMemoryStreakRepository {
    #[instrument(skip(self))]
    async fn apply_win(
        &self,
        player_id: &str,
        date: NaiveDate,
    ) -> Result<StreakRecord, AppError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(player_id.to_string())
            .or_insert_with(|| StreakRecord::new(player_id.to_string()));

        record.apply_win(date);
        debug!(
            player_id = %player_id,
            current_streak = record.current_streak,
            best_streak = record.best_streak,
            "Win applied to streak"
        );
        Ok(record.clone())
    }

    #[instrument(skip(self))]
    async fn apply_loss(&self, player_id: &str) -> Result<StreakRecord, AppError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(player_id.to_string())
            .or_insert_with(|| StreakRecord::new(player_id.to_string()));

        record.apply_loss();
        debug!(player_id = %player_id, "Loss applied, streak ended");
        Ok(record.clone())
    }

    #[instrument(skip(self))]
    async fn get(&self, player_id: &str) -> Result<Option<StreakRecord>, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records.get(player_id).cloned())
    }
}

/// PostgreSQL implementation of the streak repository.
///
/// Expected schema:
///   streaks(player_id PRIMARY KEY, current_streak INT, best_streak INT,
///           last_win_date DATE NULL)
///
/// The whole state transition runs in a single conditional upsert so the
/// per-player serialization happens at the row level, not in application
/// code.
pub struct PostgresStreakRepository {
    pool: PgPool,
}

impl PostgresStreakRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreakRepository for PostgresStreakRepository {
    #[instrument(skip(self))]
    async fn apply_win(
        &self,
        player_id: &str,
        date: NaiveDate,
    ) -> Result<StreakRecord, AppError> {
        let row = sqlx::query(
            "INSERT INTO streaks (player_id, current_streak, best_streak, last_win_date) \
             VALUES ($1, 1, 1, $2) \
             ON CONFLICT (player_id) DO UPDATE SET \
                 current_streak = CASE \
                     WHEN streaks.last_win_date = $2 THEN streaks.current_streak \
                     WHEN streaks.last_win_date = $2 - 1 THEN streaks.current_streak + 1 \
                     ELSE 1 END, \
                 best_streak = GREATEST(streaks.best_streak, CASE \
                     WHEN streaks.last_win_date = $2 THEN streaks.current_streak \
                     WHEN streaks.last_win_date = $2 - 1 THEN streaks.current_streak + 1 \
                     ELSE 1 END), \
                 last_win_date = $2 \
             RETURNING player_id, current_streak, best_streak, last_win_date",
        )
        .bind(player_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to apply win to streak");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(record_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn apply_loss(&self, player_id: &str) -> Result<StreakRecord, AppError> {
        let row = sqlx::query(
            "INSERT INTO streaks (player_id, current_streak, best_streak, last_win_date) \
             VALUES ($1, 0, 0, NULL) \
             ON CONFLICT (player_id) DO UPDATE SET current_streak = 0 \
             RETURNING player_id, current_streak, best_streak, last_win_date",
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to apply loss to streak");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(record_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn get(&self, player_id: &str) -> Result<Option<StreakRecord>, AppError> {
        let row = sqlx::query(
            "SELECT player_id, current_streak, best_streak, last_win_date \
             FROM streaks WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(|r| record_from_row(&r)))
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> StreakRecord {
    let current: i32 = row.get("current_streak");
    let best: i32 = row.get("best_streak");
    StreakRecord {
        player_id: row.get("player_id"),
        current_streak: current.max(0) as u32,
        best_streak: best.max(0) as u32,
        last_win_date: row.get("last_win_date"),
    }
}
