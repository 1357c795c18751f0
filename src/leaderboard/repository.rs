use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{DailySnapshot, LiveLeaderboardEntry, SnapshotEntry};
use crate::shared::AppError;

/// Result of a conditional leaderboard upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The entry was inserted or replaced a strictly worse result.
    Applied,
    /// An equal or better result already exists; nothing changed.
    NotBetter,
}

/// Result of a version-guarded rank write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankWriteResult {
    Written,
    /// Another writer changed the word's entry set since the read; the
    /// caller must re-read and recompute.
    VersionConflict,
}

/// Result of the atomic create-if-absent snapshot write.
#[derive(Debug, Clone)]
pub enum SnapshotWriteResult {
    Created(DailySnapshot),
    /// A concurrent or earlier finalization won; this is the stored record.
    AlreadyExists(DailySnapshot),
}

/// A word's entries together with the optimistic-concurrency version that
/// guarded the read.
#[derive(Debug, Clone)]
pub struct VersionedEntries {
    pub entries: Vec<LiveLeaderboardEntry>,
    pub version: u64,
}

/// Trait for leaderboard storage: live entries plus finalized snapshots.
///
/// Every mutating operation is conditional, never plain read-then-write:
/// upserts apply only when strictly better, rank writes carry the version
/// observed at read time, and snapshot creation is create-if-absent.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Upserts the entry for (word, player) only if it beats the stored one.
    async fn upsert_if_better(
        &self,
        entry: &LiveLeaderboardEntry,
    ) -> Result<UpsertOutcome, AppError>;

    /// Reads the full entry set for a word along with its version.
    async fn entries_for_word(&self, word_id: &str) -> Result<VersionedEntries, AppError>;

    /// Writes recomputed ranks for a word, failing with a conflict if the
    /// entry set changed since `expected_version` was observed.
    async fn replace_ranks(
        &self,
        word_id: &str,
        expected_version: u64,
        ranked: &[LiveLeaderboardEntry],
    ) -> Result<RankWriteResult, AppError>;

    async fn get_entry(
        &self,
        word_id: &str,
        player_id: &str,
    ) -> Result<Option<LiveLeaderboardEntry>, AppError>;

    async fn get_snapshot(
        &self,
        word_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySnapshot>, AppError>;

    /// Atomically creates the snapshot unless one already exists, in which
    /// case the stored snapshot is returned untouched.
    async fn create_snapshot_if_absent(
        &self,
        snapshot: &DailySnapshot,
    ) -> Result<SnapshotWriteResult, AppError>;
}

#[derive(Debug, Default)]
struct WordBoard {
    entries: HashMap<String, LiveLeaderboardEntry>,
    version: u64,
}

/// In-memory implementation of LeaderboardRepository for development and
/// testing. Versioning mirrors what the PostgreSQL implementation does with
/// its version table so the service's retry path is exercised identically.
pub struct InMemoryLeaderboardRepository {
    boards: Mutex<HashMap<String, WordBoard>>,
    snapshots: Mutex<HashMap<(String, NaiveDate), DailySnapshot>>,
}

impl Default for InMemoryLeaderboardRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLeaderboardRepository {
    pub fn new() -> Self {
        Self {
            boards: Mutex::new(HashMap::new()),
            snapshots: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryLeaderboardRepository {
    #[instrument(skip(self, entry), fields(word_id = %entry.word_id, player_id = %entry.player_id))]
    async fn upsert_if_better(
        &self,
        entry: &LiveLeaderboardEntry,
    ) -> Result<UpsertOutcome, AppError> {
        let mut boards = self.boards.lock().unwrap();
        let board = boards.entry(entry.word_id.clone()).or_default();

        match board.entries.get_mut(&entry.player_id) {
            Some(existing) => {
                if !entry.is_strictly_better_than(existing) {
                    debug!("Existing result is equal or better, upsert skipped");
                    return Ok(UpsertOutcome::NotBetter);
                }
                // Keep the current rank until the recompute pass rewrites it,
                // so readers never observe an unranked row.
                let rank = existing.rank;
                *existing = LiveLeaderboardEntry {
                    rank,
                    ..entry.clone()
                };
            }
            None => {
                board
                    .entries
                    .insert(entry.player_id.clone(), entry.clone());
            }
        }

        board.version += 1;
        debug!(version = board.version, "Leaderboard entry applied");
        Ok(UpsertOutcome::Applied)
    }

    #[instrument(skip(self))]
    async fn entries_for_word(&self, word_id: &str) -> Result<VersionedEntries, AppError> {
        let boards = self.boards.lock().unwrap();
        let board = boards.get(word_id);

        Ok(VersionedEntries {
            entries: board
                .map(|b| b.entries.values().cloned().collect())
                .unwrap_or_default(),
            version: board.map(|b| b.version).unwrap_or(0),
        })
    }

    #[instrument(skip(self, ranked))]
    async fn replace_ranks(
        &self,
        word_id: &str,
        expected_version: u64,
        ranked: &[LiveLeaderboardEntry],
    ) -> Result<RankWriteResult, AppError> {
        let mut boards = self.boards.lock().unwrap();
        let board = boards.entry(word_id.to_string()).or_default();

        if board.version != expected_version {
            warn!(
                expected = expected_version,
                actual = board.version,
                "Rank write rejected, entry set changed since read"
            );
            return Ok(RankWriteResult::VersionConflict);
        }

        for entry in ranked {
            if let Some(stored) = board.entries.get_mut(&entry.player_id) {
                stored.rank = entry.rank;
            }
        }

        board.version += 1;
        debug!(version = board.version, "Ranks written");
        Ok(RankWriteResult::Written)
    }

    #[instrument(skip(self))]
    async fn get_entry(
        &self,
        word_id: &str,
        player_id: &str,
    ) -> Result<Option<LiveLeaderboardEntry>, AppError> {
        let boards = self.boards.lock().unwrap();
        Ok(boards
            .get(word_id)
            .and_then(|b| b.entries.get(player_id))
            .cloned())
    }

    #[instrument(skip(self))]
    async fn get_snapshot(
        &self,
        word_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySnapshot>, AppError> {
        let snapshots = self.snapshots.lock().unwrap();
        Ok(snapshots.get(&(word_id.to_string(), date)).cloned())
    }

    #[instrument(skip(self, snapshot), fields(word_id = %snapshot.word_id, date = %snapshot.date))]
    async fn create_snapshot_if_absent(
        &self,
        snapshot: &DailySnapshot,
    ) -> Result<SnapshotWriteResult, AppError> {
        let mut snapshots = self.snapshots.lock().unwrap();
        let key = (snapshot.word_id.clone(), snapshot.date);

        if let Some(existing) = snapshots.get(&key) {
            debug!("Snapshot already finalized, returning stored record");
            return Ok(SnapshotWriteResult::AlreadyExists(existing.clone()));
        }

        snapshots.insert(key, snapshot.clone());
        debug!(entry_count = snapshot.entries.len(), "Snapshot finalized");
        Ok(SnapshotWriteResult::Created(snapshot.clone()))
    }
}

/// PostgreSQL implementation of the leaderboard repository.
///
/// Expected schema:
///   leaderboard_entries(word_id, player_id, guess_count, elapsed_seconds,
///                       score, completed_at, rank, PRIMARY KEY (word_id, player_id))
///   leaderboard_versions(word_id PRIMARY KEY, version BIGINT)
///   daily_snapshots(word_id, date, payload TEXT, finalized BOOL,
///                   finalized_at, PRIMARY KEY (word_id, date))
pub struct PostgresLeaderboardRepository {
    pool: PgPool,
}

impl PostgresLeaderboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaderboardRepository for PostgresLeaderboardRepository {
    #[instrument(skip(self, entry), fields(word_id = %entry.word_id, player_id = %entry.player_id))]
    async fn upsert_if_better(
        &self,
        entry: &LiveLeaderboardEntry,
    ) -> Result<UpsertOutcome, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO leaderboard_versions (word_id, version) VALUES ($1, 0) ON CONFLICT (word_id) DO NOTHING",
        )
        .bind(&entry.word_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO leaderboard_entries \
             (word_id, player_id, guess_count, elapsed_seconds, score, completed_at, rank) \
             VALUES ($1, $2, $3, $4, $5, $6, 0) \
             ON CONFLICT (word_id, player_id) DO UPDATE SET \
                 guess_count = EXCLUDED.guess_count, \
                 elapsed_seconds = EXCLUDED.elapsed_seconds, \
                 score = EXCLUDED.score, \
                 completed_at = EXCLUDED.completed_at \
             WHERE (EXCLUDED.elapsed_seconds, EXCLUDED.guess_count) \
                 < (leaderboard_entries.elapsed_seconds, leaderboard_entries.guess_count)",
        )
        .bind(&entry.word_id)
        .bind(&entry.player_id)
        .bind(entry.guess_count)
        .bind(entry.elapsed_seconds)
        .bind(entry.score)
        .bind(entry.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to upsert leaderboard entry");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            return Ok(UpsertOutcome::NotBetter);
        }

        sqlx::query("UPDATE leaderboard_versions SET version = version + 1 WHERE word_id = $1")
            .bind(&entry.word_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(UpsertOutcome::Applied)
    }

    #[instrument(skip(self))]
    async fn entries_for_word(&self, word_id: &str) -> Result<VersionedEntries, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let version: i64 =
            sqlx::query("SELECT version FROM leaderboard_versions WHERE word_id = $1")
                .bind(word_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?
                .map(|row| row.get("version"))
                .unwrap_or(0);

        let entries: Vec<LiveLeaderboardEntry> = sqlx::query_as(
            "SELECT word_id, player_id, guess_count, elapsed_seconds, score, completed_at, rank \
             FROM leaderboard_entries WHERE word_id = $1",
        )
        .bind(word_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(VersionedEntries {
            entries,
            version: version as u64,
        })
    }

    #[instrument(skip(self, ranked))]
    async fn replace_ranks(
        &self,
        word_id: &str,
        expected_version: u64,
        ranked: &[LiveLeaderboardEntry],
    ) -> Result<RankWriteResult, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        // The conditional version bump is the serialization point: losing a
        // race here means another writer already re-ranked from newer state.
        let guard = sqlx::query(
            "UPDATE leaderboard_versions SET version = version + 1 \
             WHERE word_id = $1 AND version = $2",
        )
        .bind(word_id)
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if guard.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            return Ok(RankWriteResult::VersionConflict);
        }

        for entry in ranked {
            sqlx::query(
                "UPDATE leaderboard_entries SET rank = $3 WHERE word_id = $1 AND player_id = $2",
            )
            .bind(word_id)
            .bind(&entry.player_id)
            .bind(entry.rank)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(RankWriteResult::Written)
    }

    #[instrument(skip(self))]
    async fn get_entry(
        &self,
        word_id: &str,
        player_id: &str,
    ) -> Result<Option<LiveLeaderboardEntry>, AppError> {
        sqlx::query_as(
            "SELECT word_id, player_id, guess_count, elapsed_seconds, score, completed_at, rank \
             FROM leaderboard_entries WHERE word_id = $1 AND player_id = $2",
        )
        .bind(word_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn get_snapshot(
        &self,
        word_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySnapshot>, AppError> {
        let row = sqlx::query(
            "SELECT word_id, date, payload, finalized, finalized_at \
             FROM daily_snapshots WHERE word_id = $1 AND date = $2",
        )
        .bind(word_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(snapshot_from_row).transpose()
    }

    #[instrument(skip(self, snapshot), fields(word_id = %snapshot.word_id, date = %snapshot.date))]
    async fn create_snapshot_if_absent(
        &self,
        snapshot: &DailySnapshot,
    ) -> Result<SnapshotWriteResult, AppError> {
        let payload = serde_json::to_string(&snapshot.entries)
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO daily_snapshots (word_id, date, payload, finalized, finalized_at) \
             VALUES ($1, $2, $3, TRUE, $4) \
             ON CONFLICT (word_id, date) DO NOTHING",
        )
        .bind(&snapshot.word_id)
        .bind(snapshot.date)
        .bind(&payload)
        .bind(snapshot.finalized_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create snapshot");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 1 {
            return Ok(SnapshotWriteResult::Created(snapshot.clone()));
        }

        // Lost the create race; read back the winner's snapshot.
        let existing = self
            .get_snapshot(&snapshot.word_id, snapshot.date)
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError("Snapshot vanished after conflicting insert".to_string())
            })?;

        Ok(SnapshotWriteResult::AlreadyExists(existing))
    }
}

fn snapshot_from_row(row: sqlx::postgres::PgRow) -> Result<DailySnapshot, AppError> {
    let payload: String = row.get("payload");
    let entries: Vec<SnapshotEntry> =
        serde_json::from_str(&payload).map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(DailySnapshot {
        word_id: row.get("word_id"),
        date: row.get("date"),
        entries,
        finalized: row.get("finalized"),
        finalized_at: row.get("finalized_at"),
    })
}
