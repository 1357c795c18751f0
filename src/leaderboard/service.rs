use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::models::{DailySnapshot, LiveLeaderboardEntry, SnapshotEntry};
use super::repository::{
    LeaderboardRepository, RankWriteResult, SnapshotWriteResult, UpsertOutcome,
};
use super::types::{LeaderboardEntryView, LeaderboardResponse};
use crate::shared::AppError;

/// How many times a rank recomputation retries after losing a version race.
const MAX_RANK_WRITE_ATTEMPTS: u32 = 5;

/// Base delay for the linear retry backoff.
const RETRY_BASE_DELAY_MS: u64 = 10;

/// Result of finalizing a (word, date).
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub snapshot: DailySnapshot,
    pub already_finalized: bool,
}

/// Result of applying a winning entry to a word's live board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The entry was applied; this is the player's rank after recomputation.
    Ranked(i32),
    /// An equal or better result is already recorded for this player.
    NotBetter,
    /// The word's day is already finalized; its board no longer accepts
    /// entries.
    DayFinalized,
}

/// Owns the live per-word rankings, day finalization, and historical reads.
///
/// Same-word recomputations serialize on a per-word async mutex; the
/// repository's version guard additionally catches writers outside this
/// process (a second server instance against the same database).
pub struct LeaderboardService {
    repository: Arc<dyn LeaderboardRepository>,
    word_mutexes: Arc<RwLock<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl LeaderboardService {
    pub fn new(repository: Arc<dyn LeaderboardRepository>) -> Self {
        Self {
            repository,
            word_mutexes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Applies a winning entry and synchronously re-ranks the word.
    ///
    /// `day` is the word's scheduled date. The finalized check happens under
    /// the same word lock that `finalize` takes, so a finalize racing with a
    /// late submission cannot slip in between the check and the write.
    #[instrument(skip(self, entry), fields(word_id = %entry.word_id, player_id = %entry.player_id))]
    pub async fn submit_entry(
        &self,
        entry: LiveLeaderboardEntry,
        day: NaiveDate,
    ) -> Result<SubmitOutcome, AppError> {
        let word_lock = self.word_lock(&entry.word_id).await;
        let guard = word_lock.lock().await;

        if self.is_finalized(&entry.word_id, day).await? {
            debug!("Entry rejected, day already finalized");
            drop(guard);
            self.clear_word_lock(&entry.word_id).await;
            return Ok(SubmitOutcome::DayFinalized);
        }

        match self.repository.upsert_if_better(&entry).await? {
            UpsertOutcome::NotBetter => {
                debug!("Entry rejected, existing result is equal or better");
                return Ok(SubmitOutcome::NotBetter);
            }
            UpsertOutcome::Applied => {}
        }

        self.recompute_ranks_locked(&entry.word_id).await?;

        let rank = self
            .repository
            .get_entry(&entry.word_id, &entry.player_id)
            .await?
            .map(|e| e.rank)
            .ok_or_else(|| {
                AppError::DatabaseError("entry missing after applied upsert".to_string())
            })?;

        Ok(SubmitOutcome::Ranked(rank))
    }

    /// Recomputes ranks for every entry of the given word.
    #[instrument(skip(self))]
    pub async fn recompute_ranks(&self, word_id: &str) -> Result<(), AppError> {
        let word_lock = self.word_lock(word_id).await;
        let _guard = word_lock.lock().await;
        self.recompute_ranks_locked(word_id).await
    }

    /// Single recomputation pass with optimistic retry. Callers must hold the
    /// word's lock.
    async fn recompute_ranks_locked(&self, word_id: &str) -> Result<(), AppError> {
        for attempt in 1..=MAX_RANK_WRITE_ATTEMPTS {
            let versioned = self.repository.entries_for_word(word_id).await?;

            let mut ranked = versioned.entries;
            ranked.sort_by_key(|e| e.ranking_key());
            for (index, entry) in ranked.iter_mut().enumerate() {
                entry.rank = (index + 1) as i32;
            }

            match self
                .repository
                .replace_ranks(word_id, versioned.version, &ranked)
                .await?
            {
                RankWriteResult::Written => {
                    debug!(
                        word_id = %word_id,
                        entry_count = ranked.len(),
                        attempt,
                        "Ranks recomputed"
                    );
                    return Ok(());
                }
                RankWriteResult::VersionConflict => {
                    warn!(word_id = %word_id, attempt, "Rank write conflict, retrying");
                    tokio::time::sleep(Duration::from_millis(
                        RETRY_BASE_DELAY_MS * attempt as u64,
                    ))
                    .await;
                }
            }
        }

        Err(AppError::Conflict(format!(
            "rank recomputation for word {} kept conflicting",
            word_id
        )))
    }

    /// Current live entries for a word, sorted by rank.
    pub async fn live_entries(
        &self,
        word_id: &str,
    ) -> Result<Vec<LiveLeaderboardEntry>, AppError> {
        let mut entries = self.repository.entries_for_word(word_id).await?.entries;
        entries.sort_by_key(|e| e.rank);
        Ok(entries)
    }

    /// Whether the (word, date) pair already has a finalized snapshot.
    pub async fn is_finalized(&self, word_id: &str, date: NaiveDate) -> Result<bool, AppError> {
        Ok(self
            .repository
            .get_snapshot(word_id, date)
            .await?
            .map(|s| s.finalized)
            .unwrap_or(false))
    }

    /// Freezes the live ranking for (word, date) into an immutable snapshot.
    ///
    /// Idempotent: a second call (or a concurrent racer) gets the stored
    /// snapshot back with `already_finalized: true` and never re-ranks it.
    #[instrument(skip(self))]
    pub async fn finalize(
        &self,
        word_id: &str,
        date: NaiveDate,
    ) -> Result<FinalizeOutcome, AppError> {
        let today = Utc::now().date_naive();
        if date >= today {
            return Err(AppError::Validation(format!(
                "cannot finalize {}: the day has not fully elapsed",
                date
            )));
        }

        if let Some(existing) = self.repository.get_snapshot(word_id, date).await? {
            if existing.finalized {
                return Ok(FinalizeOutcome {
                    snapshot: existing,
                    already_finalized: true,
                });
            }
        }

        let word_lock = self.word_lock(word_id).await;
        let guard = word_lock.lock().await;

        let mut entries = self.repository.entries_for_word(word_id).await?.entries;
        entries.sort_by_key(|e| e.ranking_key());

        let snapshot_entries: Vec<SnapshotEntry> = entries
            .iter()
            .enumerate()
            .map(|(index, e)| SnapshotEntry {
                rank: (index + 1) as i32,
                player_id: e.player_id.clone(),
                guess_count: e.guess_count,
                elapsed_seconds: e.elapsed_seconds,
                score: e.score,
            })
            .collect();

        let snapshot = DailySnapshot {
            word_id: word_id.to_string(),
            date,
            entries: snapshot_entries,
            finalized: true,
            finalized_at: Utc::now(),
        };

        let outcome = match self.repository.create_snapshot_if_absent(&snapshot).await? {
            SnapshotWriteResult::Created(stored) => {
                info!(
                    word_id = %word_id,
                    %date,
                    entry_count = stored.entries.len(),
                    "Day finalized"
                );
                FinalizeOutcome {
                    snapshot: stored,
                    already_finalized: false,
                }
            }
            SnapshotWriteResult::AlreadyExists(stored) => {
                debug!(word_id = %word_id, %date, "Finalize was a no-op, snapshot exists");
                FinalizeOutcome {
                    snapshot: stored,
                    already_finalized: true,
                }
            }
        };

        // The day is closed; the word's mutex has no further writers to
        // serialize. Waiters already holding the Arc still drain correctly.
        drop(guard);
        self.clear_word_lock(word_id).await;

        Ok(outcome)
    }

    /// Serves the leaderboard for a word: live for today, snapshot for past
    /// dates. A missing past snapshot is finalized on the spot (self-healing
    /// read), so every elapsed day is queryable even if the scheduler missed
    /// it.
    #[instrument(skip(self))]
    pub async fn leaderboard_for(
        &self,
        word_id: &str,
        requested_date: Option<NaiveDate>,
    ) -> Result<LeaderboardResponse, AppError> {
        let today = Utc::now().date_naive();
        let date = requested_date.unwrap_or(today);

        if date > today {
            return Err(AppError::Validation(format!(
                "cannot query future date {}",
                date
            )));
        }

        if date == today {
            let entries = self.live_entries(word_id).await?;
            return Ok(LeaderboardResponse {
                word_id: word_id.to_string(),
                date,
                is_finalized: false,
                entries: entries
                    .iter()
                    .map(|e| LeaderboardEntryView {
                        player_id: e.player_id.clone(),
                        rank: e.rank,
                        guess_count: e.guess_count,
                        elapsed_seconds: e.elapsed_seconds,
                        score: e.score,
                    })
                    .collect(),
            });
        }

        let outcome = self.finalize(word_id, date).await?;
        Ok(LeaderboardResponse {
            word_id: word_id.to_string(),
            date,
            is_finalized: true,
            entries: outcome
                .snapshot
                .entries
                .iter()
                .map(|e| LeaderboardEntryView {
                    player_id: e.player_id.clone(),
                    rank: e.rank,
                    guess_count: e.guess_count,
                    elapsed_seconds: e.elapsed_seconds,
                    score: e.score,
                })
                .collect(),
        })
    }

    async fn word_lock(&self, word_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.word_mutexes.read().await;
            if let Some(lock) = guard.get(word_id) {
                return lock.clone();
            }
        }

        let mut guard = self.word_mutexes.write().await;
        guard
            .entry(word_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn clear_word_lock(&self, word_id: &str) {
        let mut guard = self.word_mutexes.write().await;
        guard.remove(word_id);
    }
}
