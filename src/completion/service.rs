use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::models::CompletionRecord;
use super::repository::CompletionRepository;
use super::types::{CompletionEvent, SubmitResponse};
use crate::leaderboard::models::LiveLeaderboardEntry;
use crate::leaderboard::service::{LeaderboardService, SubmitOutcome};
use crate::player::repository::PlayerRepository;
use crate::scoring::compute_score;
use crate::shared::AppError;
use crate::streak::service::StreakService;
use crate::word::repository::WordRepository;

/// Single entry point for finished game sessions.
///
/// Validates the event, resolves its dependencies (word must exist, player
/// is created lazily), gates replays, and drives the leaderboard and streak
/// pipelines synchronously.
pub struct CompletionService {
    player_repository: Arc<dyn PlayerRepository>,
    word_repository: Arc<dyn WordRepository>,
    completion_repository: Arc<dyn CompletionRepository>,
    leaderboard_service: Arc<LeaderboardService>,
    streak_service: Arc<StreakService>,
}

impl CompletionService {
    pub fn new(
        player_repository: Arc<dyn PlayerRepository>,
        word_repository: Arc<dyn WordRepository>,
        completion_repository: Arc<dyn CompletionRepository>,
        leaderboard_service: Arc<LeaderboardService>,
        streak_service: Arc<StreakService>,
    ) -> Self {
        Self {
            player_repository,
            word_repository,
            completion_repository,
            leaderboard_service,
            streak_service,
        }
    }

    /// Processes one completion event end to end.
    ///
    /// Malformed payloads and missing words are hard errors; a replay that
    /// does not beat the stored result comes back as an explicit
    /// `accepted: false` so the caller never mistakes it for success.
    #[instrument(skip(self, event), fields(player_id = %event.player_id, word_id = %event.word_id, won = event.won))]
    pub async fn submit(&self, event: CompletionEvent) -> Result<SubmitResponse, AppError> {
        validate_event(&event)?;

        let word = self
            .word_repository
            .get_word(&event.word_id)
            .await?
            .ok_or_else(|| {
                AppError::DependencyMissing(format!("word {} not found", event.word_id))
            })?;

        // Once a day is frozen its ranking can never change, so late events
        // are rejected rather than silently dropped.
        if self
            .leaderboard_service
            .is_finalized(&word.id, word.scheduled_date)
            .await?
        {
            return self
                .rejection(&event.player_id, "the day for this word is already finalized")
                .await;
        }

        // Player identity must exist before any leaderboard write; the
        // lazy create is atomic, so a retry after a failure here is safe.
        let player = self.player_repository.get_or_create(&event.player_id).await?;

        let score = if event.won {
            compute_score(event.guess_count, event.elapsed_seconds, event.fuzzy_matches)
        } else {
            0
        };

        let mut rank = None;
        if event.won {
            let entry = LiveLeaderboardEntry {
                word_id: word.id.clone(),
                player_id: player.id.clone(),
                guess_count: event.guess_count as i32,
                elapsed_seconds: event.elapsed_seconds as i32,
                score,
                completed_at: event.completed_at,
                rank: 0,
            };

            match self
                .leaderboard_service
                .submit_entry(entry, word.scheduled_date)
                .await?
            {
                SubmitOutcome::Ranked(new_rank) => rank = Some(new_rank),
                SubmitOutcome::DayFinalized => {
                    return self
                        .rejection(
                            &event.player_id,
                            "the day for this word is already finalized",
                        )
                        .await;
                }
                SubmitOutcome::NotBetter => {
                    debug!("Replay does not beat recorded result, rejecting");
                    // A previous attempt may have died between the entry and
                    // streak writes. Re-applying the win is a same-day no-op
                    // when it already counted, so the retry path stays safe.
                    let streak = self
                        .streak_service
                        .record_result(&player.id, word.scheduled_date, true)
                        .await?;
                    return Ok(SubmitResponse {
                        accepted: false,
                        reason: Some(
                            "an equal or better result is already recorded for this word"
                                .to_string(),
                        ),
                        rank: None,
                        current_streak: streak.current_streak,
                        best_streak: streak.best_streak,
                    });
                }
            }
        }

        self.completion_repository
            .record_attempt(&CompletionRecord::from_event(&event, score))
            .await?;

        // Losses are never ranked, but they still reach the streak updater:
        // a recorded loss must be able to break a streak.
        let streak = self
            .streak_service
            .record_result(&player.id, word.scheduled_date, event.won)
            .await?;

        info!(
            score,
            rank,
            current_streak = streak.current_streak,
            "Completion accepted"
        );

        Ok(SubmitResponse {
            accepted: true,
            reason: None,
            rank,
            current_streak: streak.current_streak,
            best_streak: streak.best_streak,
        })
    }

    /// Builds a rejection response carrying the player's untouched streak.
    async fn rejection(
        &self,
        player_id: &str,
        reason: &str,
    ) -> Result<SubmitResponse, AppError> {
        let streak = self.streak_service.get_streak(player_id).await?;
        Ok(SubmitResponse {
            accepted: false,
            reason: Some(reason.to_string()),
            rank: None,
            current_streak: streak.current_streak,
            best_streak: streak.best_streak,
        })
    }
}

/// Upper bound on every numeric metric: leaderboard columns are `i32`, and
/// anything larger would wrap negative on the cast.
const MAX_METRIC: u32 = i32::MAX as u32;

fn validate_event(event: &CompletionEvent) -> Result<(), AppError> {
    if event.player_id.trim().is_empty() {
        return Err(AppError::Validation("player_id must not be empty".to_string()));
    }
    if event.word_id.trim().is_empty() {
        return Err(AppError::Validation("word_id must not be empty".to_string()));
    }
    if event.guess_count == 0 {
        return Err(AppError::Validation(
            "guess_count must be at least 1".to_string(),
        ));
    }
    if event.elapsed_seconds == 0 {
        return Err(AppError::Validation(
            "elapsed_seconds must be positive".to_string(),
        ));
    }
    if event.guess_count > MAX_METRIC {
        return Err(AppError::Validation(
            "guess_count is out of range".to_string(),
        ));
    }
    if event.elapsed_seconds > MAX_METRIC {
        return Err(AppError::Validation(
            "elapsed_seconds is out of range".to_string(),
        ));
    }
    if event.fuzzy_matches > MAX_METRIC {
        return Err(AppError::Validation(
            "fuzzy_matches is out of range".to_string(),
        ));
    }
    Ok(())
}
