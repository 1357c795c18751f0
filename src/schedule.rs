use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, instrument, warn};

use crate::leaderboard::service::LeaderboardService;
use crate::word::repository::WordRepository;

/// Configuration for the daily finalization task
#[derive(Debug, Clone)]
pub struct FinalizeTaskConfig {
    /// How often to check for unfinalized days. Finalization is idempotent,
    /// so ticking more often than once per day costs nothing.
    pub tick_interval: Duration,
}

impl Default for FinalizeTaskConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60 * 60), // hourly
        }
    }
}

/// Starts the background task that finalizes the previous UTC day.
///
/// The task is one finalization trigger among several; the self-healing
/// historical read covers any day this loop misses, so a crashed or delayed
/// tick never loses data.
#[instrument(skip(word_repository, leaderboard_service))]
pub async fn start_finalize_task(
    word_repository: Arc<dyn WordRepository>,
    leaderboard_service: Arc<LeaderboardService>,
    config: FinalizeTaskConfig,
) {
    info!(
        tick_interval_secs = config.tick_interval.as_secs(),
        "Starting daily finalization background task"
    );

    let mut tick = interval(config.tick_interval);

    loop {
        tick.tick().await;

        let yesterday = match Utc::now().date_naive().checked_sub_days(Days::new(1)) {
            Some(date) => date,
            None => continue,
        };

        match run_daily_finalization(&word_repository, &leaderboard_service, yesterday).await {
            Ok(finalized) => {
                info!(date = %yesterday, finalized, "Daily finalization pass completed");
            }
            Err(e) => {
                warn!(date = %yesterday, error = %e, "Daily finalization pass failed");
            }
        }
    }
}

/// Finalizes every word scheduled on `date`.
///
/// Each (word, date) is independent: a failure is logged and skipped so one
/// bad word cannot block the rest. Duplicate invocations for the same date
/// are safe no-ops via the finalizer's idempotency.
#[instrument(skip(word_repository, leaderboard_service))]
pub async fn run_daily_finalization(
    word_repository: &Arc<dyn WordRepository>,
    leaderboard_service: &Arc<LeaderboardService>,
    date: NaiveDate,
) -> Result<usize, crate::shared::AppError> {
    let words = word_repository.words_for_date(date).await?;

    if words.is_empty() {
        info!(%date, "No words scheduled, nothing to finalize");
        return Ok(0);
    }

    let mut finalized_count = 0;

    for word in words {
        match leaderboard_service.finalize(&word.id, date).await {
            Ok(outcome) => {
                finalized_count += 1;
                info!(
                    word_id = %word.id,
                    already_finalized = outcome.already_finalized,
                    entry_count = outcome.snapshot.entries.len(),
                    "Word finalized"
                );
            }
            Err(e) => {
                warn!(
                    word_id = %word.id,
                    %date,
                    error = %e,
                    "Failed to finalize word, will retry on next tick"
                );
            }
        }
    }

    Ok(finalized_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::repository::InMemoryLeaderboardRepository;
    use crate::word::models::WordChallenge;
    use crate::word::repository::InMemoryWordRepository;

    fn yesterday() -> NaiveDate {
        Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap()
    }

    fn setup(words: Vec<WordChallenge>) -> (Arc<dyn WordRepository>, Arc<LeaderboardService>) {
        let word_repo: Arc<dyn WordRepository> =
            Arc::new(InMemoryWordRepository::with_words(words));
        let service = Arc::new(LeaderboardService::new(Arc::new(
            InMemoryLeaderboardRepository::new(),
        )));
        (word_repo, service)
    }

    #[tokio::test]
    async fn finalizes_every_word_scheduled_yesterday() {
        let day = yesterday();
        let (words, service) = setup(vec![
            WordChallenge::new("word-1".to_string(), day),
            WordChallenge::new("word-2".to_string(), day),
            WordChallenge::new("word-today".to_string(), Utc::now().date_naive()),
        ]);

        let finalized = run_daily_finalization(&words, &service, day).await.unwrap();
        assert_eq!(finalized, 2);

        assert!(service.is_finalized("word-1", day).await.unwrap());
        assert!(service.is_finalized("word-2", day).await.unwrap());
        assert!(!service.is_finalized("word-today", day).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_invocation_is_a_safe_noop() {
        let day = yesterday();
        let (words, service) = setup(vec![WordChallenge::new("word-1".to_string(), day)]);

        let first = run_daily_finalization(&words, &service, day).await.unwrap();
        let second = run_daily_finalization(&words, &service, day).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1, "re-finalizing is a counted no-op, not an error");
    }

    #[tokio::test]
    async fn empty_schedule_finalizes_nothing() {
        let (words, service) = setup(vec![]);

        let finalized = run_daily_finalization(&words, &service, yesterday())
            .await
            .unwrap();
        assert_eq!(finalized, 0);
    }
}
