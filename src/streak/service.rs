use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::models::StreakRecord;
use super::repository::StreakRepository;
use crate::shared::AppError;

/// Service applying completion outcomes to player streaks.
///
/// Driven synchronously by the completion ingestor for every accepted event,
/// win or loss. The streak day is the word's scheduled date, so completing
/// yesterday's puzzle counts toward yesterday.
pub struct StreakService {
    repository: Arc<dyn StreakRepository>,
}

impl StreakService {
    pub fn new(repository: Arc<dyn StreakRepository>) -> Self {
        Self { repository }
    }

    /// Records a win or loss for the given game day and returns the updated
    /// streak record.
    #[instrument(skip(self))]
    pub async fn record_result(
        &self,
        player_id: &str,
        game_date: NaiveDate,
        won: bool,
    ) -> Result<StreakRecord, AppError> {
        let record = if won {
            self.repository.apply_win(player_id, game_date).await?
        } else {
            self.repository.apply_loss(player_id).await?
        };

        debug!(
            player_id = %player_id,
            won,
            current_streak = record.current_streak,
            "Streak updated"
        );
        Ok(record)
    }

    /// Current streak for a player; players who never played get the zero
    /// record rather than an error.
    #[instrument(skip(self))]
    pub async fn get_streak(&self, player_id: &str) -> Result<StreakRecord, AppError> {
        Ok(self
            .repository
            .get(player_id)
            .await?
            .unwrap_or_else(|| StreakRecord::new(player_id.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streak::repository::InMemoryStreakRepository;

    fn service() -> StreakService {
        StreakService::new(Arc::new(InMemoryStreakRepository::new()))
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[tokio::test]
    async fn win_on_consecutive_days_extends_streak_by_one() {
        let service = service();

        service.record_result("alice", date(10), true).await.unwrap();
        let record = service.record_result("alice", date(11), true).await.unwrap();

        assert_eq!(record.current_streak, 2);
        assert_eq!(record.best_streak, 2);
    }

    #[tokio::test]
    async fn win_after_gap_resets_to_one() {
        let service = service();

        service.record_result("alice", date(10), true).await.unwrap();
        let record = service.record_result("alice", date(13), true).await.unwrap();

        assert_eq!(record.current_streak, 1);
        assert_eq!(record.best_streak, 1);
    }

    #[tokio::test]
    async fn loss_zeroes_current_and_keeps_best() {
        let service = service();

        service.record_result("alice", date(10), true).await.unwrap();
        service.record_result("alice", date(11), true).await.unwrap();
        let record = service.record_result("alice", date(12), false).await.unwrap();

        assert_eq!(record.current_streak, 0);
        assert_eq!(record.best_streak, 2);
        assert_eq!(record.last_win_date, Some(date(11)));
    }

    #[tokio::test]
    async fn unknown_player_gets_zero_record() {
        let service = service();

        let record = service.get_streak("nobody").await.unwrap();
        assert_eq!(record.current_streak, 0);
        assert_eq!(record.best_streak, 0);
        assert_eq!(record.last_win_date, None);
    }
}
