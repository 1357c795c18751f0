use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::StreakRecord;

/// Response structure for the streak endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct StreakResponse {
    pub player_id: String,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_win_date: Option<NaiveDate>,
}

impl From<StreakRecord> for StreakResponse {
    fn from(record: StreakRecord) -> Self {
        Self {
            player_id: record.player_id,
            current_streak: record.current_streak,
            best_streak: record.best_streak,
            last_win_date: record.last_win_date,
        }
    }
}
