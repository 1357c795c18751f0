use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The single authoritative streak record per player.
///
/// A streak only advances when a win lands exactly one calendar day after
/// the last recorded win. Skipped days are detected retroactively on the
/// next play; there is deliberately no background job breaking streaks for
/// idle players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub player_id: String,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_win_date: Option<NaiveDate>,
}

impl StreakRecord {
    pub fn new(player_id: String) -> Self {
        Self {
            player_id,
            current_streak: 0,
            best_streak: 0,
            last_win_date: None,
        }
    }

    /// Applies a win dated `date`.
    ///
    /// Same-day replays change nothing; a win on the day after the last win
    /// extends the streak; any other date starts a fresh streak of 1.
    pub fn apply_win(&mut self, date: NaiveDate) {
        if self.last_win_date == Some(date) {
            return;
        }

        let adjacent = self.last_win_date.and_then(|d| d.succ_opt()) == Some(date);
        self.current_streak = if adjacent { self.current_streak + 1 } else { 1 };
        self.last_win_date = Some(date);
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    /// Applies a loss: the current streak ends, the best streak and last win
    /// date are untouched.
    pub fn apply_loss(&mut self) {
        self.current_streak = 0;
    }
}
