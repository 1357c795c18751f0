use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::CompletionEvent;

/// Outcome of one attempt at a word, owned by the completion ingestor.
///
/// At most one record is kept per (player, word): a winning record is only
/// superseded by a strictly better win, never by a loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: String,
    pub player_id: String,
    pub word_id: String,
    pub won: bool,
    pub guess_count: u32,
    pub elapsed_seconds: u32,
    pub fuzzy_matches: u32,
    pub score: i32,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn from_event(event: &CompletionEvent, score: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            player_id: event.player_id.clone(),
            word_id: event.word_id.clone(),
            won: event.won,
            guess_count: event.guess_count,
            elapsed_seconds: event.elapsed_seconds,
            fuzzy_matches: event.fuzzy_matches,
            score,
            completed_at: event.completed_at,
        }
    }

    /// Whether this record should replace `other` as the best-known outcome
    /// for the pair: wins beat losses, faster wins beat slower ones, and a
    /// newer loss replaces an older loss.
    pub fn supersedes(&self, other: &CompletionRecord) -> bool {
        match (self.won, other.won) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => {
                (self.elapsed_seconds, self.guess_count)
                    < (other.elapsed_seconds, other.guess_count)
            }
            (false, false) => self.completed_at >= other.completed_at,
        }
    }
}
