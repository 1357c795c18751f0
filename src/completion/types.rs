use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finished-session payload handed over by the game engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub player_id: String,
    pub word_id: String,
    pub won: bool,
    pub guess_count: u32,
    pub elapsed_seconds: u32,
    pub fuzzy_matches: u32,
    pub completed_at: DateTime<Utc>,
}

/// Response structure for completion submission.
///
/// A rejected submission is an explicit `accepted: false` with a reason,
/// never a silent success. Streak fields always reflect the player's state
/// after the event was (or was not) applied.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_fields_are_omitted_when_absent() {
        let response = SubmitResponse {
            accepted: true,
            reason: None,
            rank: Some(3),
            current_streak: 2,
            best_streak: 5,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"rank\":3"));
        assert!(!json.contains("reason"));
    }

    #[test]
    fn completion_event_round_trips_through_json() {
        let json = r#"{
            "player_id": "alice",
            "word_id": "word-1",
            "won": true,
            "guess_count": 3,
            "elapsed_seconds": 42,
            "fuzzy_matches": 1,
            "completed_at": "2026-08-27T10:15:00Z"
        }"#;

        let event: CompletionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.player_id, "alice");
        assert_eq!(event.guess_count, 3);
        assert!(event.won);
    }
}
