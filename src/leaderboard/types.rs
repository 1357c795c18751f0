use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Query parameters for the leaderboard endpoint. An omitted date means
/// "today" (the live, still-mutable board).
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub date: Option<NaiveDate>,
}

/// One ranked line in a leaderboard response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntryView {
    pub player_id: String,
    pub rank: i32,
    pub guess_count: i32,
    pub elapsed_seconds: i32,
    pub score: i32,
}

/// Response structure for leaderboard reads, live or finalized.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub word_id: String,
    pub date: NaiveDate,
    pub is_finalized: bool,
    pub entries: Vec<LeaderboardEntryView>,
}

/// Administrative finalize request, normally issued by the scheduler.
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub word_id: String,
    pub date: NaiveDate,
}

/// Response structure for the finalize endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub finalized: bool,
    pub already_finalized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_response_serializes_dates_as_iso() {
        let response = LeaderboardResponse {
            word_id: "word-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
            is_finalized: true,
            entries: vec![],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("2026-08-27"));
        assert!(json.contains("\"is_finalized\":true"));
    }
}
