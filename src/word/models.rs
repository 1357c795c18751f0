use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily puzzle reference supplied by the word/content service.
///
/// This subsystem treats the word as an opaque foreign key; only the id and
/// the day it was scheduled for matter to ranking and finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordChallenge {
    pub id: String,
    pub scheduled_date: NaiveDate,
}

impl WordChallenge {
    pub fn new(id: String, scheduled_date: NaiveDate) -> Self {
        Self { id, scheduled_date }
    }
}
