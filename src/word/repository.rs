use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::WordChallenge;
use crate::shared::AppError;

/// Trait for looking up word challenges.
///
/// Word creation belongs to the upstream content service; a missing word is
/// a hard dependency failure for this subsystem.
#[async_trait]
pub trait WordRepository: Send + Sync {
    async fn get_word(&self, word_id: &str) -> Result<Option<WordChallenge>, AppError>;

    /// All words scheduled on the given date, used by the daily finalizer.
    async fn words_for_date(&self, date: NaiveDate) -> Result<Vec<WordChallenge>, AppError>;

    async fn add_word(&self, word: &WordChallenge) -> Result<(), AppError>;
}

/// In-memory implementation of WordRepository for development and testing
pub struct InMemoryWordRepository {
    words: Mutex<HashMap<String, WordChallenge>>,
}

impl Default for InMemoryWordRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWordRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            words: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository pre-populated with words
    pub fn with_words(words: Vec<WordChallenge>) -> Self {
        let mut word_map = HashMap::new();
        for word in words {
            word_map.insert(word.id.clone(), word);
        }

        Self {
            words: Mutex::new(word_map),
        }
    }
}

#[async_trait]
impl WordRepository for InMemoryWordRepository {
    #[instrument(skip(self))]
    async fn get_word(&self, word_id: &str) -> Result<Option<WordChallenge>, AppError> {
        let words = self.words.lock().unwrap();
        let word = words.get(word_id).cloned();

        if word.is_none() {
            debug!(word_id = %word_id, "Word not found");
        }

        Ok(word)
    }

    #[instrument(skip(self))]
    async fn words_for_date(&self, date: NaiveDate) -> Result<Vec<WordChallenge>, AppError> {
        let words = self.words.lock().unwrap();
        let matches: Vec<WordChallenge> = words
            .values()
            .filter(|w| w.scheduled_date == date)
            .cloned()
            .collect();

        debug!(%date, count = matches.len(), "Listed words scheduled for date");
        Ok(matches)
    }

    #[instrument(skip(self, word))]
    async fn add_word(&self, word: &WordChallenge) -> Result<(), AppError> {
        let mut words = self.words.lock().unwrap();
        if words.contains_key(&word.id) {
            warn!(word_id = %word.id, "Word already registered");
            return Err(AppError::DatabaseError("Word already exists".to_string()));
        }
        words.insert(word.id.clone(), word.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn preloaded_words_are_retrievable() {
        let repo = InMemoryWordRepository::with_words(vec![
            WordChallenge::new("word-1".to_string(), date(2026, 8, 1)),
            WordChallenge::new("word-2".to_string(), date(2026, 8, 2)),
        ]);

        let word = repo.get_word("word-1").await.unwrap().unwrap();
        assert_eq!(word.scheduled_date, date(2026, 8, 1));

        assert!(repo.get_word("word-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn words_for_date_filters_by_schedule() {
        let repo = InMemoryWordRepository::with_words(vec![
            WordChallenge::new("word-1".to_string(), date(2026, 8, 1)),
            WordChallenge::new("word-2".to_string(), date(2026, 8, 1)),
            WordChallenge::new("word-3".to_string(), date(2026, 8, 2)),
        ]);

        let words = repo.words_for_date(date(2026, 8, 1)).await.unwrap();
        assert_eq!(words.len(), 2);

        let words = repo.words_for_date(date(2026, 8, 3)).await.unwrap();
        assert!(words.is_empty());
    }

    #[tokio::test]
    async fn duplicate_word_registration_fails() {
        let repo = InMemoryWordRepository::new();
        let word = WordChallenge::new("word-1".to_string(), date(2026, 8, 1));

        repo.add_word(&word).await.unwrap();
        let result = repo.add_word(&word).await;

        assert!(matches!(result.unwrap_err(), AppError::DatabaseError(_)));
    }
}
