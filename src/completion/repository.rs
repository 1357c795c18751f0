use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

use super::models::CompletionRecord;
use crate::shared::AppError;

/// Trait for completion record storage.
///
/// Keeps the best-known outcome per (player, word); superseding rules live
/// on the record itself.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    async fn record_attempt(&self, record: &CompletionRecord) -> Result<(), AppError>;

    async fn get_attempt(
        &self,
        player_id: &str,
        word_id: &str,
    ) -> Result<Option<CompletionRecord>, AppError>;
}

/// In-memory implementation of CompletionRepository for development and
/// testing
pub struct InMemoryCompletionRepository {
    records: Mutex<HashMap<(String, String), CompletionRecord>>,
}

impl Default for InMemoryCompletionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCompletionRepository {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CompletionRepository for InMemoryCompletionRepository {
    #[instrument(skip(self, record), fields(player_id = %record.player_id, word_id = %record.word_id))]
    async fn record_attempt(&self, record: &CompletionRecord) -> Result<(), AppError> {
        let mut records = self.records.lock().unwrap();
        let key = (record.player_id.clone(), record.word_id.clone());

        match records.get(&key) {
            Some(existing) if !record.supersedes(existing) => {
                debug!("Existing completion record kept");
            }
            _ => {
                records.insert(key, record.clone());
                debug!(won = record.won, "Completion record stored");
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_attempt(
        &self,
        player_id: &str,
        word_id: &str,
    ) -> Result<Option<CompletionRecord>, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(&(player_id.to_string(), word_id.to_string()))
            .cloned())
    }
}
