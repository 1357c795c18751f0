use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

use super::models::Player;
use crate::shared::AppError;

/// Trait for player identity storage.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Returns the existing player or atomically creates one.
    ///
    /// Completion ingestion depends on this succeeding before any leaderboard
    /// write, so the create must never be partially applied.
    async fn get_or_create(&self, player_id: &str) -> Result<Player, AppError>;

    async fn get(&self, player_id: &str) -> Result<Option<Player>, AppError>;
}

/// In-memory implementation of PlayerRepository for development and testing
pub struct InMemoryPlayerRepository {
    players: Mutex<HashMap<String, Player>>,
}

impl Default for InMemoryPlayerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.lock().unwrap().len()
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    #[instrument(skip(self))]
    async fn get_or_create(&self, player_id: &str) -> Result<Player, AppError> {
        let mut players = self.players.lock().unwrap();
        let player = players
            .entry(player_id.to_string())
            .or_insert_with(|| {
                debug!(player_id = %player_id, "Creating player on first completion");
                Player::new(player_id.to_string())
            })
            .clone();
        Ok(player)
    }

    #[instrument(skip(self))]
    async fn get(&self, player_id: &str) -> Result<Option<Player>, AppError> {
        let players = self.players.lock().unwrap();
        Ok(players.get(player_id).cloned())
    }
}
