use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player identity record.
///
/// Created lazily the first time a completion arrives for an unknown player
/// id, and never deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Creates a player with an auto-assigned display name derived from the
    /// id. Profile management lives outside this subsystem, so the name is
    /// only a readable placeholder.
    pub fn new(id: String) -> Self {
        let short = id.chars().take(8).collect::<String>();
        Self {
            display_name: format!("player-{}", short),
            id,
            created_at: Utc::now(),
        }
    }
}
