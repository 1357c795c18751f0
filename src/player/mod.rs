pub mod models;
pub mod repository;

pub use models::Player;
pub use repository::{InMemoryPlayerRepository, PlayerRepository};
