pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;

pub use models::StreakRecord;
pub use repository::{InMemoryStreakRepository, PostgresStreakRepository, StreakRepository};
pub use service::StreakService;
