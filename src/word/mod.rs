pub mod models;
pub mod repository;

pub use models::WordChallenge;
pub use repository::{InMemoryWordRepository, WordRepository};
