pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;

pub use models::CompletionRecord;
pub use repository::{CompletionRepository, InMemoryCompletionRepository};
pub use service::CompletionService;
pub use types::{CompletionEvent, SubmitResponse};
