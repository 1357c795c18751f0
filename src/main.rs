use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordrank::schedule::{start_finalize_task, FinalizeTaskConfig};
use wordrank::word::{InMemoryWordRepository, WordChallenge, WordRepository};
use wordrank::{in_memory_state, router};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordrank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting word ranking server");

    // Seed today's word so the server runs stand-alone; the real word feed
    // comes from the upstream content service.
    let today = Utc::now().date_naive();
    let word_repository: Arc<dyn WordRepository> =
        Arc::new(InMemoryWordRepository::with_words(vec![WordChallenge::new(
            format!("daily-{}", today),
            today,
        )]));

    // Create shared application state with dependency injection.
    // Easy to switch between implementations:
    let app_state = in_memory_state(Arc::clone(&word_repository));

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let leaderboard_repository = Arc::new(PostgresLeaderboardRepository::new(pool.clone()));
    // let streak_repository = Arc::new(PostgresStreakRepository::new(pool));

    // Background finalization of the previous day. The self-healing
    // historical read covers any day this task misses.
    tokio::spawn(start_finalize_task(
        Arc::clone(&word_repository),
        Arc::clone(&app_state.leaderboard_service),
        FinalizeTaskConfig::default(),
    ));

    let app = router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
