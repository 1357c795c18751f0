// End-to-end workflow tests driving the HTTP router:
// submission -> live ranking -> finalization -> historical reads -> streaks.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Days, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use wordrank::word::{InMemoryWordRepository, WordChallenge};
use wordrank::{in_memory_state, router};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn days_ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

/// Builds an app with one word for today and words for the two previous days.
fn test_app() -> Router {
    let words = Arc::new(InMemoryWordRepository::with_words(vec![
        WordChallenge::new("word-today".to_string(), today()),
        WordChallenge::new("word-past".to_string(), days_ago(1)),
        WordChallenge::new("word-older".to_string(), days_ago(2)),
        WordChallenge::new("word-quiet".to_string(), days_ago(1)),
    ]));
    router(in_memory_state(words))
}

fn completion(player: &str, word: &str, won: bool, elapsed: u32, guesses: u32) -> String {
    serde_json::json!({
        "player_id": player,
        "word_id": word,
        "won": won,
        "guess_count": guesses,
        "elapsed_seconds": elapsed,
        "fuzzy_matches": 0,
        "completed_at": Utc::now(),
    })
    .to_string()
}

async fn post_json(app: &Router, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn live_ranking_workflow_with_reordering() {
    let app = test_app();

    // A: 30s/2 guesses, B: 45s/2 guesses.
    let (status, body) = post_json(
        &app,
        "/completions",
        completion("player-a", "word-today", true, 30, 2),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["rank"], 1);

    let (_, body) = post_json(
        &app,
        "/completions",
        completion("player-b", "word-today", true, 45, 2),
    )
    .await;
    assert_eq!(body["rank"], 2);

    // C: 20s/3 guesses takes the lead; time beats guesses.
    let (_, body) = post_json(
        &app,
        "/completions",
        completion("player-c", "word-today", true, 20, 3),
    )
    .await;
    assert_eq!(body["rank"], 1);

    let (status, board) = get_json(&app, "/leaderboard/word-today").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["is_finalized"], false);

    let entries = board["entries"].as_array().unwrap();
    let order: Vec<&str> = entries
        .iter()
        .map(|e| e["player_id"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["player-c", "player-a", "player-b"]);
    let ranks: Vec<i64> = entries.iter().map(|e| e["rank"].as_i64().unwrap()).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn replaying_the_same_completion_changes_nothing() {
    let app = test_app();
    let submission = completion("player-a", "word-today", true, 30, 2);

    let (_, first) = post_json(&app, "/completions", submission.clone()).await;
    assert_eq!(first["accepted"], true);

    let (status, replay) = post_json(&app, "/completions", submission).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["accepted"], false);
    assert!(replay["reason"].as_str().unwrap().contains("already recorded"));

    let (_, board) = get_json(&app, "/leaderboard/word-today").await;
    assert_eq!(board["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn losses_are_accepted_but_never_ranked() {
    let app = test_app();

    let (status, body) = post_json(
        &app,
        "/completions",
        completion("player-a", "word-today", false, 120, 6),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert!(body.get("rank").is_none() || body["rank"].is_null());
    assert_eq!(body["current_streak"], 0);

    let (_, board) = get_json(&app, "/leaderboard/word-today").await;
    assert!(board["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_submissions_resolve_to_contiguous_ranks() {
    let app = test_app();
    let n = 8;

    let handles = (0..n)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = completion(
                    &format!("racer-{}", i),
                    "word-today",
                    true,
                    30 + i as u32,
                    2,
                );
                let request = Request::builder()
                    .method("POST")
                    .uri("/completions")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap();
                app.oneshot(request).await.unwrap().status()
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, board) = get_json(&app, "/leaderboard/word-today").await;
    let entries = board["entries"].as_array().unwrap();
    assert_eq!(entries.len(), n);

    let ranks: HashSet<i64> = entries.iter().map(|e| e["rank"].as_i64().unwrap()).collect();
    let expected: HashSet<i64> = (1..=n as i64).collect();
    assert_eq!(ranks, expected, "ranks must be exactly 1..=N with no gaps");
}

#[tokio::test]
async fn finalization_freezes_yesterday_for_good() {
    let app = test_app();
    let yesterday = days_ago(1);

    post_json(
        &app,
        "/completions",
        completion("player-a", "word-past", true, 30, 2),
    )
    .await;
    post_json(
        &app,
        "/completions",
        completion("player-b", "word-past", true, 45, 2),
    )
    .await;

    let finalize_body =
        serde_json::json!({ "word_id": "word-past", "date": yesterday }).to_string();

    let (status, body) = post_json(&app, "/admin/finalize", finalize_body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["finalized"], true);
    assert_eq!(body["already_finalized"], false);

    // Duplicate scheduler invocation: safe no-op.
    let (_, body) = post_json(&app, "/admin/finalize", finalize_body).await;
    assert_eq!(body["already_finalized"], true);

    // Two historical reads return byte-identical rankings.
    let uri = format!("/leaderboard/word-past?date={}", yesterday);
    let (_, first_read) = get_json(&app, &uri).await;
    let (_, second_read) = get_json(&app, &uri).await;
    assert_eq!(first_read, second_read);
    assert_eq!(first_read["is_finalized"], true);
    assert_eq!(first_read["entries"].as_array().unwrap().len(), 2);

    // A late completion for the frozen day is explicitly rejected and the
    // snapshot never changes.
    let (status, late) = post_json(
        &app,
        "/completions",
        completion("player-late", "word-past", true, 5, 1),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(late["accepted"], false);

    let (_, after) = get_json(&app, &uri).await;
    assert_eq!(after, first_read);
}

#[tokio::test]
async fn missed_day_is_healed_on_first_historical_read() {
    let app = test_app();
    let yesterday = days_ago(1);

    // No completions and no scheduler run for word-quiet.
    let uri = format!("/leaderboard/word-quiet?date={}", yesterday);
    let (status, board) = get_json(&app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["is_finalized"], true);
    assert!(board["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn streaks_follow_wins_and_losses_across_days() {
    let app = test_app();

    // Win the word from two days ago, then yesterday's: adjacent days.
    let (_, body) = post_json(
        &app,
        "/completions",
        completion("player-a", "word-older", true, 40, 3),
    )
    .await;
    assert_eq!(body["current_streak"], 1);

    let (_, body) = post_json(
        &app,
        "/completions",
        completion("player-a", "word-past", true, 35, 2),
    )
    .await;
    assert_eq!(body["current_streak"], 2);
    assert_eq!(body["best_streak"], 2);

    // Losing today's word ends the run but keeps the best streak.
    let (_, body) = post_json(
        &app,
        "/completions",
        completion("player-a", "word-today", false, 200, 6),
    )
    .await;
    assert_eq!(body["current_streak"], 0);
    assert_eq!(body["best_streak"], 2);

    let (status, streak) = get_json(&app, "/streaks/player-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(streak["current_streak"], 0);
    assert_eq!(streak["best_streak"], 2);
}

#[tokio::test]
async fn streak_resets_after_a_gap() {
    let app = test_app();

    // Win two days ago, skip yesterday, win today: the gap is detected on
    // the next play, and the streak restarts at 1.
    post_json(
        &app,
        "/completions",
        completion("player-b", "word-older", true, 40, 3),
    )
    .await;

    let (_, body) = post_json(
        &app,
        "/completions",
        completion("player-b", "word-today", true, 25, 2),
    )
    .await;
    assert_eq!(body["current_streak"], 1);
    assert_eq!(body["best_streak"], 1);
}

#[tokio::test]
async fn malformed_submission_is_a_bad_request() {
    let app = test_app();

    let (status, body) = post_json(
        &app,
        "/completions",
        completion("player-a", "word-today", true, 30, 0),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("guess_count"));

    // Values past the i32 column range would wrap negative and jump the
    // rankings; they must bounce at validation.
    let (status, body) = post_json(
        &app,
        "/completions",
        completion("player-a", "word-today", true, 4_000_000_000, 2),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("elapsed_seconds"));

    let (_, board) = get_json(&app, "/leaderboard/word-today").await;
    assert!(board["entries"].as_array().unwrap().is_empty());
}
