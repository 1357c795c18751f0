//! Pure score calculation for a finished word attempt.
//!
//! The score rewards fast, low-guess solves and grants partial credit for
//! fuzzy (near-miss) matches. All arithmetic saturates so a pathological
//! payload can never overflow, and the result is clamped to `0..=MAX_SCORE`.

/// Highest score a single completion can earn.
pub const MAX_SCORE: i32 = 1000;

/// Points deducted for every guess after the first.
const GUESS_PENALTY: i32 = 40;

/// Points deducted per full second of elapsed time.
const SECOND_PENALTY: i32 = 1;

/// Points awarded per fuzzy match.
const FUZZY_BONUS: i32 = 15;

/// Computes the score for a winning completion.
///
/// Losses are never scored for ranking purposes; callers still record a zero
/// score on the completion record for bookkeeping.
pub fn compute_score(guess_count: u32, elapsed_seconds: u32, fuzzy_matches: u32) -> i32 {
    let extra_guesses = guess_count.saturating_sub(1).min(i32::MAX as u32) as i32;
    let elapsed = elapsed_seconds.min(i32::MAX as u32) as i32;
    let fuzzy = fuzzy_matches.min(i32::MAX as u32) as i32;

    MAX_SCORE
        .saturating_sub(extra_guesses.saturating_mul(GUESS_PENALTY))
        .saturating_sub(elapsed.saturating_mul(SECOND_PENALTY))
        .saturating_add(fuzzy.saturating_mul(FUZZY_BONUS))
        .clamp(0, MAX_SCORE)
}
