//! Human-readable booking codes: `GC` + `yymmdd` + five characters of
//! `[0-9A-Z]`, e.g. `GC2611047Q3ZK`.
//!
//! The suffix is random, so codes can collide. The store holds a unique
//! constraint and [`with_fresh_code`] retries the insert with a new code.

use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;

use crate::core::error::{AppError, Result};

pub const CODE_PREFIX: &str = "GC";
pub const SUFFIX_LEN: usize = 5;
const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `GCyymmdd` for the creation instant as seen in `offset`
pub fn date_prefix(now: DateTime<Utc>, offset: FixedOffset) -> String {
    format!(
        "{}{}",
        CODE_PREFIX,
        now.with_timezone(&offset).format("%y%m%d")
    )
}

pub fn generate<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, offset: FixedOffset) -> String {
    let mut code = date_prefix(now, offset);
    code.extend((0..SUFFIX_LEN).map(|_| {
        let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
        SUFFIX_ALPHABET[idx] as char
    }));
    code
}

/// `count` pairwise distinct codes for the same instant
pub fn generate_batch<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    offset: FixedOffset,
    count: usize,
) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    while codes.len() < count {
        let code = generate(rng, now, offset);
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}

/// Outcome of storing a record under one candidate code
#[derive(Debug)]
pub enum CodeAttempt<T> {
    Stored(T),
    /// The code already belongs to another record
    Taken,
}

/// Run `store` with freshly generated codes until one is free.
///
/// Gives up with `Conflict` after `max_attempts` taken codes. Errors from
/// `store` other than a taken code are returned as they are.
pub async fn with_fresh_code<T, R, F, Fut>(
    rng: &mut R,
    now: DateTime<Utc>,
    offset: FixedOffset,
    max_attempts: u32,
    mut store: F,
) -> Result<T>
where
    R: Rng + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<CodeAttempt<T>>>,
{
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let code = generate(rng, now, offset);
        match store(code.clone()).await? {
            CodeAttempt::Stored(value) => return Ok(value),
            CodeAttempt::Taken => tracing::warn!(
                "Booking code {} already taken (attempt {}/{})",
                code,
                attempt,
                max_attempts
            ),
        }
    }

    Err(AppError::Conflict(
        "Could not allocate a unique booking code, please retry".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 7, 20, 30, 0).unwrap()
    }

    #[test]
    fn test_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = generate(&mut rng, instant(), Utc.fix());

        assert_eq!(code.len(), 2 + 6 + SUFFIX_LEN);
        assert!(code.starts_with("GC260307"));
        assert!(code[8..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_date_follows_configured_offset() {
        // 20:30 UTC is already the next day at +05:30
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(date_prefix(instant(), ist), "GC260308");
        assert_eq!(date_prefix(instant(), Utc.fix()), "GC260307");
    }

    #[test]
    fn test_batch_is_distinct_and_shares_prefix() {
        let mut rng = StdRng::seed_from_u64(42);
        let codes = generate_batch(&mut rng, instant(), Utc.fix(), 500);

        assert_eq!(codes.len(), 500);
        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), 500);
        assert!(codes.iter().all(|c| c.starts_with("GC260307")));
    }

    #[tokio::test]
    async fn test_taken_code_is_retried_with_a_new_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tried = Vec::new();

        let stored = with_fresh_code(&mut rng, instant(), Utc.fix(), 5, |code| {
            tried.push(code.clone());
            let outcome = if tried.len() == 1 {
                CodeAttempt::Taken
            } else {
                CodeAttempt::Stored(code)
            };
            async move { Ok(outcome) }
        })
        .await
        .unwrap();

        assert_eq!(tried.len(), 2);
        assert_ne!(tried[0], tried[1]);
        assert_eq!(stored, tried[1]);
    }

    #[tokio::test]
    async fn test_gives_up_with_conflict_after_max_attempts() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut calls = 0;

        let result: Result<String> = with_fresh_code(&mut rng, instant(), Utc.fix(), 3, |_| {
            calls += 1;
            async { Ok(CodeAttempt::Taken) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut calls = 0;

        let result = with_fresh_code(&mut rng, instant(), Utc.fix(), 0, |code| {
            calls += 1;
            async move { Ok(CodeAttempt::Stored(code)) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_store_errors_are_not_retried() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut calls = 0;

        let result: Result<String> = with_fresh_code(&mut rng, instant(), Utc.fix(), 5, |_| {
            calls += 1;
            async { Err(AppError::Internal("store unavailable".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(calls, 1);
    }
}
