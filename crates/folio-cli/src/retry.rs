//! Exponential-backoff retry for store calls that lose a lock race.
//!
//! Only [`Error::is_transient`] failures are retried; domain errors and
//! corrupt data come back on the first attempt.

use std::{future::Future, time::Duration};

use folio_store_sqlite::{Error, Result};
use tracing::warn;

/// Delay before the first retry; doubles on each further attempt.
const BASE_DELAY: Duration = Duration::from_millis(50);

/// Cap on the doubling so the delay stays bounded for large budgets.
const MAX_EXPONENT: u32 = 6;

/// Delay before retry number `attempt` (0-based): 50ms, 100ms, 200ms, ...
pub fn backoff(attempt: u32) -> Duration { BASE_DELAY * 2u32.pow(attempt.min(MAX_EXPONENT)) }

/// Run `op` until it succeeds, fails permanently, or has been retried
/// `max_retries` times.
pub async fn with_retries<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let mut attempt = 0;
  loop {
    match op().await {
      Err(e) if e.is_transient() && attempt < max_retries => {
        let delay = backoff(attempt);
        warn!(
          attempt = attempt + 1,
          max_retries,
          delay_ms = delay.as_millis() as u64,
          error = %e,
          "store busy, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(e) => return Err(give_up(e, attempt)),
      Ok(out) => return Ok(out),
    }
  }
}

fn give_up(e: Error, attempts: u32) -> Error {
  if attempts > 0 && e.is_transient() {
    tracing::error!(attempts, error = %e, "store still busy after all retries");
  }
  e
}
