//! Retry loop for transport failures.
//!
//! Retries exponential-backoff from 100 ms up to the request's configured
//! cap, with jitter so simultaneous scenarios do not stampede. Only
//! transport failures qualify; a completed HTTP exchange of any status is
//! final.

use super::error::RequestError;
use super::execute;
use crate::models::{ApiResponse, RequestSpec};
use log::warn;
use rand::Rng;
use std::thread;
use std::time::Duration;

/// First backoff delay; doubles per attempt until the cap.
const BASE_BACKOFF_MS: u64 = 100;

/// Executes a request, retrying transport failures per its settings.
///
/// With no retry settings, or with retries disabled, the request runs
/// exactly once. Otherwise up to `max_count` additional attempts follow
/// the first failure, each after an exponentially growing delay capped
/// at `max_backoff_ms`. The last failure is returned when every attempt
/// is spent.
///
/// # Arguments
///
/// * `spec` - The request description
/// * `correlation_id` - Id stamped on the response and every log line
pub fn execute_with_retry(
    spec: &RequestSpec,
    correlation_id: &str,
) -> Result<ApiResponse, RequestError> {
    let retry = spec.retry.filter(|r| r.enabled);
    let max_retries = retry.map(|r| r.max_count).unwrap_or(0);
    let max_backoff_ms = retry.map(|r| r.max_backoff_ms).unwrap_or(0);

    let mut attempt = 0u32;
    loop {
        match execute(spec, correlation_id) {
            Ok(response) => return Ok(response),
            Err(err) => {
                if !err.is_retryable() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(attempt, max_backoff_ms);
                warn!(
                    "[{}] attempt {} failed ({}), retrying in {:?}",
                    correlation_id, attempt, err, delay
                );
                thread::sleep(delay);
            }
        }
    }
}

/// Delay before the given retry attempt (1-based).
///
/// Doubles from the base delay, saturates at the cap (never below the
/// base), and shaves off up to a tenth as jitter.
fn backoff_delay(attempt: u32, max_backoff_ms: u64) -> Duration {
    let exponential = BASE_BACKOFF_MS.saturating_mul(1u64 << (attempt - 1).min(16));
    let capped = exponential.min(max_backoff_ms.max(BASE_BACKOFF_MS));
    let jitter = rand::thread_rng().gen_range(0..=capped / 10);
    Duration::from_millis(capped - jitter)
}
