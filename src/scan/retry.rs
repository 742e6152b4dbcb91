//! Retry with capped exponential backoff.

use crate::config::ScanConfig;
use crate::error::ScanErrorKind;

/// Outcome of one failed attempt
#[derive(Debug)]
pub enum AttemptError {
    /// Transient failure; try again after a backoff
    Retryable(ScanErrorKind),
    /// Permanent failure; give up now
    Fatal(ScanErrorKind),
}

/// HTTP statuses worth retrying: 408, 429, 502 and 504
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 502 | 504)
}

/// Run `op` until it succeeds, fails fatally, or `max_retries` retries are spent.
///
/// Retry `n` (0-based) waits `base_backoff * 2^n`, capped at `max_backoff`.
pub fn with_retry<T>(
    config: &ScanConfig,
    what: &str,
    mut op: impl FnMut() -> Result<T, AttemptError>,
) -> Result<T, ScanErrorKind> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(kind)) => return Err(kind),
            Err(AttemptError::Retryable(kind)) => {
                if attempt >= config.max_retries {
                    return Err(kind);
                }
                let delay = config.backoff(attempt);
                tracing::debug!(
                    "{} attempt {} failed ({}); retrying after {:?}",
                    what,
                    attempt + 1,
                    kind,
                    delay
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}
