// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded retries for handle operations.

use std::time::Duration;

use cachalot_tier::{Error, ErrorKind};
use ohno::EnrichableExt;
use recoverable::{Recovery, RecoveryKind};
use tick::{Clock, FutureExt};

const DEFAULT_MAX_RETRIES: u32 = 50;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_BACKOFF: Duration = Duration::from_millis(10);

/// How a manager retries a handle operation that fails transiently.
///
/// An operation runs once and is retried up to `max_retries` more times while it
/// fails with a retryable error. The `timeout` is a cumulative budget for all
/// attempts and the sleeps between them; whichever bound is hit first ends the
/// loop. Retries stop at once on errors that are not retryable.
///
/// The policy is stateless: every call starts from a fresh budget.
///
/// # Examples
///
/// ```
/// use cachalot::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(500)).with_backoff(Duration::from_millis(20));
/// assert_eq!(policy.max_retries(), 3);
/// assert_eq!(policy.timeout(), Duration::from_millis(500));
/// assert_eq!(policy.backoff(), Duration::from_millis(20));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    timeout: Duration,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Names the handle on whose behalf a retry loop runs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryScope<'a> {
    pub cache: &'a str,
    pub handle: &'a str,
}

impl RetryScope<'_> {
    const UNNAMED: RetryScope<'static> = RetryScope { cache: "", handle: "" };
}

impl RetryPolicy {
    /// Creates a policy with the default backoff.
    #[must_use]
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Creates a policy that runs every operation exactly once.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns how many times a failing operation is retried.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the cumulative time budget of one retried operation.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the pause between attempts.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Runs `operation` under this policy.
    ///
    /// Each attempt is bounded by the remaining budget. Retries emit a WARN
    /// `cachalot.retry` event.
    ///
    /// # Errors
    ///
    /// Returns the error of the first attempt that fails with a non-retryable error.
    /// Once retries or the time budget are exhausted, returns an
    /// [`ErrorKind::HandleUnavailable`] error caused by the last failure.
    pub async fn execute<T, F, Fut>(&self, clock: &Clock, operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        self.execute_scoped(clock, RetryScope::UNNAMED, operation).await
    }

    pub(crate) async fn execute_scoped<T, F, Fut>(&self, clock: &Clock, scope: RetryScope<'_>, mut operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let stopwatch = clock.stopwatch();
        let mut attempt: u32 = 0;

        loop {
            let remaining = self.timeout.saturating_sub(stopwatch.elapsed());
            let (error, overran) = match operation().timeout(clock, remaining).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) if error.recovery().kind() != RecoveryKind::Retry => return Err(error),
                Ok(Err(error)) => (error, false),
                Err(_) => (
                    Error::with_kind(ErrorKind::Timeout, "handle operation overran the retry budget"),
                    true,
                ),
            };

            let remaining = self.timeout.saturating_sub(stopwatch.elapsed());
            if overran || attempt >= self.max_retries || remaining.is_zero() {
                return Err(exhausted(error, attempt + 1));
            }

            let delay = self.backoff.min(remaining);
            tracing::event!(
                name: "cachalot.retry",
                tracing::Level::WARN,
                cache.name = scope.cache,
                cache.handle = scope.handle,
                retry.attempt = attempt,
                retry.delay_ns = delay.as_nanos(),
                error.kind = error.kind().as_str(),
            );
            clock.delay(delay).await;
            attempt += 1;

            if self.timeout.saturating_sub(stopwatch.elapsed()).is_zero() {
                return Err(exhausted(error, attempt));
            }
        }
    }
}

fn exhausted(last: Error, attempts: u32) -> Error {
    Error::with_kind(ErrorKind::HandleUnavailable, last).enrich(format!("handle still unavailable after {attempts} attempt(s)"))
}
