//! Retry state machine with exponential backoff
//!
//! A logical call moves through `Idle → Attempting → {Success | RetryScheduled
//! | Exhausted}`. Transient failures are re-attempted up to a fixed budget of
//! three attempts, sleeping 1s, 2s, 4s… between them. The last observed error
//! is always surfaced unchanged.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Total attempts per logical call, including the first one
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles for every following one
pub const BASE_DELAY: Duration = Duration::from_secs(1);

/// Phase of a single logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    Idle,
    Attempting,
    RetryScheduled,
    Success,
    Exhausted,
}

/// Backoff and attempt budget shared by every call of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub const fn standard() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: BASE_DELAY,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay inserted after failed attempt number `attempt` (1-based):
    /// `base * 2^(attempt-1)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Fresh state for a new logical call
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            phase: RetryPhase::Idle,
            attempt: 0,
            last_error: None,
            next_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Outcome of feeding a failure into [`RetryState::on_failure`]
#[derive(Debug)]
pub enum Transition {
    /// Sleep for the delay, then attempt again
    Retry(Duration),
    /// Give up and hand this error to the caller
    Exhausted(Error),
}

/// Per-call retry bookkeeping. Never shared between calls.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    phase: RetryPhase,
    attempt: u32,
    last_error: Option<Error>,
    next_delay: Duration,
}

impl RetryState {
    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// Number of attempts started so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    /// Error that caused the currently scheduled retry
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Enter `Attempting` and return the 1-based attempt number
    pub fn begin_attempt(&mut self) -> u32 {
        debug_assert!(matches!(
            self.phase,
            RetryPhase::Idle | RetryPhase::RetryScheduled
        ));
        self.attempt += 1;
        self.phase = RetryPhase::Attempting;
        self.attempt
    }

    pub fn on_success(&mut self) {
        self.phase = RetryPhase::Success;
        self.last_error = None;
    }

    /// Classify a failed attempt
    pub fn on_failure(&mut self, error: Error) -> Transition {
        if error.is_retryable() && self.attempt < self.policy.max_attempts {
            let delay = self.policy.backoff(self.attempt);
            tracing::warn!(
                attempt = self.attempt,
                max_attempts = self.policy.max_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after transient error"
            );
            self.phase = RetryPhase::RetryScheduled;
            self.next_delay = delay;
            self.last_error = Some(error);
            Transition::Retry(delay)
        } else {
            tracing::debug!(
                attempt = self.attempt,
                retryable = error.is_retryable(),
                error = %error,
                "Giving up"
            );
            self.phase = RetryPhase::Exhausted;
            self.next_delay = Duration::ZERO;
            self.last_error = None;
            Transition::Exhausted(error)
        }
    }
}

/// Drive an async operation through the retry state machine.
///
/// `operation` receives the 1-based attempt number. Attempts are strictly
/// sequential. Dropping the returned future cancels the call at whatever
/// suspension point it is parked on, including the backoff sleep.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut state = policy.start();

    loop {
        let attempt = state.begin_attempt();

        match operation(attempt).await {
            Ok(value) => {
                state.on_success();
                return Ok(value);
            }
            Err(e) => match state.on_failure(e) {
                Transition::Exhausted(e) => return Err(e),
                Transition::Retry(delay) => tokio::time::sleep(delay).await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::{ApiError, TransportErrorKind};

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::standard();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn test_state_transitions() {
        let policy = RetryPolicy::standard();
        let mut state = policy.start();
        assert_eq!(state.phase(), RetryPhase::Idle);

        assert_eq!(state.begin_attempt(), 1);
        assert_eq!(state.phase(), RetryPhase::Attempting);

        let transition = state.on_failure(ApiError::from_status(503, "").into());
        assert!(matches!(transition, Transition::Retry(d) if d == Duration::from_secs(1)));
        assert_eq!(state.phase(), RetryPhase::RetryScheduled);
        assert_eq!(state.last_error().and_then(Error::status), Some(503));

        assert_eq!(state.begin_attempt(), 2);
        let transition = state.on_failure(ApiError::from_status(503, "").into());
        assert!(matches!(transition, Transition::Retry(d) if d == Duration::from_secs(2)));

        assert_eq!(state.begin_attempt(), 3);
        let transition = state.on_failure(ApiError::from_status(503, "last").into());
        match transition {
            Transition::Exhausted(Error::Api(api)) => {
                assert_eq!(api.status, 503);
                assert_eq!(api.body, "last");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(state.phase(), RetryPhase::Exhausted);
    }

    #[test]
    fn test_terminal_failure_short_circuits() {
        let mut state = RetryPolicy::standard().start();
        state.begin_attempt();
        let transition = state.on_failure(ApiError::from_status(404, "").into());
        assert!(matches!(transition, Transition::Exhausted(_)));
        assert_eq!(state.attempt(), 1);
    }

    #[test]
    fn test_success_is_terminal() {
        let mut state = RetryPolicy::standard().start();
        state.begin_attempt();
        state.on_success();
        assert_eq!(state.phase(), RetryPhase::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_first_attempt() {
        let mut calls = 0;

        let result = retry_with_backoff(&RetryPolicy::standard(), |_| {
            calls += 1;
            async { Ok::<_, Error>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failure() {
        let call_count = Arc::new(AtomicU32::new(0));
        let counter = call_count.clone();
        let started = tokio::time::Instant::now();

        let result = retry_with_backoff(&RetryPolicy::standard(), |_| {
            let cc = counter.clone();
            async move {
                let count = cc.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(Error::transport(TransportErrorKind::Timeout, "timeout"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausted_returns_last_error() {
        let mut calls = 0;

        let result: Result<()> = retry_with_backoff(&RetryPolicy::standard(), |attempt| {
            calls += 1;
            async move {
                Err(Error::transport(
                    TransportErrorKind::Connect,
                    format!("refused on attempt {attempt}"),
                ))
            }
        })
        .await;

        assert_eq!(calls, 3);
        match result {
            Err(Error::Transport { message, .. }) => assert_eq!(message, "refused on attempt 3"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_non_retryable() {
        let mut calls = 0;
        let started = tokio::time::Instant::now();

        let result: Result<()> = retry_with_backoff(&RetryPolicy::standard(), |_| {
            calls += 1;
            async { Err(ApiError::from_status(404, "not found").into()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
