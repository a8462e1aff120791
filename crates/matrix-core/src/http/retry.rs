//! Bounded retry for transient faults
//!
//! One logical call walks the state machine
//!
//! ```text
//! Idle -> Attempting -> Success
//!                    -> TerminalFailure
//!                    -> RetryableFailure -> Attempting ...
//! ```
//!
//! Only `ConnectionFailure` and `Timeout` are retried, immediately and without
//! delay, until the attempt budget of `max_retries + 1` is spent. Every
//! status-derived failure ends the call on the spot.

use std::future::Future;
use std::time::Duration;

use crate::http::classifier::Classified;
use crate::http::error::{ApiError, ErrorKind};

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 means a single attempt
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Total attempts a call may make
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// States of one logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Attempting,
    RetryableFailure,
    Success,
    TerminalFailure,
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Success | RetryState::TerminalFailure)
    }
}

/// What to do after an attempt has been classified
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Re-issue the identical request now
    Retry,
    /// The call is over; hand this to the caller
    Done(Classified),
}

/// Per-call bookkeeping, never shared between calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptState {
    pub attempts: u32,
    pub last_failure: Option<ApiError>,
}

/// Drives one logical call through the retry state machine
#[derive(Debug)]
pub struct RetryController {
    policy: RetryPolicy,
    state: RetryState,
    attempt: AttemptState,
    /// Named in the exhaustion message
    target: String,
    /// Per-attempt deadline, named in the timeout exhaustion message
    timeout: Duration,
}

impl RetryController {
    pub fn new(policy: RetryPolicy, target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            policy,
            state: RetryState::Idle,
            attempt: AttemptState::default(),
            target: target.into(),
            timeout,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempt.attempts
    }

    pub fn last_failure(&self) -> Option<&ApiError> {
        self.attempt.last_failure.as_ref()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Enter `Attempting` from `Idle` or `RetryableFailure`
    pub fn begin_attempt(&mut self) {
        debug_assert!(
            matches!(self.state, RetryState::Idle | RetryState::RetryableFailure),
            "begin_attempt called in state {:?}",
            self.state
        );
        self.state = RetryState::Attempting;
        self.attempt.attempts += 1;
    }

    /// Record the classified outcome of the current attempt
    pub fn record(&mut self, result: Classified) -> RetryDecision {
        debug_assert_eq!(self.state, RetryState::Attempting);

        match result {
            Ok(value) => {
                self.state = RetryState::Success;
                RetryDecision::Done(Ok(value))
            }
            Err(error) if error.is_retryable() => {
                let kind = error.kind;
                self.attempt.last_failure = Some(error);
                if self.attempt.attempts >= self.policy.max_attempts() {
                    self.state = RetryState::TerminalFailure;
                    RetryDecision::Done(Err(self.exhausted(kind)))
                } else {
                    self.state = RetryState::RetryableFailure;
                    RetryDecision::Retry
                }
            }
            Err(error) => {
                self.state = RetryState::TerminalFailure;
                RetryDecision::Done(Err(error))
            }
        }
    }

    fn exhausted(&self, kind: ErrorKind) -> ApiError {
        let attempts = self.attempt.attempts;
        let message = match kind {
            ErrorKind::Timeout => format!(
                "Request to {} timed out after {} attempts ({}s per attempt)",
                self.target,
                attempts,
                self.timeout.as_secs_f64()
            ),
            _ => format!(
                "Failed to connect to {} after {} attempts",
                self.target, attempts
            ),
        };
        ApiError::new(kind, message).with_attempts(attempts)
    }
}

/// Run `attempt_fn` under the controller until the call resolves
///
/// `attempt_fn` receives the 1-based attempt number and must re-issue the same
/// request each time.
pub async fn execute_with_retry<F, Fut>(mut controller: RetryController, mut attempt_fn: F) -> Classified
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Classified>,
{
    loop {
        controller.begin_attempt();
        let attempt = controller.attempts();
        let result = attempt_fn(attempt).await;

        match controller.record(result) {
            RetryDecision::Retry => {
                let failure = controller.last_failure();
                match failure.map(|f| f.kind) {
                    Some(ErrorKind::Timeout) => tracing::warn!(
                        url = %controller.target,
                        timeout = controller.timeout.as_secs_f64(),
                        attempt,
                        max_retries = controller.policy.max_retries,
                        "timeout_error"
                    ),
                    _ => tracing::warn!(
                        url = %controller.target,
                        attempt,
                        max_retries = controller.policy.max_retries,
                        "connection_error"
                    ),
                }
            }
            RetryDecision::Done(result) => {
                if let Err(error) = &result {
                    if error.is_retryable() {
                        tracing::error!(
                            url = %controller.target,
                            attempts = attempt,
                            kind = %error.kind,
                            "retries_exhausted"
                        );
                    }
                }
                return result;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn connect_failure() -> ApiError {
        ApiError::new(ErrorKind::ConnectionFailure, "connection refused")
    }

    fn controller(max_retries: u32) -> RetryController {
        RetryController::new(
            RetryPolicy::new(max_retries),
            "http://hub.local/health",
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(RetryPolicy::new(u32::MAX).max_attempts(), u32::MAX);
    }

    #[test]
    fn test_success_is_terminal() {
        let mut c = controller(3);
        assert_eq!(c.state(), RetryState::Idle);
        c.begin_attempt();
        assert_eq!(c.state(), RetryState::Attempting);
        assert_eq!(c.record(Ok(json!({}))), RetryDecision::Done(Ok(json!({}))));
        assert_eq!(c.state(), RetryState::Success);
        assert!(c.state().is_terminal());
    }

    #[test]
    fn test_zero_retries_means_one_attempt() {
        let mut c = controller(0);
        c.begin_attempt();
        match c.record(Err(connect_failure())) {
            RetryDecision::Done(Err(err)) => {
                assert_eq!(err.kind, ErrorKind::ConnectionFailure);
                assert_eq!(err.attempts, Some(1));
                assert!(err.message.contains("after 1 attempts"));
            }
            other => panic!("expected terminal failure, got {:?}", other),
        }
        assert_eq!(c.state(), RetryState::TerminalFailure);
    }

    #[test]
    fn test_transient_failure_then_retry() {
        let mut c = controller(2);
        c.begin_attempt();
        assert_eq!(c.record(Err(connect_failure())), RetryDecision::Retry);
        assert_eq!(c.state(), RetryState::RetryableFailure);
        assert_eq!(c.last_failure().map(|e| e.kind), Some(ErrorKind::ConnectionFailure));
    }

    #[test]
    fn test_status_failures_never_retry() {
        for kind in [
            ErrorKind::AuthenticationFailure,
            ErrorKind::ResourceNotFound,
            ErrorKind::ValidationFailure,
            ErrorKind::RateLimited,
            ErrorKind::GenericApiFailure,
            ErrorKind::DecodeFailure,
        ] {
            let mut c = controller(10);
            c.begin_attempt();
            let err = ApiError::new(kind, "nope");
            assert_eq!(c.record(Err(err.clone())), RetryDecision::Done(Err(err)));
            assert_eq!(c.attempts(), 1);
            assert_eq!(c.state(), RetryState::TerminalFailure);
        }
    }

    #[test]
    fn test_timeout_exhaustion_message() {
        let mut c = controller(1);
        let timeout = || ApiError::new(ErrorKind::Timeout, "deadline");
        c.begin_attempt();
        assert_eq!(c.record(Err(timeout())), RetryDecision::Retry);
        c.begin_attempt();
        match c.record(Err(timeout())) {
            RetryDecision::Done(Err(err)) => {
                assert_eq!(err.kind, ErrorKind::Timeout);
                assert_eq!(err.attempts, Some(2));
                assert_eq!(
                    err.message,
                    "Request to http://hub.local/health timed out after 2 attempts (30s per attempt)"
                );
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_consecutive_failures_use_whole_budget(max_retries in 0u32..20) {
            let mut c = controller(max_retries);
            let result = loop {
                c.begin_attempt();
                if let RetryDecision::Done(result) = c.record(Err(connect_failure())) {
                    break result;
                }
            };
            prop_assert_eq!(c.attempts(), max_retries + 1);
            let err = result.unwrap_err();
            prop_assert_eq!(err.kind, ErrorKind::ConnectionFailure);
            prop_assert_eq!(err.attempts, Some(max_retries + 1));
        }

        #[test]
        fn prop_success_on_last_attempt_wins(max_retries in 0u32..20) {
            let mut c = controller(max_retries);
            let result = loop {
                c.begin_attempt();
                let outcome = if c.attempts() == max_retries + 1 {
                    Ok(json!({"status": "ok"}))
                } else {
                    Err(connect_failure())
                };
                if let RetryDecision::Done(result) = c.record(outcome) {
                    break result;
                }
            };
            prop_assert_eq!(result, Ok(json!({"status": "ok"})));
            prop_assert_eq!(c.state(), RetryState::Success);
        }
    }

    #[tokio::test]
    async fn test_execute_with_retry_counts_attempts() {
        let calls = AtomicU32::new(0);
        let result = execute_with_retry(controller(3), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(connect_failure()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let err = result.unwrap_err();
        assert_eq!(err.attempts, Some(4));
        assert_eq!(
            err.message,
            "Failed to connect to http://hub.local/health after 4 attempts"
        );
    }

    #[tokio::test]
    async fn test_execute_with_retry_recovers() {
        let result = execute_with_retry(controller(2), |attempt| async move {
            if attempt < 3 {
                Err(ApiError::new(ErrorKind::Timeout, "slow"))
            } else {
                Ok(json!({"attempt": attempt}))
            }
        })
        .await;

        assert_eq!(result, Ok(json!({"attempt": 3})));
    }

    #[tokio::test]
    async fn test_execute_with_retry_stops_on_rate_limit() {
        let calls = AtomicU32::new(0);
        let result = execute_with_retry(controller(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ApiError::new(ErrorKind::RateLimited, "slow down")
                    .with_status(429)
                    .with_retry_after(Some(Duration::from_secs(7))))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().retry_after, Some(Duration::from_secs(7)));
    }
}
