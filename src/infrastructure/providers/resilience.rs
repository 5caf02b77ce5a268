//! # Retry and Circuit Breaking
//!
//! Wraps a [`ProviderClient`] call with bounded retries, exponential
//! backoff, and a per-client circuit breaker.
//!
//! Each client instance owns its breaker state exclusively; state is never
//! shared across instances and survives across aggregation cycles. The
//! breaker has two states: closed and open. There is no timed half-open
//! transition; recovery is an explicit administrative [`reset`].
//!
//! [`reset`]: ResilientInvoker::reset

use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::traits::{ProviderClient, RateData, RateRequest};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default consecutive-failure threshold before the breaker opens.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Default number of attempts per call.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff base delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default backoff cap.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Default backoff multiplier per attempt.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Retry configuration for one invoker.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per call.
    pub max_retries: u32,
    /// First retry delay.
    pub base_delay: Duration,
    /// Multiplier applied per subsequent attempt.
    pub factor: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            factor: DEFAULT_BACKOFF_FACTOR,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Returns the delay before the retry that follows attempt `attempt`
    /// (1-based): `min(base * factor^(attempt-1), max_delay)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self.factor.powi(attempt.saturating_sub(1) as i32);
        let delay = self.base_delay.mul_f64(exp);
        delay.min(self.max_delay)
    }
}

/// Snapshot of one breaker's state.
///
/// Transitions are pure functions of the current state plus an outcome,
/// so the breaker is unit-testable without a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerState {
    /// Whether calls are currently short-circuited.
    pub open: bool,
    /// Failures recorded since the last reset.
    pub failure_count: u32,
    /// Failure count at which the breaker opens.
    pub threshold: u32,
}

impl BreakerState {
    /// Creates a closed state with the given threshold.
    #[must_use]
    pub fn closed(threshold: u32) -> Self {
        Self {
            open: false,
            failure_count: 0,
            threshold,
        }
    }

    /// Returns the state after one recorded failure.
    #[must_use]
    pub fn after_failure(self) -> Self {
        let failure_count = self.failure_count.saturating_add(1);
        Self {
            open: self.open || failure_count >= self.threshold,
            failure_count,
            threshold: self.threshold,
        }
    }

    /// Returns the state after an explicit reset.
    #[must_use]
    pub fn after_reset(self) -> Self {
        Self::closed(self.threshold)
    }
}

/// Two-state circuit breaker owned by a single client instance.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a closed breaker with the given threshold.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            state: Mutex::new(BreakerState::closed(threshold)),
        }
    }

    /// Returns true if calls should be short-circuited.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Returns the current failure count.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BreakerState {
        *self.state.lock()
    }

    /// Records a failure. Returns true if this failure opened the breaker.
    pub fn record_failure(&self) -> bool {
        let mut state = self.state.lock();
        let was_open = state.open;
        *state = state.after_failure();
        state.open && !was_open
    }

    /// Returns the breaker to closed with the counter zeroed.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = state.after_reset();
    }
}

/// Wraps one provider client with retries, backoff, and a circuit breaker.
#[derive(Debug)]
pub struct ResilientInvoker {
    client: Arc<dyn ProviderClient>,
    breaker: CircuitBreaker,
    policy: RetryPolicy,
}

impl ResilientInvoker {
    /// Wraps `client` with the default policy and breaker threshold.
    #[must_use]
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self::with_policy(client, RetryPolicy::default(), DEFAULT_FAILURE_THRESHOLD)
    }

    /// Wraps `client` with an explicit policy and breaker threshold.
    #[must_use]
    pub fn with_policy(
        client: Arc<dyn ProviderClient>,
        policy: RetryPolicy,
        breaker_threshold: u32,
    ) -> Self {
        Self {
            client,
            breaker: CircuitBreaker::new(breaker_threshold),
            policy,
        }
    }

    /// Returns the wrapped provider's name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.client.name()
    }

    /// Returns the wrapped client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn ProviderClient> {
        &self.client
    }

    /// Returns the breaker for inspection.
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Administrative reset: closes the breaker and zeroes the counter.
    pub fn reset(&self) {
        self.breaker.reset();
        debug!(provider = self.provider_name(), "circuit breaker reset");
    }

    /// Calls `fetch` on the wrapped client with retry and breaker
    /// protection.
    ///
    /// An open breaker fails the call immediately with
    /// [`ProviderError::BreakerOpen`]; no network call is attempted and the
    /// retry loop is not entered. A non-retryable failure is propagated as
    /// soon as it occurs; the final attempt's failure is propagated
    /// unchanged.
    ///
    /// # Errors
    ///
    /// The wrapped client's last error, or `ProviderError::BreakerOpen`.
    pub async fn fetch(&self, request: &RateRequest) -> ProviderResult<RateData> {
        let provider = self.provider_name();
        let max_attempts = self.policy.max_retries.max(1);

        for attempt in 1..=max_attempts {
            if self.breaker.is_open() {
                warn!(provider, "circuit breaker open, short-circuiting call");
                return Err(ProviderError::breaker_open(provider));
            }

            debug!(provider, attempt, request = %request, "fetching rates");
            match self.client.fetch(request).await {
                Ok(data) => return Ok(data),
                Err(error) => {
                    if self.breaker.record_failure() {
                        warn!(
                            provider,
                            failures = self.breaker.failure_count(),
                            "circuit breaker opened"
                        );
                    }

                    if error.is_fatal() || !error.is_retryable() || attempt == max_attempts {
                        return Err(error);
                    }

                    let delay = self.policy.backoff_delay(attempt);
                    warn!(
                        provider,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // max_retries >= 1 guarantees the loop returned.
        Err(ProviderError::breaker_open(provider))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Timestamp;
    use crate::infrastructure::providers::traits::ProviderHealth;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Test double that fails a fixed number of times before succeeding.
    #[derive(Debug)]
    struct FlakyClient {
        calls: AtomicU32,
        failures_before_success: u32,
        error: fn(&'static str) -> ProviderError,
    }

    impl FlakyClient {
        fn failing_forever() -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success: u32::MAX,
                error: |p| ProviderError::connection(p, "refused"),
            }
        }

        fn succeeding_after(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success: failures,
                error: |p| ProviderError::timeout(p, "slow"),
            }
        }

        fn invalid_response() -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success: u32::MAX,
                error: |p| ProviderError::invalid_response(p, "missing conversion_rates"),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderClient for FlakyClient {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn fetch(&self, _request: &RateRequest) -> ProviderResult<RateData> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err((self.error)(self.name()))
            } else {
                Ok(RateData {
                    base_code: "USD".into(),
                    conversion_rates: HashMap::from([("ZAR".to_string(), dec!(18.4))]),
                    last_update_at: Timestamp::now(),
                })
            }
        }

        async fn health_check(&self) -> ProviderHealth {
            ProviderHealth::reachable("ok")
        }
    }

    mod backoff {
        use super::*;

        #[test]
        fn schedule_matches_contract() {
            // min(0.5 * 2^(k-1), 8): 0.5, 1, 2, 4, 8, 8, ...
            let policy = RetryPolicy::default();
            let expected_ms = [500, 1000, 2000, 4000, 8000, 8000, 8000];
            for (k, expected) in expected_ms.iter().enumerate() {
                let delay = policy.backoff_delay(k as u32 + 1);
                assert_eq!(delay.as_millis() as u64, *expected, "attempt {}", k + 1);
            }
        }
    }

    mod breaker_state {
        use super::*;

        #[test]
        fn opens_at_threshold() {
            let mut state = BreakerState::closed(3);
            state = state.after_failure();
            state = state.after_failure();
            assert!(!state.open);
            state = state.after_failure();
            assert!(state.open);
            assert_eq!(state.failure_count, 3);
        }

        #[test]
        fn stays_open_past_threshold() {
            let state = BreakerState::closed(1).after_failure().after_failure();
            assert!(state.open);
            assert_eq!(state.failure_count, 2);
        }

        #[test]
        fn reset_closes_and_zeroes() {
            let state = BreakerState::closed(1).after_failure().after_reset();
            assert!(!state.open);
            assert_eq!(state.failure_count, 0);
        }
    }

    mod invoker {
        use super::*;

        fn invoker_with(client: Arc<FlakyClient>) -> ResilientInvoker {
            // Tight delays to keep the tests fast even without a paused clock.
            let policy = RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(1),
                factor: 2.0,
                max_delay: Duration::from_millis(4),
            };
            ResilientInvoker::with_policy(client, policy, 3)
        }

        #[tokio::test]
        async fn retries_then_succeeds() {
            let client = Arc::new(FlakyClient::succeeding_after(2));
            let invoker = invoker_with(Arc::clone(&client));

            let data = tokio_test::assert_ok!(invoker.fetch(&RateRequest::for_base("USD")).await);
            assert_eq!(data.base_code, "USD");
            assert_eq!(client.calls(), 3);
        }

        #[tokio::test]
        async fn last_failure_propagated_unchanged() {
            let client = Arc::new(FlakyClient::failing_forever());
            let invoker = invoker_with(Arc::clone(&client));

            let error = tokio_test::assert_err!(invoker.fetch(&RateRequest::for_base("USD")).await);
            assert!(matches!(error, ProviderError::Connection { .. }));
            assert_eq!(client.calls(), 3);
        }

        #[tokio::test]
        async fn breaker_opens_after_threshold_failures() {
            let client = Arc::new(FlakyClient::failing_forever());
            let invoker = invoker_with(Arc::clone(&client));

            let _ = invoker.fetch(&RateRequest::for_base("USD")).await;
            assert!(invoker.breaker().is_open());
            assert_eq!(client.calls(), 3);

            // Next call short-circuits without a network attempt.
            let error = invoker
                .fetch(&RateRequest::for_base("USD"))
                .await
                .unwrap_err();
            assert!(error.is_breaker_open());
            assert_eq!(client.calls(), 3);
        }

        #[tokio::test]
        async fn reset_allows_network_calls_again() {
            let client = Arc::new(FlakyClient::failing_forever());
            let invoker = invoker_with(Arc::clone(&client));

            let _ = invoker.fetch(&RateRequest::for_base("USD")).await;
            assert!(invoker.breaker().is_open());

            invoker.reset();
            assert!(!invoker.breaker().is_open());
            assert_eq!(invoker.breaker().failure_count(), 0);

            let _ = invoker.fetch(&RateRequest::for_base("USD")).await;
            assert!(client.calls() > 3);
        }

        #[tokio::test]
        async fn invalid_response_is_not_retried() {
            let client = Arc::new(FlakyClient::invalid_response());
            let invoker = invoker_with(Arc::clone(&client));

            let error = invoker
                .fetch(&RateRequest::for_base("USD"))
                .await
                .unwrap_err();
            assert!(matches!(error, ProviderError::InvalidResponse { .. }));
            assert_eq!(client.calls(), 1);
        }

        #[tokio::test]
        async fn breaker_persists_across_calls() {
            let client = Arc::new(FlakyClient::failing_forever());
            let invoker = invoker_with(Arc::clone(&client));

            let _ = invoker.fetch(&RateRequest::for_base("USD")).await;
            let calls_after_first = client.calls();

            for _ in 0..5 {
                let error = invoker
                    .fetch(&RateRequest::for_base("USD"))
                    .await
                    .unwrap_err();
                assert!(error.is_breaker_open());
            }
            assert_eq!(client.calls(), calls_after_first);
        }
    }
}
