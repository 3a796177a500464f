// SPDX-License-Identifier: MIT

//! Condition-gated poll loop
//!
//! `ConditionWaiter::run` blocks until every condition holds on a freshly
//! fetched snapshot, the deadline passes, the fetch fails, or the caller
//! cancels. The first fetch happens one poll interval after the call, not
//! immediately.

use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::condition::{CompiledConditions, ConditionSet, Evaluation};
use super::error::WaitError;
use super::fetcher::Fetcher;
use super::snapshot::ResourceSnapshot;

/// Default timeout (10 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default poll interval (2 seconds)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Timing of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Total time allowed before giving up
    pub timeout: Duration,
    /// Time between fetches
    pub poll_interval: Duration,
}

impl WaitSettings {
    /// Create validated settings
    pub fn new(timeout: Duration, poll_interval: Duration) -> Result<Self, WaitError> {
        let settings = Self {
            timeout,
            poll_interval,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Both durations must be positive. A poll interval at or above the
    /// timeout is allowed and results in at most one poll.
    pub fn validate(&self) -> Result<(), WaitError> {
        if self.timeout.is_zero() {
            return Err(WaitError::invalid_settings("timeout must be positive"));
        }
        if self.poll_interval.is_zero() {
            return Err(WaitError::invalid_settings(
                "poll interval must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Successful end of a wait
#[derive(Debug, Clone)]
pub struct Satisfied {
    /// Number of fetches performed, including the satisfying one
    pub ticks: u64,
    /// Time from the start of the wait to satisfaction
    pub elapsed: Duration,
    /// Snapshot on which every condition held
    pub snapshot: ResourceSnapshot,
}

/// Polls a resource until a condition set holds
#[derive(Debug, Clone)]
pub struct ConditionWaiter {
    settings: WaitSettings,
    cancel: CancellationToken,
}

impl ConditionWaiter {
    pub fn new(settings: WaitSettings) -> Self {
        Self {
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie the waiter to an external cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> WaitSettings {
        self.settings
    }

    /// Token that cancels every `run` on this waiter
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Poll `fetcher` for `resource_id` until all `conditions` hold.
    ///
    /// Invalid settings or condition paths are rejected before any timer is
    /// armed. Fetch errors end the wait on the tick they occur. A fetch that is
    /// already running when the deadline passes is allowed to finish and its
    /// snapshot is still evaluated.
    pub async fn run<F>(
        &self,
        fetcher: &F,
        resource_id: &str,
        conditions: &ConditionSet,
    ) -> Result<Satisfied, WaitError>
    where
        F: Fetcher + ?Sized,
    {
        self.settings.validate()?;
        let compiled =
            CompiledConditions::compile(conditions).map_err(|e| WaitError::InvalidCondition {
                name: e.name,
                source: e.error,
            })?;

        let WaitSettings {
            timeout,
            poll_interval,
        } = self.settings;

        // An interval past the timeout is armed at the deadline, which wins ties.
        let period = poll_interval.min(timeout);
        let start = Instant::now();

        let deadline = tokio::time::sleep_until(instant_after(start, timeout));
        tokio::pin!(deadline);
        let mut ticker = tokio::time::interval_at(instant_after(start, period), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks: u64 = 0;
        let mut last_unsatisfied = None;
        let mut last_snapshot = None;

        log::debug!(
            "Waiting for resource '{}' ({} condition(s), timeout {:?}, poll interval {:?})",
            resource_id,
            compiled.len(),
            timeout,
            poll_interval
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    log::info!("Wait for resource '{}' cancelled after {} poll(s)", resource_id, ticks);
                    return Err(WaitError::Cancelled {
                        resource_id: resource_id.to_string(),
                        ticks,
                    });
                }
                _ = &mut deadline => {
                    log::warn!("Timed out after {:?} waiting for resource '{}'", timeout, resource_id);
                    return Err(WaitError::TimedOut {
                        resource_id: resource_id.to_string(),
                        timeout,
                        ticks,
                        last_unsatisfied,
                        last_snapshot,
                    });
                }
                _ = ticker.tick() => {}
            }

            ticks += 1;
            let resource = fetcher.fetch(resource_id).await.map_err(|source| {
                log::warn!("Fetch of resource '{}' failed on poll {}: {}", resource_id, ticks, source);
                WaitError::FetchFailed {
                    resource_id: resource_id.to_string(),
                    tick: ticks,
                    source,
                }
            })?;

            let snapshot =
                ResourceSnapshot::capture(&resource).map_err(|e| WaitError::FetchFailed {
                    resource_id: resource_id.to_string(),
                    tick: ticks,
                    source: Box::new(e),
                })?;

            match snapshot.evaluate(&compiled) {
                Evaluation::Satisfied => {
                    let elapsed = start.elapsed();
                    log::info!(
                        "Resource '{}' satisfied all conditions after {} poll(s) ({:?})",
                        resource_id,
                        ticks,
                        elapsed
                    );
                    return Ok(Satisfied {
                        ticks,
                        elapsed,
                        snapshot,
                    });
                }
                Evaluation::Unsatisfied(unsatisfied) => {
                    log::debug!("Resource '{}' poll {}: {}", resource_id, ticks, unsatisfied);
                    last_unsatisfied = Some(unsatisfied);
                    last_snapshot = Some(snapshot.into_value());
                }
            }
        }
    }
}

/// `start + duration`, saturating to roughly 30 years out
fn instant_after(start: Instant, duration: Duration) -> Instant {
    start
        .checked_add(duration)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

impl Default for ConditionWaiter {
    fn default() -> Self {
        Self::new(WaitSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::condition::FieldCondition;
    use crate::wait::fetcher::{fetch_fn, FetchError};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        assert!(
            diff <= Duration::from_millis(10),
            "expected about {:?}, got {:?}",
            expected,
            actual
        );
    }

    fn waiter(timeout: u64, interval: u64) -> ConditionWaiter {
        ConditionWaiter::new(WaitSettings::new(secs(timeout), secs(interval)).unwrap())
    }

    #[test]
    fn test_settings_reject_zero() {
        assert!(matches!(
            WaitSettings::new(Duration::ZERO, secs(1)),
            Err(WaitError::InvalidSettings(_))
        ));
        assert!(matches!(
            WaitSettings::new(secs(1), Duration::ZERO),
            Err(WaitError::InvalidSettings(_))
        ));
        assert!(WaitSettings::new(secs(1), secs(5)).is_ok());
    }

    #[test]
    fn test_default_settings() {
        let settings = WaitSettings::default();
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(settings.validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_settings_do_not_poll() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let fetcher = fetch_fn(move |_id: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>(json!({}))
            }
        });
        let waiter = ConditionWaiter::new(WaitSettings {
            timeout: Duration::ZERO,
            poll_interval: secs(1),
        });

        let err = waiter
            .run(&fetcher, "r", &ConditionSet::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::InvalidSettings(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_path_rejected_before_polling() {
        let fetcher = fetch_fn(|_id: String| async move { Ok::<_, FetchError>(json!({})) });
        let conditions: ConditionSet = vec![FieldCondition::new("a..b", ["x"])].into();
        let started = Instant::now();

        let err = waiter(5, 1)
            .run(&fetcher, "r", &conditions)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::InvalidCondition { ref name, .. } if name == "a..b"));
        assert_close(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_waits_one_interval() {
        let fetcher = fetch_fn(|_id: String| async move { Ok::<_, FetchError>(json!({})) });
        let started = Instant::now();

        let satisfied = waiter(10, 3)
            .run(&fetcher, "r", &ConditionSet::empty())
            .await
            .unwrap();
        assert_eq!(satisfied.ticks, 1);
        assert_close(satisfied.elapsed, secs(3));
        assert_close(started.elapsed(), secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_longer_than_timeout_times_out_without_polling() {
        let fetcher = fetch_fn(|_id: String| async move { Ok::<_, FetchError>(json!({})) });

        let err = waiter(2, 5)
            .run(&fetcher, "r", &ConditionSet::empty())
            .await
            .unwrap_err();
        match err {
            WaitError::TimedOut {
                ticks,
                last_snapshot,
                last_unsatisfied,
                ..
            } => {
                assert_eq!(ticks, 0);
                assert!(last_snapshot.is_none());
                assert!(last_unsatisfied.is_none());
            }
            other => panic!("Expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_times_out_at_deadline() {
        let fetcher = fetch_fn(|_id: String| async move { Ok::<_, FetchError>(json!({})) });
        let settings = WaitSettings::new(secs(5), Duration::from_secs(u64::MAX)).unwrap();
        let started = Instant::now();

        let err = ConditionWaiter::new(settings)
            .run(&fetcher, "r", &ConditionSet::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::TimedOut { ticks: 0, .. }));
        assert_close(started.elapsed(), secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_equal_to_timeout_times_out_without_polling() {
        let fetcher = fetch_fn(|_id: String| async move { Ok::<_, FetchError>(json!({})) });

        let err = waiter(3, 3)
            .run(&fetcher, "r", &ConditionSet::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::TimedOut { ticks: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_last_snapshot() {
        let fetcher = fetch_fn(|_id: String| async move {
            Ok::<_, FetchError>(json!({"status": "pending"}))
        });
        let conditions: ConditionSet = vec![FieldCondition::new("status", ["ready"])].into();

        let err = waiter(3, 1)
            .run(&fetcher, "r", &conditions)
            .await
            .unwrap_err();
        match err {
            WaitError::TimedOut {
                ticks,
                last_snapshot,
                last_unsatisfied,
                ..
            } => {
                assert_eq!(ticks, 2);
                assert_eq!(last_snapshot, Some(json!({"status": "pending"})));
                let unsatisfied = last_unsatisfied.unwrap();
                assert_eq!(unsatisfied.observed.as_deref(), Some("pending"));
            }
            other => panic!("Expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_does_not_overlap() {
        let in_flight = Arc::new(AtomicU64::new(0));
        let max_seen = Arc::new(AtomicU64::new(0));
        let (flight, max) = (in_flight.clone(), max_seen.clone());
        let fetcher = fetch_fn(move |_id: String| {
            let (flight, max) = (flight.clone(), max.clone());
            async move {
                let now = flight.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2500)).await;
                flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, FetchError>(json!({"status": "pending"}))
            }
        });
        let conditions: ConditionSet = vec![FieldCondition::new("status", ["ready"])].into();

        let err = waiter(10, 1)
            .run(&fetcher, "r", &conditions)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::TimedOut { .. }));
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_fetch_result_counts_past_deadline() {
        let fetcher = fetch_fn(|_id: String| async move {
            tokio::time::sleep(secs(3)).await;
            Ok::<_, FetchError>(json!({"status": "ready"}))
        });
        let conditions: ConditionSet = vec![FieldCondition::new("status", ["ready"])].into();

        let satisfied = waiter(2, 1).run(&fetcher, "r", &conditions).await.unwrap();
        assert_eq!(satisfied.ticks, 1);
        assert_close(satisfied.elapsed, secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unserializable_resource_is_fetch_failure() {
        use std::collections::HashMap;
        // Non-string map keys cannot become JSON object keys
        let fetcher = fetch_fn(|_id: String| async move {
            let mut map: HashMap<(u8, u8), u8> = HashMap::new();
            map.insert((1, 2), 3);
            Ok::<_, FetchError>(map)
        });

        let err = waiter(5, 1)
            .run(&fetcher, "r", &ConditionSet::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::FetchFailed { tick: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_tick() {
        let fetcher = fetch_fn(|_id: String| async move { Ok::<_, FetchError>(Value::Null) });
        let waiter = waiter(5, 1);
        waiter.cancellation_token().cancel();

        let err = waiter
            .run(&fetcher, "r", &ConditionSet::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Cancelled { ticks: 0, .. }));
    }
}
