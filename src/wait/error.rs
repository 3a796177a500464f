// SPDX-License-Identifier: MIT

//! Terminal failures of a wait
//!
//! A wait ends with `Ok(Satisfied)` or exactly one of these errors. A field
//! missing from the snapshot is never an error: it only means the condition
//! is not satisfied yet.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::condition::{PathError, Unsatisfied};
use super::fetcher::FetchError;

/// Error type for `ConditionWaiter::run`
#[derive(Debug, Error)]
pub enum WaitError {
    /// The fetch call failed; the wait is aborted without retrying
    #[error("fetching resource '{resource_id}' failed on poll {tick}: {source}")]
    FetchFailed {
        resource_id: String,
        tick: u64,
        #[source]
        source: FetchError,
    },

    /// The deadline elapsed before every condition held
    #[error(
        "timed out after {timeout:?} waiting for resource '{resource_id}' ({})",
        describe_last(.ticks, .last_unsatisfied)
    )]
    TimedOut {
        resource_id: String,
        timeout: Duration,
        ticks: u64,
        last_unsatisfied: Option<Unsatisfied>,
        last_snapshot: Option<Value>,
    },

    /// The caller's cancellation token fired
    #[error("wait for resource '{resource_id}' was cancelled after {ticks} poll(s)")]
    Cancelled { resource_id: String, ticks: u64 },

    /// Non-positive timeout or poll interval
    #[error("invalid wait settings: {0}")]
    InvalidSettings(String),

    /// A condition name is not a valid field path
    #[error("invalid condition '{name}': {source}")]
    InvalidCondition {
        name: String,
        #[source]
        source: PathError,
    },
}

fn describe_last(ticks: &u64, last: &Option<Unsatisfied>) -> String {
    match last {
        Some(unsatisfied) => format!("after {} poll(s), {}", ticks, unsatisfied),
        None => format!("no snapshot evaluated after {} poll(s)", ticks),
    }
}

impl WaitError {
    /// Resource the wait was for, when the error is tied to one
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::FetchFailed { resource_id, .. }
            | Self::TimedOut { resource_id, .. }
            | Self::Cancelled { resource_id, .. } => Some(resource_id),
            Self::InvalidSettings(_) | Self::InvalidCondition { .. } => None,
        }
    }

    /// True for timeouts and cancellations, which most callers handle alike
    pub fn is_timeout_like(&self) -> bool {
        matches!(self, Self::TimedOut { .. } | Self::Cancelled { .. })
    }

    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::condition::FieldCondition;

    #[test]
    fn test_fetch_failed_wraps_cause_verbatim() {
        let err = WaitError::FetchFailed {
            resource_id: "db-1".to_string(),
            tick: 2,
            source: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "fetching resource 'db-1' failed on poll 2: connection refused"
        );
        assert_eq!(err.resource_id(), Some("db-1"));
        assert!(!err.is_timeout_like());
    }

    #[test]
    fn test_timed_out_names_last_condition() {
        let err = WaitError::TimedOut {
            resource_id: "db-1".to_string(),
            timeout: Duration::from_secs(5),
            ticks: 5,
            last_unsatisfied: Some(Unsatisfied {
                condition: FieldCondition::new("status", ["ready"]),
                observed: Some("pending".to_string()),
            }),
            last_snapshot: None,
        };
        assert_eq!(
            err.to_string(),
            "timed out after 5s waiting for resource 'db-1' (after 5 poll(s), 'status' is 'pending', waiting for one of [ready])"
        );
        assert!(err.is_timeout_like());
    }

    #[test]
    fn test_timed_out_without_snapshot() {
        let err = WaitError::TimedOut {
            resource_id: "db-1".to_string(),
            timeout: Duration::from_millis(500),
            ticks: 0,
            last_unsatisfied: None,
            last_snapshot: None,
        };
        assert_eq!(
            err.to_string(),
            "timed out after 500ms waiting for resource 'db-1' (no snapshot evaluated after 0 poll(s))"
        );
    }

    #[test]
    fn test_cancelled_is_timeout_like() {
        let err = WaitError::Cancelled {
            resource_id: "db-1".to_string(),
            ticks: 1,
        };
        assert!(err.is_timeout_like());
        assert_eq!(err.resource_id(), Some("db-1"));
    }

    #[test]
    fn test_argument_errors_have_no_resource() {
        let err = WaitError::invalid_settings("timeout must be positive");
        assert_eq!(err.resource_id(), None);
        assert_eq!(
            err.to_string(),
            "invalid wait settings: timeout must be positive"
        );
    }
}
