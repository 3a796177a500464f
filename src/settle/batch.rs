// SPDX-License-Identifier: MIT

//! Concurrent waits over many resources
//!
//! Each resource gets its own `run` with its own timer and ticker. The runs
//! share nothing but a cancellation group derived from the waiter's token.

use futures::future::join_all;

use crate::wait::{ConditionSet, ConditionWaiter, Fetcher, Satisfied, WaitError};

/// How a batch reacts to a failed wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Let every wait run to its own end
    #[default]
    Independent,
    /// Cancel the remaining waits once one fails
    FailFast,
}

/// Outcome for one resource of a batch
#[derive(Debug)]
pub struct BatchResult {
    pub resource_id: String,
    pub outcome: Result<Satisfied, WaitError>,
}

impl BatchResult {
    pub fn is_satisfied(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Wait for every resource in `resource_ids` concurrently.
///
/// Results are returned in input order.
pub async fn wait_all<F>(
    waiter: &ConditionWaiter,
    fetcher: &F,
    resource_ids: &[String],
    conditions: &ConditionSet,
    mode: BatchMode,
) -> Vec<BatchResult>
where
    F: Fetcher + ?Sized,
{
    let group = waiter.cancellation_token().child_token();

    let waits = resource_ids.iter().map(|resource_id| {
        let member = waiter.clone().with_cancellation(group.child_token());
        let group = group.clone();
        async move {
            let outcome = member.run(fetcher, resource_id, conditions).await;
            if mode == BatchMode::FailFast {
                if let Err(e) = &outcome {
                    if !group.is_cancelled() {
                        log::warn!("Cancelling remaining waits: {}", e);
                        group.cancel();
                    }
                }
            }
            BatchResult {
                resource_id: resource_id.clone(),
                outcome,
            }
        }
    });

    join_all(waits).await
}

/// Convenience check over a batch
pub fn all_satisfied(results: &[BatchResult]) -> bool {
    results.iter().all(BatchResult::is_satisfied)
}
