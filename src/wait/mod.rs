// SPDX-License-Identifier: MIT

//! Condition-gated wait engine
//!
//! This module provides:
//! - `ConditionWaiter` - polls a resource until a `ConditionSet` holds
//! - `Fetcher` - the narrow interface used to load a resource by id
//! - `ResourceSnapshot` - the JSON tree conditions are evaluated against
//! - `WaitError` - the terminal failures of a wait

pub mod condition;
pub mod error;
pub mod fetcher;
pub mod snapshot;
pub mod waiter;

pub use condition::{ConditionSet, FieldCondition};
pub use error::WaitError;
pub use fetcher::{fetch_fn, FetchError, Fetcher, FnFetcher};
pub use snapshot::ResourceSnapshot;
pub use waiter::{
    ConditionWaiter, Satisfied, WaitSettings, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
};
