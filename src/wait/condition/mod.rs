// SPDX-License-Identifier: MIT

//! Field conditions gating a wait
//!
//! A condition names a field in the resource document and the values it may
//! take, like:
//! - `status` in `[ready]`
//! - `status.phase` in `[Running, Ready]`
//! - `items[-1].state` in `[done]`

mod evaluator;
mod path;
mod types;

pub use evaluator::{render, CompiledConditions, Evaluation, InvalidPath, Unsatisfied};
pub use path::{parse as parse_path, FieldPath, PathError, Segment};
pub use types::{ConditionSet, FieldCondition};
