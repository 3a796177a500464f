// SPDX-License-Identifier: MIT

//! Point-in-time view of a remote resource

use serde::Serialize;
use serde_json::Value;

use super::condition::{self, CompiledConditions, Evaluation, FieldPath};

/// Immutable JSON tree captured from one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    document: Value,
}

impl ResourceSnapshot {
    /// Serialize a fetched resource into a snapshot
    pub fn capture<R: Serialize + ?Sized>(resource: &R) -> Result<Self, serde_json::Error> {
        Ok(Self {
            document: serde_json::to_value(resource)?,
        })
    }

    pub fn from_value(document: Value) -> Self {
        Self { document }
    }

    /// Resolve a parsed path against the snapshot
    pub fn query(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.document)
    }

    /// Resolve a path given as text (e.g., "status.phase"). Unparseable paths resolve to nothing.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let parsed = condition::parse_path(path).ok()?;
        parsed.resolve(&self.document)
    }

    pub fn evaluate(&self, conditions: &CompiledConditions) -> Evaluation {
        conditions.evaluate(&self.document)
    }

    pub fn as_value(&self) -> &Value {
        &self.document
    }

    pub fn into_value(self) -> Value {
        self.document
    }
}

impl From<Value> for ResourceSnapshot {
    fn from(document: Value) -> Self {
        Self::from_value(document)
    }
}
