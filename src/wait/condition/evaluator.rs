//! Condition set evaluator

use super::path::{self, FieldPath, PathError};
use super::types::{ConditionSet, FieldCondition};
use serde_json::Value;

/// Render a resolved value to the string compared against `acceptable`
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // Compact JSON for containers
        other => other.to_string(),
    }
}

/// Why a condition did not hold on a given snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsatisfied {
    pub condition: FieldCondition,
    /// Rendered value at the path, or `None` when the path did not resolve
    pub observed: Option<String>,
}

impl std::fmt::Display for Unsatisfied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.observed {
            Some(value) => write!(
                f,
                "'{}' is '{}', waiting for one of [{}]",
                self.condition.name,
                value,
                self.condition.acceptable.join(", ")
            ),
            None => write!(
                f,
                "'{}' is not present, waiting for one of [{}]",
                self.condition.name,
                self.condition.acceptable.join(", ")
            ),
        }
    }
}

/// Result of evaluating a condition set against one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Satisfied,
    Unsatisfied(Unsatisfied),
}

impl Evaluation {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Evaluation::Satisfied)
    }
}

/// A condition set whose field paths have been parsed up front
#[derive(Debug, Clone)]
pub struct CompiledConditions {
    entries: Vec<(FieldPath, FieldCondition)>,
}

/// A condition whose `name` is not a valid field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPath {
    pub name: String,
    pub error: PathError,
}

impl CompiledConditions {
    pub fn compile(set: &ConditionSet) -> Result<Self, InvalidPath> {
        let entries = set
            .iter()
            .map(|cond| {
                path::parse(&cond.name)
                    .map(|p| (p, cond.clone()))
                    .map_err(|error| InvalidPath {
                        name: cond.name.clone(),
                        error,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluate in order, stopping at the first condition that does not hold
    pub fn evaluate(&self, document: &Value) -> Evaluation {
        for (path, cond) in &self.entries {
            match path.resolve(document) {
                None => {
                    return Evaluation::Unsatisfied(Unsatisfied {
                        condition: cond.clone(),
                        observed: None,
                    })
                }
                Some(value) => {
                    let rendered = render(value);
                    if !cond.accepts(&rendered) {
                        return Evaluation::Unsatisfied(Unsatisfied {
                            condition: cond.clone(),
                            observed: Some(rendered),
                        });
                    }
                }
            }
        }
        Evaluation::Satisfied
    }
}
