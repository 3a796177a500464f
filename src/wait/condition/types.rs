// SPDX-License-Identifier: MIT

//! Field conditions checked against a resource snapshot

use serde::{Deserialize, Serialize};

/// A single field-level condition: the value at `name` must render to one of
/// the `acceptable` strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldCondition {
    /// Field locator, e.g. `status.phase` or `items[0].state`
    pub name: String,
    /// Accepted renderings of the field value
    #[serde(default)]
    pub acceptable: Vec<String>,
}

impl FieldCondition {
    pub fn new<I, S>(name: impl Into<String>, acceptable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            acceptable: acceptable.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a rendered value is in the acceptable list
    pub fn accepts(&self, rendered: &str) -> bool {
        self.acceptable.iter().any(|a| a == rendered)
    }
}

/// Ordered conditions that must all hold at once
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ConditionSet {
    conditions: Vec<FieldCondition>,
}

impl ConditionSet {
    pub fn new(conditions: Vec<FieldCondition>) -> Self {
        Self { conditions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: FieldCondition) {
        self.conditions.push(condition);
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldCondition> {
        self.conditions.iter()
    }
}

impl From<Vec<FieldCondition>> for ConditionSet {
    fn from(conditions: Vec<FieldCondition>) -> Self {
        Self::new(conditions)
    }
}

impl FromIterator<FieldCondition> for ConditionSet {
    fn from_iter<T: IntoIterator<Item = FieldCondition>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::fmt::Display for FieldCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in [{}]", self.name, self.acceptable.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_exact_match_only() {
        let cond = FieldCondition::new("status", ["ready", "done"]);
        assert!(cond.accepts("ready"));
        assert!(cond.accepts("done"));
        assert!(!cond.accepts("Ready"));
        assert!(!cond.accepts("ready "));
    }

    #[test]
    fn test_empty_acceptable_never_accepts() {
        let cond = FieldCondition::new("status", Vec::<String>::new());
        assert!(!cond.accepts(""));
        assert!(!cond.accepts("ready"));
    }

    #[test]
    fn test_display() {
        let cond = FieldCondition::new("status.phase", ["Running", "Ready"]);
        assert_eq!(cond.to_string(), "status.phase in [Running, Ready]");
    }

    #[test]
    fn test_condition_set_deserialize_from_list() {
        let yaml = r#"
            - name: status
              acceptable: [ready]
            - name: meta.state
              acceptable: ["done", "complete"]
        "#;
        let set: ConditionSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.len(), 2);
        let names: Vec<_> = set.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["status", "meta.state"]);
    }

    #[test]
    fn test_missing_acceptable_defaults_to_empty() {
        let cond: FieldCondition = serde_yaml::from_str("name: status").unwrap();
        assert!(cond.acceptable.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let set: ConditionSet = vec![
            FieldCondition::new("status", ["ready"]),
            FieldCondition::new("status", ["ready"]),
        ]
        .into();
        assert_eq!(set.len(), 2);
    }
}
