//! Event property bag.
//!
//! Properties carry cross-processor context (e.g. "skip validation") and,
//! while an event is suspended, the workflow references needed to resume it.
//! They travel with the event and are persisted with it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known property keys.
pub mod keys {
    /// Skip content validation processors.
    pub const SKIP_VALIDATION: &str = "skip_validation";
    /// Whether the publishing caller requested permission checks.
    pub const CHECK_RIGHT: &str = "check_right";
    /// Marks a close sub-event; its chain holds only close processors.
    pub const CLOSE: &str = "close";
    /// Skip workflow approval processors.
    pub const SKIP_APPROVAL: &str = "skip_approval";
    /// Identifier of the workflow process the event waits on.
    pub const WORKFLOW_PROCESS_ID: &str = "workflow.process_id";
    /// Definition key of the workflow process the event waits on.
    pub const WORKFLOW_DEFINITION: &str = "workflow.definition";
    /// Human readable reason recorded when a processor suspends the event.
    pub const SUSPEND_REASON: &str = "suspend.reason";
    /// Decision delivered by the workflow engine on resume.
    pub const DECISION: &str = "decision";
}

/// Key/value context passed explicitly through a processor chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventProperties(BTreeMap<String, Value>);

impl EventProperties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the raw value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `key` as a boolean. The strings `"true"`/`"false"` are
    /// accepted as well, since workflow engines often deliver strings.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns `true` only if `key` is present and truthy.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get_bool(key).unwrap_or(false)
    }

    /// Returns `key` as a string slice.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `key` as an integer.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Merges `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: EventProperties) {
        self.0.extend(other.0);
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the bag to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }

    /// Builds a bag from a JSON value. `null` yields an empty bag.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if `value` is neither an object nor `null`.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }
}

impl FromIterator<(String, Value)> for EventProperties {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overrides_existing_keys() {
        let mut props = EventProperties::new()
            .with(keys::DECISION, "pending")
            .with(keys::CHECK_RIGHT, true);

        props.merge(EventProperties::new().with(keys::DECISION, "approve"));

        assert_eq!(props.get_str(keys::DECISION), Some("approve"));
        assert_eq!(props.get_bool(keys::CHECK_RIGHT), Some(true));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_get_bool_accepts_string_booleans() {
        let props = EventProperties::new()
            .with("a", "true")
            .with("b", false)
            .with("c", "yes");

        assert_eq!(props.get_bool("a"), Some(true));
        assert_eq!(props.get_bool("b"), Some(false));
        assert_eq!(props.get_bool("c"), None);
        assert!(!props.is_set("missing"));
    }

    #[test]
    fn test_from_json_null_is_empty() {
        assert!(EventProperties::from_json(Value::Null).unwrap().is_empty());
        assert!(EventProperties::from_json(json!([1, 2])).is_err());

        let props = EventProperties::from_json(json!({"retries": 3})).unwrap();
        assert_eq!(props.get_i64("retries"), Some(3));
        assert_eq!(props.to_json(), json!({"retries": 3}));
    }
}
