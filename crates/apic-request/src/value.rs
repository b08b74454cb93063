//! Parameter values as entered in the form.

use serde::{Deserialize, Serialize};

/// A single or multi-valued parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    /// Array parameters; serialized as repeated `name=value` pairs
    Multiple(Vec<String>),
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue::Single(String::new())
    }
}

impl ParamValue {
    pub fn single(value: impl Into<String>) -> Self {
        ParamValue::Single(value.into())
    }

    /// True when no non-empty value is present.
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Single(value) => value.is_empty(),
            ParamValue::Multiple(values) => values.iter().all(String::is_empty),
        }
    }

    /// All values, empty entries included.
    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Single(value) => vec![value.as_str()],
            ParamValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// First non-empty value.
    pub fn first(&self) -> Option<&str> {
        self.values().into_iter().find(|v| !v.is_empty())
    }

    /// Drop empty entries; `None` when nothing is left.
    pub fn non_empty(&self) -> Option<ParamValue> {
        match self {
            ParamValue::Single(value) if value.is_empty() => None,
            ParamValue::Single(_) => Some(self.clone()),
            ParamValue::Multiple(values) => {
                let values: Vec<String> = values.iter().filter(|v| !v.is_empty()).cloned().collect();
                (!values.is_empty()).then_some(ParamValue::Multiple(values))
            }
        }
    }

    /// Append a value, turning a non-empty single value into a list.
    pub fn push(&mut self, value: String) {
        match self {
            ParamValue::Single(existing) if existing.is_empty() => *existing = value,
            ParamValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = ParamValue::Multiple(vec![first, value]);
            }
            ParamValue::Multiple(values) => values.push(value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multiple(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_accumulates() {
        let mut value = ParamValue::default();
        value.push("a".to_string());
        assert_eq!(value, ParamValue::single("a"));
        value.push("b".to_string());
        assert_eq!(
            value,
            ParamValue::Multiple(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(ParamValue::single("").non_empty(), None);
        assert_eq!(
            ParamValue::Multiple(vec![String::new(), "x".to_string()]).non_empty(),
            Some(ParamValue::Multiple(vec!["x".to_string()]))
        );
        assert!(ParamValue::Multiple(vec![String::new()]).is_empty());
        assert_eq!(ParamValue::Multiple(vec![String::new(), "x".to_string()]).first(), Some("x"));
    }
}
