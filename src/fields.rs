//! Field mapping accumulated from every span of one file name.
//!
//! Holds output field name → final string value pairs in insertion order.
//! Merging is left to right: a later mapping replaces the value of any key
//! it shares with an earlier one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Output field name → final value, in first-insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    fields: IndexMap<String, String>,
}

impl FieldMapping {
    /// Create an empty field mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value.
    ///
    /// # Arguments
    /// * `name` - Output field name
    /// * `value` - Final value
    ///
    /// # Example
    /// ```
    /// use multirename::FieldMapping;
    ///
    /// let mut fields = FieldMapping::new();
    /// fields.insert("volume", "4");
    /// fields.insert("volume", "5");
    /// assert_eq!(fields.get("volume"), Some("5"));
    /// ```
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field value by name.
    ///
    /// # Returns
    /// `Some(value)` if the field was set, `None` otherwise
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    /// Check if a field has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Merge `other` into this mapping; `other` wins on shared keys.
    ///
    /// # Example
    /// ```
    /// use multirename::FieldMapping;
    ///
    /// let mut fields: FieldMapping = [("a", "1")].into_iter().collect();
    /// fields.merge([("a", "2"), ("b", "3")].into_iter().collect());
    ///
    /// assert_eq!(fields.get("a"), Some("2"));
    /// assert_eq!(fields.get("b"), Some("3"));
    /// ```
    pub fn merge(&mut self, other: FieldMapping) {
        self.fields.extend(other.fields);
    }

    /// Names from `mandatory` that are not set, in the order given.
    ///
    /// # Arguments
    /// * `mandatory` - Field names that must be present
    ///
    /// # Returns
    /// Missing names; empty when every mandatory field is present
    pub fn missing<'a>(&self, mandatory: &'a [String]) -> Vec<&'a str> {
        mandatory
            .iter()
            .map(|m| m.as_str())
            .filter(|m| !self.contains(m))
            .collect()
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Merge mappings in order; later mappings overwrite earlier keys.
pub fn merge_all<I: IntoIterator<Item = FieldMapping>>(mappings: I) -> FieldMapping {
    mappings
        .into_iter()
        .fold(FieldMapping::new(), |mut merged, next| {
            merged.merge(next);
            merged
        })
}
