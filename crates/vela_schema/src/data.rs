//! Parsed component data and diffing
//!
//! `ParsedData` is the fully-typed, fully-defaulted property mapping owned
//! by a component instance. Snapshots are diffed property-by-property to
//! decide whether an update hook fires and what it should react to.

use crate::value::PropertyValue;
use serde::Serialize;
use std::collections::BTreeMap;

/// Fully-defaulted mapping from property name to typed value
///
/// Backed by an ordered map so iteration, and therefore the canonical
/// cache key, is independent of property insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParsedData(BTreeMap<String, PropertyValue>);

impl ParsedData {
    /// Create an empty data set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property value
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Set a property value
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    /// Remove a property, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.0.remove(name)
    }

    /// Check if a property is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (name, value) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// Iterate over property names in name order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|name| name.as_str())
    }

    /// Canonical cache key
    ///
    /// Built from name-ordered canonical stringification, so two data sets
    /// with the same properties produce the same key regardless of the
    /// order properties were declared or assigned in.
    pub fn canonical_key(&self) -> String {
        let mut key = String::new();
        for (name, value) in &self.0 {
            key.push_str(name);
            key.push(':');
            key.push_str(&value.canonical_string());
            key.push(';');
        }
        key
    }
}

impl<'a> IntoIterator for &'a ParsedData {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, PropertyValue)> for ParsedData {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Old and new value of one changed property
///
/// `old` is `None` for properties introduced by a schema change, `new` is
/// `None` for properties dropped by one.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    pub old: Option<PropertyValue>,
    pub new: Option<PropertyValue>,
}

/// The set of properties that differ between two data snapshots
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataDiff {
    changes: BTreeMap<String, PropertyChange>,
}

impl DataDiff {
    /// Check if no properties changed
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changed properties
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check if a property changed
    pub fn contains(&self, name: &str) -> bool {
        self.changes.contains_key(name)
    }

    /// Get the change record for a property
    pub fn get(&self, name: &str) -> Option<&PropertyChange> {
        self.changes.get(name)
    }

    /// Iterate over changed properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyChange)> {
        self.changes.iter()
    }

    /// Names of all changed properties
    pub fn changed_names(&self) -> Vec<&str> {
        self.changes.keys().map(|name| name.as_str()).collect()
    }
}

/// Diff two data snapshots
///
/// Walks the union of property names; a property present on only one side
/// counts as changed. The set of reported names is symmetric in the
/// argument order.
pub fn diff(old: &ParsedData, new: &ParsedData) -> DataDiff {
    let mut changes = BTreeMap::new();

    for (name, old_value) in old.iter() {
        match new.get(name) {
            Some(new_value) if new_value == old_value => {}
            other => {
                changes.insert(
                    name.clone(),
                    PropertyChange {
                        old: Some(old_value.clone()),
                        new: other.cloned(),
                    },
                );
            }
        }
    }

    for (name, new_value) in new.iter() {
        if !old.contains(name) {
            changes.insert(
                name.clone(),
                PropertyChange {
                    old: None,
                    new: Some(new_value.clone()),
                },
            );
        }
    }

    DataDiff { changes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, PropertyValue)]) -> ParsedData {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_diff_reports_changed_values() {
        let old = data(&[("size", PropertyValue::Number(1.0))]);
        let new = data(&[("size", PropertyValue::Number(2.0))]);

        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        let change = changes.get("size").unwrap();
        assert_eq!(change.old, Some(PropertyValue::Number(1.0)));
        assert_eq!(change.new, Some(PropertyValue::Number(2.0)));
    }

    #[test]
    fn test_diff_empty_for_equal_data() {
        let a = data(&[("size", PropertyValue::Number(5.0))]);
        assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_diff_symmetric_names() {
        let a = data(&[
            ("width", PropertyValue::Number(1.0)),
            ("depth", PropertyValue::Number(3.0)),
        ]);
        let b = data(&[
            ("width", PropertyValue::Number(2.0)),
            ("radius", PropertyValue::Number(1.0)),
        ]);

        let forward = diff(&a, &b);
        let backward = diff(&b, &a);
        assert_eq!(forward.changed_names(), backward.changed_names());
        assert_eq!(forward.changed_names(), vec!["depth", "radius", "width"]);
    }

    #[test]
    fn test_canonical_key_order_independent() {
        let mut first = ParsedData::new();
        first.set("color", PropertyValue::Str("red".to_string()));
        first.set("shader", PropertyValue::Str("flat".to_string()));

        let mut second = ParsedData::new();
        second.set("shader", PropertyValue::Str("flat".to_string()));
        second.set("color", PropertyValue::Str("red".to_string()));

        assert_eq!(first.canonical_key(), second.canonical_key());
    }
}
