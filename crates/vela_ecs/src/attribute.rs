//! Per-node attribute cache
//!
//! Host attribute storage is comparatively expensive to read and parse, so
//! each node keeps the most recently parsed form of every attribute it has
//! seen. An entry is re-parsed only on an explicit `set`; nothing expires
//! it implicitly, and the cache never writes back to the authoritative
//! attribute storage.

use std::collections::{BTreeMap, HashMap};
use vela_schema::{parse_style, PropertyValue, Schema, SchemaResult};

/// A cached, pre-parsed attribute value
///
/// Single-property components cache the typed value; multi-property
/// components cache the split `name: value` pairs, which is the costly
/// part of their parse.
#[derive(Clone, Debug, PartialEq)]
pub enum CachedAttribute {
    /// Typed value of a single-property component
    Value(PropertyValue),
    /// Raw pairs of a multi-property declaration
    Pairs(BTreeMap<String, String>),
}

impl CachedAttribute {
    /// View the cached value as raw override pairs
    ///
    /// Single values map onto the single-property key using their
    /// canonical string form.
    pub fn as_pairs(&self) -> BTreeMap<String, String> {
        match self {
            Self::Value(value) => {
                let mut pairs = BTreeMap::new();
                pairs.insert(Schema::SINGLE.to_string(), value.canonical_string());
                pairs
            }
            Self::Pairs(pairs) => pairs.clone(),
        }
    }
}

/// Mapping from attribute name to its most recently parsed value
#[derive(Default)]
pub struct AttributeCache {
    entries: HashMap<String, CachedAttribute>,
}

impl AttributeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached value for an attribute
    pub fn get(&self, name: &str) -> Option<&CachedAttribute> {
        self.entries.get(name)
    }

    /// Re-parse and store an attribute value
    pub fn set(&mut self, name: &str, raw: &str, schema: &Schema) -> SchemaResult<&CachedAttribute> {
        let single = schema
            .is_single_property()
            .then(|| schema.get(Schema::SINGLE))
            .flatten();
        let cached = match single {
            Some(descriptor) => CachedAttribute::Value(descriptor.parse(raw)?),
            None => CachedAttribute::Pairs(parse_style(raw)),
        };
        self.entries.insert(name.to_string(), cached);
        Ok(&self.entries[name])
    }

    /// Drop a cached entry
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Drop all cached entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
