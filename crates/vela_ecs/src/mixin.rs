//! Mixins
//!
//! A mixin is a named, reusable attribute set applied to entities before
//! their own explicit attributes. Mixins keep a cache of pre-parsed
//! values so entities folding them in do not re-split the same strings on
//! every rebuild. Mixin definitions can change after entities attach, so
//! the registry tracks a revision and the scene re-applies affected
//! components on change.

use crate::attribute::{AttributeCache, CachedAttribute};
use std::collections::{BTreeMap, HashMap};
use vela_schema::{Schema, SchemaResult};

/// A named, reusable attribute set
pub struct Mixin {
    id: String,
    attributes: BTreeMap<String, String>,
    cache: AttributeCache,
}

impl Mixin {
    /// Create an empty mixin
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            attributes: BTreeMap::new(),
            cache: AttributeCache::new(),
        }
    }

    /// Mixin identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the raw attribute value for a component name
    ///
    /// Invalidates the cached parse for that component.
    pub fn set_attribute(&mut self, component: &str, raw: &str) {
        self.attributes.insert(component.to_string(), raw.to_string());
        self.cache.invalidate(component);
    }

    /// Remove an attribute
    pub fn remove_attribute(&mut self, component: &str) -> bool {
        self.cache.invalidate(component);
        self.attributes.remove(component).is_some()
    }

    /// Raw attribute value for a component name
    pub fn raw(&self, component: &str) -> Option<&str> {
        self.attributes.get(component).map(String::as_str)
    }

    /// Component names this mixin declares
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Parse and cache the attribute for a component against its schema
    pub fn cache_attribute(&mut self, component: &str, schema: &Schema) -> SchemaResult<()> {
        if let Some(raw) = self.attributes.get(component) {
            self.cache.set(component, raw, schema)?;
        }
        Ok(())
    }

    /// Pre-parsed attribute value, if cached
    pub fn cached(&self, component: &str) -> Option<&CachedAttribute> {
        self.cache.get(component)
    }

    /// Effective override pairs this mixin contributes for a component
    ///
    /// Uses the parsed cache when warm, splitting the raw string
    /// otherwise.
    pub fn override_pairs(&self, component: &str, schema: &Schema) -> Option<BTreeMap<String, String>> {
        if let Some(cached) = self.cache.get(component) {
            return Some(cached.as_pairs());
        }
        let raw = self.attributes.get(component)?;
        if schema.is_single_property() {
            let mut pairs = BTreeMap::new();
            pairs.insert(Schema::SINGLE.to_string(), raw.clone());
            Some(pairs)
        } else {
            Some(vela_schema::parse_style(raw))
        }
    }
}

/// Registry of mixins by identifier
#[derive(Default)]
pub struct MixinRegistry {
    mixins: HashMap<String, Mixin>,
    revision: u64,
}

impl MixinRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a mixin
    pub fn insert(&mut self, mixin: Mixin) {
        self.revision += 1;
        self.mixins.insert(mixin.id().to_string(), mixin);
    }

    /// Get a mixin by id
    pub fn get(&self, id: &str) -> Option<&Mixin> {
        self.mixins.get(id)
    }

    /// Get a mixin mutably by id, bumping the revision
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Mixin> {
        self.revision += 1;
        self.mixins.get_mut(id)
    }

    /// Remove a mixin
    pub fn remove(&mut self, id: &str) -> Option<Mixin> {
        self.revision += 1;
        self.mixins.remove(id)
    }

    /// Check if a mixin exists
    pub fn contains(&self, id: &str) -> bool {
        self.mixins.contains_key(id)
    }

    /// Monotonic revision, bumped on every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_schema::PropertyDescriptor;

    fn material_schema() -> Schema {
        Schema::new()
            .property("color", PropertyDescriptor::string("white"))
            .property("opacity", PropertyDescriptor::number(1.0))
    }

    #[test]
    fn test_override_pairs_without_cache() {
        let mut mixin = Mixin::new("glass");
        mixin.set_attribute("material", "opacity: 0.3");

        let pairs = mixin.override_pairs("material", &material_schema()).unwrap();
        assert_eq!(pairs.get("opacity").map(String::as_str), Some("0.3"));
    }

    #[test]
    fn test_cache_attribute_warms_cache() {
        let mut mixin = Mixin::new("glass");
        mixin.set_attribute("material", "color: red");
        mixin.cache_attribute("material", &material_schema()).unwrap();

        assert!(mixin.cached("material").is_some());
        let pairs = mixin.override_pairs("material", &material_schema()).unwrap();
        assert_eq!(pairs.get("color").map(String::as_str), Some("red"));
    }

    #[test]
    fn test_set_attribute_invalidates_cache() {
        let mut mixin = Mixin::new("glass");
        mixin.set_attribute("material", "color: red");
        mixin.cache_attribute("material", &material_schema()).unwrap();

        mixin.set_attribute("material", "color: blue");
        assert!(mixin.cached("material").is_none());
    }

    #[test]
    fn test_registry_revision() {
        let mut registry = MixinRegistry::new();
        let before = registry.revision();
        registry.insert(Mixin::new("glass"));
        assert!(registry.revision() > before);
    }
}
