//! Component definitions and registries
//!
//! Components are registered by string key as factories producing values
//! behind a small capability interface. No inheritance hierarchy: a
//! definition is data (its schema) plus lifecycle hooks.

use crate::HookResult;
use std::collections::HashMap;
use vela_core::{EntityId, Liveness};
use vela_schema::{DataDiff, ParsedData, Schema};

/// Context handed to lifecycle hooks
pub struct HookContext {
    /// Entity the component instance is attached to
    pub entity: EntityId,
    liveness: Liveness,
}

impl HookContext {
    pub(crate) fn new(entity: EntityId, liveness: Liveness) -> Self {
        Self { entity, liveness }
    }

    /// Clone the owning instance's liveness token
    ///
    /// Hand this to asynchronous work so late callbacks can detect that
    /// the instance was removed and bail out.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }
}

/// Capability interface for a component definition
///
/// All hooks default to no-ops so simple data-only components declare
/// nothing but a schema.
pub trait ComponentDef {
    /// The component's declared schema
    fn schema(&self) -> Schema;

    /// Recompute the active schema from current data
    ///
    /// Implemented by components whose schema depends on a discriminator
    /// property (a geometry's `primitive`, a material's `shader`). Return
    /// `None` to keep the declared schema.
    fn update_schema(&self, _data: &ParsedData) -> Option<Schema> {
        None
    }

    /// Called once when the component is first attached
    fn init(&mut self, _ctx: &mut HookContext, _data: &ParsedData) -> HookResult {
        Ok(())
    }

    /// Called on every applied data change with a non-empty diff
    fn update(
        &mut self,
        _ctx: &mut HookContext,
        _data: &ParsedData,
        _old_data: &ParsedData,
        _diff: &DataDiff,
    ) -> HookResult {
        Ok(())
    }

    /// Called exactly once when the component is detached
    fn remove(&mut self, _ctx: &mut HookContext, _data: &ParsedData) -> HookResult {
        Ok(())
    }

    /// Called once per frame for components with per-frame behavior
    fn tick(&mut self, _ctx: &mut HookContext, _data: &ParsedData, _time: f64, _delta: f64) {}
}

/// Factory producing a fresh component definition per instance
pub type ComponentFactory = Box<dyn Fn() -> Box<dyn ComponentDef>>;

/// Registry mapping component names to factories
///
/// Registration must complete before any entity referencing a name is
/// constructed. Tests reset state by building a fresh registry.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component factory under a name
    ///
    /// Re-registering a name replaces the previous factory; existing
    /// instances keep the definition they were created with.
    pub fn register(
        &mut self,
        name: &str,
        factory: impl Fn() -> Box<dyn ComponentDef> + 'static,
    ) {
        if self
            .factories
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            log::warn!("component `{}` re-registered", name);
        }
    }

    /// Remove a component registration
    pub fn unregister(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// Create a fresh definition for a registered component
    pub fn create(&self, name: &str) -> Option<Box<dyn ComponentDef>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Check if a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered component names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if no components are registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Registry of named sub-schemas
///
/// Holds the per-variant parameter sets consulted by dynamic schemas:
/// geometry primitives and material shaders register their own property
/// sets here, keyed by the discriminator value.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-schema under a variant name
    pub fn register(&mut self, name: &str, schema: Schema) {
        self.schemas.insert(name.to_string(), schema);
    }

    /// Remove a sub-schema registration
    pub fn unregister(&mut self, name: &str) -> bool {
        self.schemas.remove(name).is_some()
    }

    /// Get a sub-schema by variant name
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Check if a variant is registered
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered variant names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
