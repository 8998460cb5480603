//! Entities
//!
//! An entity owns its component instances and the raw attribute layers
//! they are built from. Data flows through one pipeline on every change:
//!
//! ```text
//! mixins (left to right) ◄─ overlaid by ─ entity overrides
//!         │
//!         ▼
//! active schema apply ──► ParsedData ──► diff ──► update hook
//! ```
//!
//! Within one `set_data` call, the affected component's `update` runs
//! before control returns to the caller.

use crate::component::{ComponentRegistry, HookContext};
use crate::events::{ComponentEvent, ComponentEventKind};
use crate::instance::{ComponentInstance, LifecycleState};
use crate::mixin::MixinRegistry;
use crate::EcsError;
use std::collections::{BTreeMap, HashMap};
use vela_core::{EntityId, EventBus};
use vela_schema::{parse_style, ParsedData, Schema};

/// Raw attribute input for a component
///
/// A full declaration string replaces the entity's accumulated explicit
/// overrides for the component; a partial map merges into them.
#[derive(Clone, Debug)]
pub enum AttrInput {
    /// Full declaration text, e.g. `color: red; opacity: 0.5`
    Text(String),
    /// Partial property-name to raw-value overrides
    Pairs(BTreeMap<String, String>),
}

impl From<&str> for AttrInput {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<String> for AttrInput {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

impl From<BTreeMap<String, String>> for AttrInput {
    fn from(pairs: BTreeMap<String, String>) -> Self {
        Self::Pairs(pairs)
    }
}

/// An entity in the scene
pub struct Entity {
    id: EntityId,
    mixins: Vec<String>,
    overrides: HashMap<String, BTreeMap<String, String>>,
    components: Vec<ComponentInstance>,
    events: EventBus<ComponentEvent>,
}

impl Entity {
    /// Create an entity with no components
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            mixins: Vec::new(),
            overrides: HashMap::new(),
            components: Vec::new(),
            events: EventBus::new(),
        }
    }

    /// Entity identifier
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Mixin references in application order
    pub fn mixins(&self) -> &[String] {
        &self.mixins
    }

    /// Replace the mixin reference list
    ///
    /// Callers must re-apply affected components afterwards; the scene's
    /// `set_mixins` does both.
    pub fn set_mixins(&mut self, mixins: Vec<String>) {
        self.mixins = mixins;
    }

    /// The entity's lifecycle event bus
    pub fn events(&mut self) -> &mut EventBus<ComponentEvent> {
        &mut self.events
    }

    /// Component names in registration order
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Get a component instance by name
    pub fn component(&self, name: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.name() == name)
    }

    /// Current parsed data for a component
    pub fn get_data(&self, name: &str) -> Option<&ParsedData> {
        self.component(name)
            .filter(|c| c.state() == LifecycleState::Initialized)
            .map(|c| c.data())
    }

    /// Apply raw data to a component, creating it on first use
    pub fn set_data(
        &mut self,
        registry: &ComponentRegistry,
        mixins: &MixinRegistry,
        name: &str,
        input: impl Into<AttrInput>,
        strict: bool,
    ) -> Result<(), EcsError> {
        self.update_component(registry, mixins, name, Some(input.into()), strict, false)
    }

    /// Re-resolve mixins and force a rebuild of one component
    ///
    /// Used when a referenced mixin changed after attachment. Creates the
    /// component if a mixin declares it and the entity does not yet carry
    /// it.
    pub fn refresh_component(
        &mut self,
        registry: &ComponentRegistry,
        mixins: &MixinRegistry,
        name: &str,
    ) -> Result<(), EcsError> {
        self.update_component(registry, mixins, name, None, false, true)
    }

    fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name() == name)
    }

    fn update_component(
        &mut self,
        registry: &ComponentRegistry,
        mixins: &MixinRegistry,
        name: &str,
        input: Option<AttrInput>,
        strict: bool,
        forced: bool,
    ) -> Result<(), EcsError> {
        match self.component_index(name) {
            None => self.first_update(registry, mixins, name, input, strict),
            Some(index) => self.subsequent_update(mixins, index, input, strict, forced),
        }
    }

    /// Create the instance, build fully-defaulted data, run `init`
    fn first_update(
        &mut self,
        registry: &ComponentRegistry,
        mixins: &MixinRegistry,
        name: &str,
        input: Option<AttrInput>,
        strict: bool,
    ) -> Result<(), EcsError> {
        let def = registry
            .create(name)
            .ok_or_else(|| EcsError::UnknownComponent(name.to_string()))?;
        let mut instance = ComponentInstance::new(name, def);

        let mut overrides = BTreeMap::new();
        if let Some(input) = input {
            apply_input(&mut overrides, input, instance.schema());
        }
        let merged = merge_layers(&self.mixins, mixins, name, instance.schema(), &overrides);

        // Recompute the schema from a tentative non-strict parse so a
        // discriminator in the initial declaration selects its variant
        // before the real parse happens.
        let tentative = instance.schema().apply(&ParsedData::new(), &merged, false)?;
        if let Some(schema) = instance.recompute_schema(&tentative) {
            instance.set_schema(schema);
        }

        let data = instance
            .schema()
            .apply(&ParsedData::new(), &merged, strict)?;
        let changed: Vec<String> = data.names().map(str::to_string).collect();

        let mut ctx = HookContext::new(self.id, instance.liveness());
        instance.initialize(&mut ctx, data)?;

        self.overrides.insert(name.to_string(), overrides);
        self.components.push(instance);
        self.events.emit(&ComponentEvent {
            entity: self.id,
            component: name.to_string(),
            kind: ComponentEventKind::Initialized,
            changed,
        });
        Ok(())
    }

    /// Rebuild data for an existing instance and run `update` if anything
    /// changed
    fn subsequent_update(
        &mut self,
        mixins: &MixinRegistry,
        index: usize,
        input: Option<AttrInput>,
        strict: bool,
        forced: bool,
    ) -> Result<(), EcsError> {
        let name = self.components[index].name().to_string();
        let mut overrides = self.overrides.get(&name).cloned().unwrap_or_default();

        let instance = &mut self.components[index];
        if let Some(input) = input {
            apply_input(&mut overrides, input, instance.schema());
        }
        let merged = merge_layers(&self.mixins, mixins, &name, instance.schema(), &overrides);

        // Schema mutation happens before the strict parse; the new schema
        // is only committed once that parse succeeds.
        let tentative = instance.schema().apply(instance.data(), &merged, false)?;
        let recomputed = instance
            .recompute_schema(&tentative)
            .filter(|schema| schema != instance.schema());

        let active = recomputed.as_ref().unwrap_or_else(|| instance.schema());
        let new_data = active.apply(instance.data(), &merged, strict)?;
        let changes = instance.diff_against_current(&new_data);

        let schema_changed = recomputed.is_some();
        if let Some(schema) = recomputed {
            instance.set_schema(schema);
        }

        if changes.is_empty() && !forced && !schema_changed {
            self.overrides.insert(name, overrides);
            return Ok(());
        }

        let changed: Vec<String> = changes
            .changed_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        let mut ctx = HookContext::new(self.id, instance.liveness());
        instance.apply_update(&mut ctx, new_data, &changes)?;

        self.overrides.insert(name.clone(), overrides);
        self.events.emit(&ComponentEvent {
            entity: self.id,
            component: name,
            kind: ComponentEventKind::Changed,
            changed,
        });
        Ok(())
    }

    /// Detach a component, running its `remove` hook exactly once
    pub fn remove_component(&mut self, name: &str) -> Result<(), EcsError> {
        let index = self
            .component_index(name)
            .ok_or_else(|| EcsError::UnknownComponent(name.to_string()))?;
        let mut instance = self.components.remove(index);
        self.overrides.remove(name);

        let changed: Vec<String> = instance.data().names().map(str::to_string).collect();
        let mut ctx = HookContext::new(self.id, instance.liveness());
        let result = instance.shutdown(&mut ctx);

        self.events.emit(&ComponentEvent {
            entity: self.id,
            component: name.to_string(),
            kind: ComponentEventKind::Removed,
            changed,
        });
        result
    }

    /// Detach all components, newest first
    ///
    /// Teardown continues past hook failures; the first error is
    /// returned once every component has been detached.
    pub fn destroy(&mut self) -> Result<(), EcsError> {
        let mut first_error = None;
        while let Some(mut instance) = self.components.pop() {
            let name = instance.name().to_string();
            self.overrides.remove(&name);

            let changed: Vec<String> = instance.data().names().map(str::to_string).collect();
            let mut ctx = HookContext::new(self.id, instance.liveness());
            if let Err(error) = instance.shutdown(&mut ctx) {
                log::error!("error removing `{}` during destroy: {}", name, error);
                first_error.get_or_insert(error);
            }
            self.events.emit(&ComponentEvent {
                entity: self.id,
                component: name,
                kind: ComponentEventKind::Removed,
                changed,
            });
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Run per-frame hooks in component registration order
    pub fn tick(&mut self, time: f64, delta: f64) {
        for instance in self.components.iter_mut() {
            let mut ctx = HookContext::new(self.id, instance.liveness());
            instance.frame(&mut ctx, time, delta);
        }
    }
}

/// Fold an input into the accumulated explicit overrides
fn apply_input(overrides: &mut BTreeMap<String, String>, input: AttrInput, schema: &Schema) {
    match input {
        AttrInput::Text(raw) => {
            // A full declaration string replaces prior explicit values.
            overrides.clear();
            if schema.is_single_property() {
                overrides.insert(Schema::SINGLE.to_string(), raw);
            } else {
                overrides.extend(parse_style(&raw));
            }
        }
        AttrInput::Pairs(pairs) => {
            overrides.extend(pairs);
        }
    }
}

/// Resolve the effective raw overrides for one component
///
/// Mixins fold left to right, later mixins overriding earlier ones, and
/// the entity's own explicit values win over all of them.
fn merge_layers(
    mixin_ids: &[String],
    mixins: &MixinRegistry,
    component: &str,
    schema: &Schema,
    own: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for id in mixin_ids {
        match mixins.get(id) {
            Some(mixin) => {
                if let Some(pairs) = mixin.override_pairs(component, schema) {
                    merged.extend(pairs);
                }
            }
            None => log::warn!("entity references unknown mixin `{}`", id),
        }
    }
    merged.extend(own.clone());
    merged
}
