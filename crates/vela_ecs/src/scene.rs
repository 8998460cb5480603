//! Scene
//!
//! The scene owns the component registry, the mixin registry, and all
//! entities. It is the convenience surface for hosts: per-entity
//! operations resolve registries automatically, and mixin mutations
//! propagate to every entity referencing the changed mixin.

use crate::component::ComponentRegistry;
use crate::entity::{AttrInput, Entity};
use crate::mixin::{Mixin, MixinRegistry};
use crate::EcsError;
use std::collections::HashMap;
use vela_core::{EntityAllocator, EntityId};
use vela_schema::ParsedData;

/// Container for entities and registries
pub struct Scene {
    components: ComponentRegistry,
    mixins: MixinRegistry,
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    allocator: EntityAllocator,
}

impl Scene {
    /// Create a scene around a component registry
    ///
    /// Component registration must be complete before entities referencing
    /// those names are created.
    pub fn new(components: ComponentRegistry) -> Self {
        Self {
            components,
            mixins: MixinRegistry::new(),
            entities: HashMap::new(),
            order: Vec::new(),
            allocator: EntityAllocator::new(),
        }
    }

    /// The component registry
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The mixin registry
    pub fn mixins(&self) -> &MixinRegistry {
        &self.mixins
    }

    /// Create a new empty entity
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.insert(id, Entity::new(id));
        self.order.push(id);
        id
    }

    /// Destroy an entity, removing all of its components
    pub fn remove_entity(&mut self, id: EntityId) -> Result<(), EcsError> {
        let mut entity = self
            .entities
            .remove(&id)
            .ok_or(EcsError::UnknownEntity(id.raw()))?;
        self.order.retain(|other| *other != id);
        entity.destroy()
    }

    /// Get an entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get an entity mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Apply raw data to a component of an entity
    pub fn set_data(
        &mut self,
        id: EntityId,
        component: &str,
        input: impl Into<AttrInput>,
    ) -> Result<(), EcsError> {
        self.set_data_with(id, component, input, false)
    }

    /// Apply raw data, rejecting property names missing from the schema
    pub fn set_data_strict(
        &mut self,
        id: EntityId,
        component: &str,
        input: impl Into<AttrInput>,
    ) -> Result<(), EcsError> {
        self.set_data_with(id, component, input, true)
    }

    fn set_data_with(
        &mut self,
        id: EntityId,
        component: &str,
        input: impl Into<AttrInput>,
        strict: bool,
    ) -> Result<(), EcsError> {
        let Self {
            components,
            mixins,
            entities,
            ..
        } = self;
        let entity = entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id.raw()))?;
        entity.set_data(components, mixins, component, input, strict)
    }

    /// Current parsed data for a component of an entity
    pub fn get_data(&self, id: EntityId, component: &str) -> Option<&ParsedData> {
        self.entities.get(&id)?.get_data(component)
    }

    /// Detach a component from an entity
    pub fn remove_component(&mut self, id: EntityId, component: &str) -> Result<(), EcsError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id.raw()))?;
        entity.remove_component(component)
    }

    /// Replace an entity's mixin list and re-apply affected components
    ///
    /// Components declared by the new mixins are created if the entity
    /// does not yet carry them.
    pub fn set_mixins(&mut self, id: EntityId, mixin_ids: Vec<String>) -> Result<(), EcsError> {
        let affected = {
            let entity = self
                .entities
                .get_mut(&id)
                .ok_or(EcsError::UnknownEntity(id.raw()))?;
            entity.set_mixins(mixin_ids.clone());

            let mut names: Vec<String> =
                entity.component_names().iter().map(|n| n.to_string()).collect();
            for mixin_id in &mixin_ids {
                if let Some(mixin) = self.mixins.get(mixin_id) {
                    for component in mixin.components() {
                        if !names.iter().any(|n| n == component) {
                            names.push(component.to_string());
                        }
                    }
                }
            }
            names
        };
        self.refresh_entity_components(id, &affected)
    }

    /// Define or replace a mixin and refresh entities referencing it
    pub fn define_mixin(&mut self, mut mixin: Mixin) -> Result<(), EcsError> {
        // Warm the mixin's parse cache for every component the registry
        // knows about.
        let components: Vec<String> = mixin.components().map(|n| n.to_string()).collect();
        for name in &components {
            if let Some(def) = self.components.create(name) {
                mixin.cache_attribute(name, &def.schema())?;
            }
        }

        let mixin_id = mixin.id().to_string();
        self.mixins.insert(mixin);
        self.refresh_mixin_consumers(&mixin_id, &components)
    }

    /// Update one attribute of a mixin and refresh entities referencing it
    pub fn set_mixin_attribute(
        &mut self,
        mixin_id: &str,
        component: &str,
        raw: &str,
    ) -> Result<(), EcsError> {
        let schema = self.components.create(component).map(|def| def.schema());
        {
            let mixin = self
                .mixins
                .get_mut(mixin_id)
                .ok_or_else(|| EcsError::UnknownMixin(mixin_id.to_string()))?;
            mixin.set_attribute(component, raw);
            if let Some(schema) = &schema {
                mixin.cache_attribute(component, schema)?;
            }
        }
        self.refresh_mixin_consumers(mixin_id, &[component.to_string()])
    }

    /// Re-apply components on every entity referencing a mixin
    fn refresh_mixin_consumers(
        &mut self,
        mixin_id: &str,
        components: &[String],
    ) -> Result<(), EcsError> {
        let affected: Vec<EntityId> = self
            .order
            .iter()
            .copied()
            .filter(|id| {
                self.entities
                    .get(id)
                    .map(|e| e.mixins().iter().any(|m| m == mixin_id))
                    .unwrap_or(false)
            })
            .collect();

        let mut first_error = None;
        for id in affected {
            if let Err(error) = self.refresh_entity_components(id, components) {
                log::error!("mixin `{}` refresh failed on entity {}: {}", mixin_id, id.raw(), error);
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn refresh_entity_components(
        &mut self,
        id: EntityId,
        components: &[String],
    ) -> Result<(), EcsError> {
        let Self {
            components: registry,
            mixins,
            entities,
            ..
        } = self;
        let entity = entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id.raw()))?;

        let mut first_error = None;
        for name in components {
            // Only create missing components for names the registry knows;
            // refreshing an attached component never silently skips.
            if entity.component(name).is_none() && !registry.contains(name) {
                continue;
            }
            if let Err(error) = entity.refresh_component(registry, mixins, name) {
                log::error!("refresh of `{}` failed on entity {}: {}", name, id.raw(), error);
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Drive per-frame behavior for every entity in creation order
    pub fn tick(&mut self, time: f64, delta: f64) {
        for id in &self.order {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.tick(time, delta);
            }
        }
    }
}
