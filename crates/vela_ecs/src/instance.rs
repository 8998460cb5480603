//! Component instances
//!
//! One instance owns the typed data for one (entity, component) pair and
//! drives the lifecycle state machine:
//!
//! ```text
//! Uninitialized ──init──► Initialized ──update──► Initialized ...
//!                              │
//!                           remove
//!                              ▼
//!                           Removed (terminal)
//! ```
//!
//! Re-adding a component name after removal creates a new instance, never
//! a resurrection.

use crate::component::{ComponentDef, HookContext};
use crate::EcsError;
use vela_core::Liveness;
use vela_schema::{diff, DataDiff, ParsedData, Schema};

/// Lifecycle state of a component instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created but `init` has not run
    Uninitialized,
    /// `init` ran; `update` may run any number of times
    Initialized,
    /// `remove` ran; no further lifecycle calls are made
    Removed,
}

/// A component attached to one entity
pub struct ComponentInstance {
    name: String,
    def: Box<dyn ComponentDef>,
    schema: Schema,
    data: ParsedData,
    old_data: ParsedData,
    state: LifecycleState,
    liveness: Liveness,
}

impl ComponentInstance {
    /// Create an uninitialized instance around a definition
    pub fn new(name: &str, def: Box<dyn ComponentDef>) -> Self {
        let schema = def.schema();
        Self {
            name: name.to_string(),
            def,
            schema,
            data: ParsedData::new(),
            old_data: ParsedData::new(),
            state: LifecycleState::Uninitialized,
            liveness: Liveness::new(),
        }
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current fully-defaulted data
    pub fn data(&self) -> &ParsedData {
        &self.data
    }

    /// Data as it was before the most recent update
    pub fn old_data(&self) -> &ParsedData {
        &self.old_data
    }

    /// Lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Currently active schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The definition behind this instance
    pub fn def(&self) -> &dyn ComponentDef {
        self.def.as_ref()
    }

    /// Clone the liveness token guarding asynchronous continuations
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Replace the active schema after a dynamic recomputation
    pub(crate) fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }

    /// Recompute the active schema from candidate data
    pub(crate) fn recompute_schema(&self, candidate: &ParsedData) -> Option<Schema> {
        self.def.update_schema(candidate)
    }

    /// Run `init` with fully-defaulted data
    ///
    /// A hook failure leaves the instance unusable; the caller must drop
    /// it rather than retry.
    pub(crate) fn initialize(
        &mut self,
        ctx: &mut HookContext,
        data: ParsedData,
    ) -> Result<(), EcsError> {
        debug_assert_eq!(self.state, LifecycleState::Uninitialized);
        self.data = data;
        self.def
            .init(ctx, &self.data)
            .map_err(|source| {
                log::error!(
                    "init of `{}` on entity {} failed: {}",
                    self.name,
                    ctx.entity.raw(),
                    source
                );
                EcsError::Lifecycle {
                    component: self.name.clone(),
                    entity: ctx.entity.raw(),
                    phase: "init",
                    source,
                }
            })?;
        self.state = LifecycleState::Initialized;
        Ok(())
    }

    /// Apply new data and run `update` with the preceding snapshot
    pub(crate) fn apply_update(
        &mut self,
        ctx: &mut HookContext,
        new_data: ParsedData,
        changes: &DataDiff,
    ) -> Result<(), EcsError> {
        if self.state == LifecycleState::Removed {
            return Err(EcsError::Removed(self.name.clone()));
        }
        self.old_data = std::mem::replace(&mut self.data, new_data);
        self.def
            .update(ctx, &self.data, &self.old_data, changes)
            .map_err(|source| {
                log::error!(
                    "update of `{}` on entity {} failed: {}",
                    self.name,
                    ctx.entity.raw(),
                    source
                );
                EcsError::Lifecycle {
                    component: self.name.clone(),
                    entity: ctx.entity.raw(),
                    phase: "update",
                    source,
                }
            })
    }

    /// Run `remove`, revoke liveness, and enter the terminal state
    ///
    /// The liveness token is revoked before the hook runs so any
    /// asynchronous callback the component started is already inert.
    pub(crate) fn shutdown(&mut self, ctx: &mut HookContext) -> Result<(), EcsError> {
        if self.state == LifecycleState::Removed {
            return Err(EcsError::Removed(self.name.clone()));
        }
        self.liveness.revoke();
        let was_initialized = self.state == LifecycleState::Initialized;
        self.state = LifecycleState::Removed;
        if !was_initialized {
            return Ok(());
        }
        self.def
            .remove(ctx, &self.data)
            .map_err(|source| {
                log::error!(
                    "remove of `{}` on entity {} failed: {}",
                    self.name,
                    ctx.entity.raw(),
                    source
                );
                EcsError::Lifecycle {
                    component: self.name.clone(),
                    entity: ctx.entity.raw(),
                    phase: "remove",
                    source,
                }
            })
    }

    /// Run the per-frame hook
    pub(crate) fn frame(&mut self, ctx: &mut HookContext, time: f64, delta: f64) {
        if self.state == LifecycleState::Initialized {
            self.def.tick(ctx, &self.data, time, delta);
        }
    }

    /// Diff new candidate data against the current snapshot
    pub(crate) fn diff_against_current(&self, candidate: &ParsedData) -> DataDiff {
        diff(&self.data, candidate)
    }
}
