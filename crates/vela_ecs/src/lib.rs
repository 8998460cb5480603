//! # vela_ecs - Declarative component system
//!
//! Entities carry named components whose typed data is parsed from
//! declarative attributes. This crate owns:
//! - The component registry (string key to factory)
//! - The component instance lifecycle state machine
//! - The per-node attribute cache
//! - Mixin resolution and change propagation

pub mod attribute;
pub mod component;
pub mod entity;
pub mod events;
pub mod instance;
pub mod mixin;
pub mod scene;

pub use attribute::{AttributeCache, CachedAttribute};
pub use component::{ComponentDef, ComponentRegistry, HookContext, SchemaRegistry};
pub use entity::{AttrInput, Entity};
pub use events::{ComponentEvent, ComponentEventKind};
pub use instance::{ComponentInstance, LifecycleState};
pub use mixin::{Mixin, MixinRegistry};
pub use scene::Scene;

use thiserror::Error;
use vela_schema::SchemaError;

/// Error returned by a component's own lifecycle hook
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Result type for component lifecycle hooks
pub type HookResult = Result<(), HookError>;

/// Errors from entity and component operations
#[derive(Debug, Error)]
pub enum EcsError {
    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    #[error("unknown entity {0}")]
    UnknownEntity(u64),

    #[error("unknown mixin `{0}`")]
    UnknownMixin(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("component `{component}` on entity {entity} failed during {phase}: {source}")]
    Lifecycle {
        component: String,
        entity: u64,
        phase: &'static str,
        #[source]
        source: HookError,
    },

    #[error("component `{0}` has already been removed")]
    Removed(String),
}
