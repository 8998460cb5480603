//! Component lifecycle notifications
//!
//! Advisory events observed by unrelated systems (animation, editors).
//! Delivery is synchronous through the entity's event bus; failures to
//! observe never affect component state.

use vela_core::EntityId;

/// What happened to a component
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentEventKind {
    /// The component was created and its `init` hook ran
    Initialized,
    /// The component's data changed and its `update` hook ran
    Changed,
    /// The component was detached and its `remove` hook ran
    Removed,
}

/// A component lifecycle notification
#[derive(Clone, Debug)]
pub struct ComponentEvent {
    /// Entity the component belongs to
    pub entity: EntityId,
    /// Component name
    pub component: String,
    /// Lifecycle transition
    pub kind: ComponentEventKind,
    /// Names of the properties that changed in this transition
    pub changed: Vec<String>,
}
