//! Stable identifiers
//!
//! Entities and cache subscribers are identified by opaque `u64` newtypes.
//! Identifiers are never reused within a running scene.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an entity ID from a raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Allocator for entity IDs
///
/// IDs start at 1 so that 0 can serve as a sentinel in host layers.
pub struct EntityAllocator {
    next: AtomicU64,
}

impl EntityAllocator {
    /// Create a new allocator
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next entity ID
    pub fn allocate(&self) -> EntityId {
        EntityId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a subscriber to an event bus or resource cache
///
/// Entities subscribing to shared resources use their entity ID as the
/// subscriber identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Create a subscriber ID from a raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl From<EntityId> for SubscriberId {
    fn from(id: EntityId) -> Self {
        Self(id.raw())
    }
}
