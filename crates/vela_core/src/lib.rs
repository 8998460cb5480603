//! # vela_core - Shared primitives
//!
//! Foundation types used across the Vela crates:
//! - Stable entity and subscriber identifiers
//! - Entity-scoped synchronous event bus
//! - Liveness tokens for cancelling late asynchronous callbacks

pub mod events;
pub mod id;
pub mod liveness;

pub use events::EventBus;
pub use id::{EntityAllocator, EntityId, SubscriberId};
pub use liveness::Liveness;
