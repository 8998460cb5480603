//! # vela_render - Shared rendering resources
//!
//! Expensive constructed resources (materials, geometries) are shared
//! across entities through a reference-counted cache keyed by canonical
//! component data. This crate owns:
//! - The resource cache with its mutate-in-place versus replace decision
//! - The opt-out registry for intentionally isolated resources
//! - The deduplicated asynchronous load cache
//!
//! Construction of actual rendering objects stays behind the injected
//! [`ResourceBackend`]; the cache never builds resources itself.

pub mod backend;
pub mod cache;
pub mod loader;

pub use backend::ResourceBackend;
pub use cache::{CacheStats, ResourceCache, ResourceHandle};
pub use loader::{LoadCache, LoadCompleter, LoadError};

use thiserror::Error;

/// Errors from resource cache operations
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The rendering backend failed to construct a resource
    #[error("resource construction failed: {0}")]
    Construction(String),

    /// The rendering backend failed to dispose a resource
    #[error("resource disposal failed: {0}")]
    Disposal(String),
}
