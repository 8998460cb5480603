//! Resource backend seam
//!
//! One backend is injected per resource family (materials, geometries).
//! The cache drives it; components never touch it directly.

use crate::ResourceError;
use vela_schema::ParsedData;

/// Constructor, mutator, and disposer for one resource family
pub trait ResourceBackend<R> {
    /// Build a new resource from resolved component data
    fn construct(&mut self, data: &ParsedData) -> Result<R, ResourceError>;

    /// Rewrite an existing resource's fields to match new data
    ///
    /// Only the cache calls this, and only when no other subscriber can
    /// observe the mutation.
    fn mutate(&mut self, resource: &mut R, data: &ParsedData);

    /// Release the resource
    fn dispose(&mut self, resource: &mut R) -> Result<(), ResourceError>;
}
