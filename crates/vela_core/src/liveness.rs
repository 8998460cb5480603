//! Liveness tokens
//!
//! A component instance hands clones of its liveness token to asynchronous
//! work it starts (texture loads, font loads). When the instance is removed
//! it revokes the token, and any callback still in flight observes the
//! revocation and becomes a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for asynchronous continuations
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    /// Create a new, live token
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Check whether the owning instance is still alive
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Revoke the token, marking the owner unavailable for continuation
    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
