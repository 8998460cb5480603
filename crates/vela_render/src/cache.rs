//! Shared resource cache
//!
//! Resources are keyed by the canonical form of the component data that
//! built them, reference counted per subscribing entity, and disposed
//! exactly when the last subscriber releases. `reconcile` decides between
//! mutating a resource in place (sole subscriber, cheap) and replacing it
//! (shared, mutation would corrupt other subscribers' view).
//!
//! The cache trusts the schema engine's canonical stringification; it
//! never re-normalizes data itself.

use crate::backend::ResourceBackend;
use crate::ResourceError;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use vela_core::SubscriberId;
use vela_schema::ParsedData;

/// Shared handle to a cached resource
///
/// Handle identity is resource identity: two handles compare pointer-equal
/// exactly when they refer to the same constructed resource.
pub struct ResourceHandle<R>(Arc<Mutex<R>>);

impl<R> ResourceHandle<R> {
    fn new(resource: R) -> Self {
        Self(Arc::new(Mutex::new(resource)))
    }

    /// Lock the resource for access
    pub fn lock(&self) -> MutexGuard<'_, R> {
        self.0.lock()
    }

    /// Check whether two handles refer to the same resource
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl<R> Clone for ResourceHandle<R> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Entry<R> {
    handle: ResourceHandle<R>,
    ref_count: usize,
    subscribers: Vec<SubscriberId>,
}

/// Cache statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of resident cached entries
    pub entries: usize,
    /// Sum of reference counts across entries
    pub total_refs: usize,
    /// Number of opt-out resources outside the cache
    pub uncached: usize,
}

/// Reference-counted store of shared resources
pub struct ResourceCache<R, B: ResourceBackend<R>> {
    backend: B,
    entries: HashMap<String, Entry<R>>,
    uncached: Vec<ResourceHandle<R>>,
}

impl<R, B: ResourceBackend<R>> ResourceCache<R, B> {
    /// Create a cache around a backend
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            entries: HashMap::new(),
            uncached: Vec::new(),
        }
    }

    /// Get or create the resource for `data`, subscribing `subscriber`
    ///
    /// Construction is atomic: if the backend fails, no entry remains.
    pub fn acquire(
        &mut self,
        data: &ParsedData,
        subscriber: SubscriberId,
    ) -> Result<ResourceHandle<R>, ResourceError> {
        let key = data.canonical_key();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.ref_count += 1;
            entry.subscribers.push(subscriber);
            return Ok(entry.handle.clone());
        }

        let resource = self.backend.construct(data)?;
        let handle = ResourceHandle::new(resource);
        self.entries.insert(
            key,
            Entry {
                handle: handle.clone(),
                ref_count: 1,
                subscribers: vec![subscriber],
            },
        );
        Ok(handle)
    }

    /// Unsubscribe from the resource for `data`
    ///
    /// The entry is disposed and evicted when its count reaches zero.
    /// Releasing an unknown key is a defensive no-op so a caller holding
    /// stale data cannot double-free.
    pub fn release(&mut self, data: &ParsedData, subscriber: SubscriberId) {
        let key = data.canonical_key();
        let Some(entry) = self.entries.get_mut(&key) else {
            log::debug!("release of unknown resource key ignored");
            return;
        };

        let Some(position) = entry.subscribers.iter().position(|s| *s == subscriber) else {
            // Internal invariant breach: the entry exists but the caller
            // was never recorded against it.
            debug_assert!(
                false,
                "cache consistency violation: release from unrecorded subscriber"
            );
            log::error!("cache consistency violation: release from unrecorded subscriber");
            return;
        };
        entry.subscribers.swap_remove(position);
        entry.ref_count -= 1;

        if entry.ref_count == 0 {
            if let Some(entry) = self.entries.remove(&key) {
                self.dispose_handle(&entry.handle);
            }
        }
    }

    /// Move a subscriber from `old_data`'s resource to `new_data`'s
    ///
    /// Decision order:
    /// 1. An entry already exists at the new key: join it and release the
    ///    old one.
    /// 2. The subscriber is the sole holder of the old entry: mutate the
    ///    resource in place and re-key the entry, preserving identity.
    /// 3. The old entry is shared: acquire a fresh resource, then release
    ///    the old one.
    pub fn reconcile(
        &mut self,
        new_data: &ParsedData,
        old_data: &ParsedData,
        subscriber: SubscriberId,
    ) -> Result<ResourceHandle<R>, ResourceError> {
        let new_key = new_data.canonical_key();
        let old_key = old_data.canonical_key();
        if new_key == old_key {
            if let Some(entry) = self.entries.get(&new_key) {
                return Ok(entry.handle.clone());
            }
            return self.acquire(new_data, subscriber);
        }

        if self.entries.contains_key(&new_key) {
            self.release(old_data, subscriber);
            return self.acquire(new_data, subscriber);
        }

        let sole_holder = self
            .entries
            .get(&old_key)
            .map(|entry| entry.ref_count == 1 && entry.subscribers == [subscriber])
            .unwrap_or(false);
        if sole_holder {
            if let Some(entry) = self.entries.remove(&old_key) {
                self.backend.mutate(&mut entry.handle.lock(), new_data);
                let handle = entry.handle.clone();
                self.entries.insert(new_key, entry);
                return Ok(handle);
            }
        }

        // Shared by others (or old key unknown): never mutate in place.
        let handle = self.acquire(new_data, subscriber)?;
        self.release(old_data, subscriber);
        Ok(handle)
    }

    /// Construct a resource outside the cache
    ///
    /// Opt-out resources are never deduplicated or reference counted.
    /// They are tracked only so broadcast operations still reach them.
    pub fn acquire_uncached(&mut self, data: &ParsedData) -> Result<ResourceHandle<R>, ResourceError> {
        let resource = self.backend.construct(data)?;
        let handle = ResourceHandle::new(resource);
        self.uncached.push(handle.clone());
        Ok(handle)
    }

    /// Dispose an opt-out resource directly
    pub fn release_uncached(&mut self, handle: &ResourceHandle<R>) {
        let Some(position) = self
            .uncached
            .iter()
            .position(|other| ResourceHandle::ptr_eq(other, handle))
        else {
            log::debug!("release of unknown uncached resource ignored");
            return;
        };
        let handle = self.uncached.swap_remove(position);
        self.dispose_handle(&handle);
    }

    /// Apply an operation to every resource, cached and uncached
    ///
    /// Used for cache-wide invalidation such as marking all materials
    /// dirty after an environment change.
    pub fn mark_all_dirty(&mut self, mut mark: impl FnMut(&mut R)) {
        for entry in self.entries.values() {
            mark(&mut entry.handle.lock());
        }
        for handle in &self.uncached {
            mark(&mut handle.lock());
        }
    }

    /// Dispose everything and empty the cache
    pub fn clear(&mut self) {
        let entries: Vec<Entry<R>> = self.entries.drain().map(|(_, entry)| entry).collect();
        for entry in entries {
            self.dispose_handle(&entry.handle);
        }
        let uncached: Vec<ResourceHandle<R>> = self.uncached.drain(..).collect();
        for handle in uncached {
            self.dispose_handle(&handle);
        }
    }

    /// Current reference count for `data`'s resource, zero if absent
    pub fn ref_count(&self, data: &ParsedData) -> usize {
        self.entries
            .get(&data.canonical_key())
            .map(|entry| entry.ref_count)
            .unwrap_or(0)
    }

    /// Number of resident cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are resident
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            total_refs: self.entries.values().map(|entry| entry.ref_count).sum(),
            uncached: self.uncached.len(),
        }
    }

    /// Dispose a resource; failures are logged, never retried
    fn dispose_handle(&mut self, handle: &ResourceHandle<R>) {
        if let Err(error) = self.backend.dispose(&mut handle.lock()) {
            log::warn!("resource disposal failed: {}", error);
        }
    }
}
