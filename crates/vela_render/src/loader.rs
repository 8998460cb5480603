//! Deduplicated asynchronous loads
//!
//! Fonts and textures are requested by source identifier. The first
//! request starts the actual load through the injected starter; later
//! requests for the same source attach as waiters instead of issuing a
//! second load. One completion fans out to every waiter and stays cached
//! for requests that arrive afterwards.
//!
//! Waiters whose liveness token was revoked (their component instance was
//! removed mid-flight) are skipped at fan-out. Retry policy belongs to
//! the loader collaborator, never to this cache.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use vela_core::Liveness;

/// Errors reported by load completions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("source not found: {0}")]
    NotFound(String),

    #[error("load failed: {0}")]
    Failed(String),
}

type Callback<T> = Box<dyn FnOnce(Result<T, LoadError>)>;

struct Waiter<T> {
    liveness: Option<Liveness>,
    callback: Callback<T>,
}

enum SourceState<T> {
    Pending(Vec<Waiter<T>>),
    Ready(Result<T, LoadError>),
}

enum Outcome<T> {
    Completed(Result<T, LoadError>),
    Started,
    Attached,
}

/// Cache of in-flight and completed loads keyed by source identifier
pub struct LoadCache<T> {
    sources: Arc<Mutex<HashMap<String, SourceState<T>>>>,
}

impl<T: Clone> LoadCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            sources: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Request a source, deduplicating concurrent loads
    ///
    /// `start` runs only for the first request of a source and receives
    /// the completer the host loader must invoke when done. `callback`
    /// runs when the result is available (immediately, if it already is),
    /// unless `liveness` was revoked by then.
    pub fn request(
        &self,
        source: &str,
        start: impl FnOnce(LoadCompleter<T>),
        liveness: Option<Liveness>,
        callback: impl FnOnce(Result<T, LoadError>) + 'static,
    ) {
        let mut waiter = Some((liveness, Box::new(callback) as Callback<T>));

        let outcome = {
            let mut sources = self.sources.lock();
            let state = sources
                .entry(source.to_string())
                .or_insert_with(|| SourceState::Pending(Vec::new()));
            match state {
                SourceState::Ready(result) => Outcome::Completed(result.clone()),
                SourceState::Pending(waiters) => {
                    // A pending entry always has at least one waiter, so
                    // an empty list means this request created it.
                    let first = waiters.is_empty();
                    if let Some((liveness, callback)) = waiter.take() {
                        waiters.push(Waiter { liveness, callback });
                    }
                    if first {
                        Outcome::Started
                    } else {
                        Outcome::Attached
                    }
                }
            }
        };

        match outcome {
            Outcome::Completed(result) => {
                if let Some((liveness, callback)) = waiter.take() {
                    if is_alive(&liveness) {
                        callback(result);
                    }
                }
            }
            Outcome::Started => start(LoadCompleter {
                sources: self.sources.clone(),
                source: source.to_string(),
            }),
            Outcome::Attached => {}
        }
    }

    /// Get the completed result for a source, if any
    pub fn get(&self, source: &str) -> Option<Result<T, LoadError>> {
        match self.sources.lock().get(source) {
            Some(SourceState::Ready(result)) => Some(result.clone()),
            _ => None,
        }
    }

    /// Check whether a load for a source is still in flight
    pub fn is_pending(&self, source: &str) -> bool {
        matches!(
            self.sources.lock().get(source),
            Some(SourceState::Pending(_))
        )
    }

    /// Number of tracked sources, pending and completed
    pub fn len(&self) -> usize {
        self.sources.lock().len()
    }

    /// Check if no sources are tracked
    pub fn is_empty(&self) -> bool {
        self.sources.lock().is_empty()
    }

    /// Forget all sources
    ///
    /// Pending waiters are dropped without being called; completers still
    /// in flight become no-ops.
    pub fn clear(&self) {
        self.sources.lock().clear();
    }
}

impl<T: Clone> Default for LoadCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for LoadCache<T> {
    fn clone(&self) -> Self {
        Self {
            sources: self.sources.clone(),
        }
    }
}

/// Completion handle for one in-flight load
pub struct LoadCompleter<T> {
    sources: Arc<Mutex<HashMap<String, SourceState<T>>>>,
    source: String,
}

impl<T: Clone> LoadCompleter<T> {
    /// The source identifier this completer belongs to
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Deliver the load result, fanning it out to every live waiter
    pub fn complete(self, result: Result<T, LoadError>) {
        let waiters = {
            let mut sources = self.sources.lock();
            match sources.get_mut(&self.source) {
                Some(state @ SourceState::Pending(_)) => {
                    let previous =
                        std::mem::replace(state, SourceState::Ready(result.clone()));
                    match previous {
                        SourceState::Pending(waiters) => waiters,
                        SourceState::Ready(_) => Vec::new(),
                    }
                }
                Some(SourceState::Ready(_)) => {
                    log::warn!("duplicate completion for `{}` ignored", self.source);
                    return;
                }
                None => return,
            }
        };

        for waiter in waiters {
            if is_alive(&waiter.liveness) {
                (waiter.callback)(result.clone());
            }
        }
    }
}

fn is_alive(liveness: &Option<Liveness>) -> bool {
    liveness.as_ref().map(Liveness::is_alive).unwrap_or(true)
}
