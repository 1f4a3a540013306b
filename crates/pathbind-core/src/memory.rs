#![forbid(unsafe_code)]

//! Reference in-memory [`Model`] implementation.
//!
//! `MemoryModel` backs the full capability contract with a local JSON cache:
//! fetches resolve synchronously against the cache, [`commit`] mutations
//! advance the version and notify change observers, and
//! [`Model::set_cache`] is a silent local override (no version advance, no
//! notification). Real deployments substitute a model that talks to a
//! remote graph; the binding layer cannot tell the difference.
//!
//! [`commit`]: MemoryModel::commit

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::model::{ChangeObserver, ChangeObservers, FetchFuture, FetchResponse, Model, Version};
use crate::path::{Path, PathKey};
use crate::promise::Promise;

/// In-memory model: JSON cache + version counter + ordered observers.
pub struct MemoryModel {
    cache: RefCell<Value>,
    version: Cell<Version>,
    observers: ChangeObservers,
}

impl MemoryModel {
    /// Create a model seeded with `cache` at [`Version::initial`].
    #[must_use]
    pub fn new(cache: Value) -> Self {
        Self {
            cache: RefCell::new(cache),
            version: Cell::new(Version::initial()),
            observers: ChangeObservers::new(),
        }
    }

    /// Create an empty model behind a shared handle.
    #[must_use]
    pub fn shared(cache: Value) -> Rc<Self> {
        Rc::new(Self::new(cache))
    }

    /// Deep-merge `partial` into the cache, advance the version, and notify
    /// observers. This is the mutation path that broadcasts.
    pub fn commit(&self, partial: Value) {
        {
            let mut cache = self.cache.borrow_mut();
            deep_merge(&mut cache, partial);
        }
        let next = self.version.get().next();
        self.version.set(next);
        trace!(version = %next, "memory model committed");
        self.observers.notify();
    }

    fn resolve(&self, paths: &[Path]) -> Value {
        let cache = self.cache.borrow();
        let mut envelope = Value::Object(Map::new());
        for path in paths {
            if let Some(leaf) = lookup(&cache, path) {
                graft(&mut envelope, path, leaf.clone());
            }
        }
        envelope
    }
}

impl Model for MemoryModel {
    fn version(&self) -> Version {
        self.version.get()
    }

    fn cache(&self) -> Value {
        self.cache.borrow().clone()
    }

    fn set_cache(&self, snapshot: Value) {
        // Local override: no version advance, no observer notification.
        *self.cache.borrow_mut() = snapshot;
    }

    fn get(&self, paths: &[Path]) -> FetchFuture {
        let json = self.resolve(paths);
        Promise::resolved(Ok(FetchResponse { json }))
    }

    fn observe_change(&self, observer: Rc<dyn Fn()>) -> ChangeObserver {
        self.observers.add(observer)
    }
}

impl std::fmt::Debug for MemoryModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryModel")
            .field("version", &self.version.get())
            .field("observers", &self.observers)
            .finish()
    }
}

/// Walk `value` along `path`, returning the addressed leaf if present.
fn lookup<'a>(value: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = value;
    for key in path.keys() {
        current = match (current, key) {
            (Value::Object(map), PathKey::Key(k)) => map.get(k)?,
            // Numeric steps address arrays directly, or objects keyed by the
            // stringified index (both occur in graph caches).
            (Value::Array(items), PathKey::Index(i)) => {
                items.get(usize::try_from(*i).ok()?)?
            }
            (Value::Object(map), PathKey::Index(i)) => map.get(&i.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Insert `leaf` into `envelope` at `path`, creating intermediate objects.
fn graft(envelope: &mut Value, path: &Path, leaf: Value) {
    let mut current = envelope;
    let keys: Vec<&PathKey> = path.keys().collect();
    let Some((last, interior)) = keys.split_last() else {
        return;
    };
    for key in interior {
        let map = match current {
            Value::Object(map) => map,
            _ => return,
        };
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if let Value::Object(map) = current {
        map.insert(last.to_string(), leaf);
    }
}

/// Recursive object merge; non-object values overwrite.
fn deep_merge(target: &mut Value, partial: Value) {
    match (target, partial) {
        (Value::Object(target_map), Value::Object(partial_map)) => {
            for (key, value) in partial_map {
                match target_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, partial) => *target = partial,
    }
}

// ---------------------------------------------------------------------------
// Stub model for lifecycle tests (test-helpers)
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
pub mod stub {
    //! A model whose fetches stay pending until the test resolves them,
    //! for driving mount/unmount races deterministically.

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use serde_json::Value;

    use crate::error::FetchError;
    use crate::model::{
        ChangeObserver, ChangeObservers, FetchFuture, FetchResponse, Model, Version,
    };
    use crate::path::Path;
    use crate::promise::{Deferred, Promise};

    type FetchOutcome = Result<FetchResponse, FetchError>;

    /// Manually-resolvable model: every `get` parks a [`Deferred`] the test
    /// settles later via [`resolve_next`](StubModel::resolve_next).
    pub struct StubModel {
        cache: RefCell<Value>,
        version: Cell<Version>,
        observers: ChangeObservers,
        pending: RefCell<Vec<(Vec<Path>, Deferred<FetchOutcome>)>>,
        fetches_issued: Cell<usize>,
    }

    impl StubModel {
        #[must_use]
        pub fn new(cache: Value) -> Self {
            Self {
                cache: RefCell::new(cache),
                version: Cell::new(Version::initial()),
                observers: ChangeObservers::new(),
                pending: RefCell::new(Vec::new()),
                fetches_issued: Cell::new(0),
            }
        }

        #[must_use]
        pub fn shared(cache: Value) -> Rc<Self> {
            Rc::new(Self::new(cache))
        }

        /// Advance the version and notify observers without touching the
        /// cache (simulates a remote mutation signal).
        pub fn advance(&self) {
            self.version.set(self.version.get().next());
            self.observers.notify();
        }

        /// Settle the oldest outstanding fetch with `outcome`. Panics if no
        /// fetch is outstanding.
        pub fn resolve_next(&self, outcome: FetchOutcome) {
            let (_, deferred) = self.pending.borrow_mut().remove(0);
            deferred.resolve(outcome);
        }

        /// Settle the newest outstanding fetch with `outcome`.
        pub fn resolve_last(&self, outcome: FetchOutcome) {
            let (_, deferred) = self
                .pending
                .borrow_mut()
                .pop()
                .expect("no outstanding fetch");
            deferred.resolve(outcome);
        }

        /// Paths of the oldest outstanding fetch.
        #[must_use]
        pub fn pending_paths(&self) -> Option<Vec<Path>> {
            self.pending.borrow().first().map(|(paths, _)| paths.clone())
        }

        /// Number of fetches still outstanding.
        #[must_use]
        pub fn outstanding(&self) -> usize {
            self.pending.borrow().len()
        }

        /// Total fetches ever issued.
        #[must_use]
        pub fn fetches_issued(&self) -> usize {
            self.fetches_issued.get()
        }
    }

    impl Model for StubModel {
        fn version(&self) -> Version {
            self.version.get()
        }

        fn cache(&self) -> Value {
            self.cache.borrow().clone()
        }

        fn set_cache(&self, snapshot: Value) {
            *self.cache.borrow_mut() = snapshot;
        }

        fn get(&self, paths: &[Path]) -> FetchFuture {
            self.fetches_issued.set(self.fetches_issued.get() + 1);
            let (promise, deferred) = Promise::pending();
            self.pending.borrow_mut().push((paths.to_vec(), deferred));
            promise
        }

        fn observe_change(&self, observer: Rc<dyn Fn()>) -> ChangeObserver {
            self.observers.add(observer)
        }
    }

    impl std::fmt::Debug for StubModel {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("StubModel")
                .field("version", &self.version.get())
                .field("outstanding", &self.pending.borrow().len())
                .finish()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
