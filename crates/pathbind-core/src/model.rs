#![forbid(unsafe_code)]

//! The model boundary: capability contract for the versioned object-graph
//! cache the UI binds against.
//!
//! The binding layer never owns the model's storage or transport; it
//! consumes exactly this surface:
//!
//! - [`Version`]: opaque ordered token, advanced on every mutation.
//! - [`Model::get`]: asynchronous path fetch returning a [`FetchFuture`].
//! - [`Model::observe_change`]: register a "contents may have changed"
//!   observer. Observers form an ordered list; registering never clobbers a
//!   previously registered observer, and dropping the returned guard
//!   unregisters exactly that observer.
//!
//! # Invariants
//!
//! 1. `version()` is non-decreasing across mutations.
//! 2. Change observers are notified in registration order.
//! 3. An observer whose [`ChangeObserver`] guard has been dropped is never
//!    invoked again.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::error::FetchError;
use crate::path::Path;
use crate::promise::Promise;

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Opaque, totally ordered mutation counter.
///
/// Only equality and advancement are contractual; the integer representation
/// is an implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(u64);

impl Version {
    /// The initial version of a freshly constructed model.
    #[must_use]
    pub fn initial() -> Self {
        Self(1)
    }

    /// The version following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Fetch surface
// ---------------------------------------------------------------------------

/// Payload of a successful fetch: a JSON envelope shaped like the requested
/// paths, containing only the leaves the model could resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub json: Value,
}

impl FetchResponse {
    /// Whether the envelope carries no data at all. Empty responses are
    /// discarded by containers without touching render state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.json {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Eventual outcome of [`Model::get`].
pub type FetchFuture = Promise<Result<FetchResponse, FetchError>>;

// ---------------------------------------------------------------------------
// Model trait
// ---------------------------------------------------------------------------

/// Capability contract consumed by the binding layer.
///
/// Implementations live outside the core (the reference [`MemoryModel`] is
/// provided for tests and local development). All methods take `&self`:
/// the model is shared single-threaded via [`ModelRc`] and uses interior
/// mutability.
///
/// [`MemoryModel`]: crate::memory::MemoryModel
pub trait Model {
    /// Current version token.
    fn version(&self) -> Version;

    /// Snapshot of the local cache.
    fn cache(&self) -> Value;

    /// Overwrite the local cache. This is a local operation; whether it
    /// advances the version and notifies observers is the implementation's
    /// contract (the reference model treats it as a silent local override).
    fn set_cache(&self, snapshot: Value);

    /// Fetch the values at `paths`, asynchronously.
    fn get(&self, paths: &[Path]) -> FetchFuture;

    /// Register a change observer. The observer fires after every mutation
    /// that advances the version, for as long as the returned guard lives.
    fn observe_change(&self, observer: Rc<dyn Fn()>) -> ChangeObserver;
}

/// Shared handle to a model instance.
pub type ModelRc = Rc<dyn Model>;

// ---------------------------------------------------------------------------
// Observer plumbing
// ---------------------------------------------------------------------------

/// RAII guard for one registered change observer. Dropping it removes the
/// observer before the next notification cycle.
pub struct ChangeObserver {
    // Keeps the callback alive; the model's list only holds a Weak.
    _callback: Rc<dyn Fn()>,
}

impl fmt::Debug for ChangeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeObserver").finish()
    }
}

/// Ordered observer list for model implementations to embed.
///
/// Observers are held weakly; a dropped [`ChangeObserver`] guard makes its
/// slot inert, and dead slots are pruned lazily during notification.
#[derive(Default)]
pub struct ChangeObservers {
    slots: RefCell<Vec<Weak<dyn Fn()>>>,
}

impl ChangeObservers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer to the list, returning its keep-alive guard.
    pub fn add(&self, observer: Rc<dyn Fn()>) -> ChangeObserver {
        self.slots.borrow_mut().push(Rc::downgrade(&observer));
        ChangeObserver {
            _callback: observer,
        }
    }

    /// Invoke all live observers in registration order, pruning dead slots.
    pub fn notify(&self) {
        let live: Vec<Rc<dyn Fn()>> = {
            let mut slots = self.slots.borrow_mut();
            slots.retain(|slot| slot.strong_count() > 0);
            slots.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer();
        }
    }

    /// Number of live observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ChangeObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeObservers")
            .field("live", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
