#![forbid(unsafe_code)]

//! Context root: owns one model, its version stream, and the intent
//! registry, and publishes them to the descendant subtree.
//!
//! Construction wires the model's change notifications into a replay-one
//! [`VersionStream`]: every mutation that advances the version re-broadcasts
//! it to all bound containers. Registering the provider's observer appends
//! to the model's ordered observer list; observers registered before the
//! provider keep firing (nothing is clobbered).
//!
//! The [`Context`] value is the typed dependency-injection surface: any
//! descendant that holds it can mount containers without the model or
//! registry being threaded through intermediate layers, and without any
//! ambient global lookup.

use std::rc::Rc;

use pathbind_core::model::{ChangeObserver, ModelRc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::intent::IntentRegistry;
use crate::reactive::VersionStream;

/// The ambient surface published to the subtree: exactly the model, the
/// intent registry, and the version stream. All three are cheap shared
/// handles.
#[derive(Clone)]
pub struct Context {
    pub model: ModelRc,
    pub intents: IntentRegistry,
    pub versions: VersionStream,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("intents", &self.intents)
            .field("versions", &self.versions)
            .finish()
    }
}

/// Context root owning one model instance and exactly one child subtree.
pub struct Provider<C> {
    model: ModelRc,
    versions: VersionStream,
    intents: IntentRegistry,
    // Keeps the version-forwarding observer registered for the provider's
    // lifetime.
    _observer: ChangeObserver,
    child: C,
}

impl<C> Provider<C> {
    /// Construct the root over `model` with one child.
    ///
    /// Seeds the version stream with the model's current version and
    /// registers a change observer that forwards every new version into the
    /// stream.
    pub fn new(model: ModelRc, child: C) -> Self {
        let versions = VersionStream::new(model.version());
        let intents = IntentRegistry::new();

        let weak_model = Rc::downgrade(&model);
        let stream = versions.clone();
        let observer = model.observe_change(Rc::new(move || {
            if let Some(model) = weak_model.upgrade() {
                stream.push(model.version());
            }
        }));

        debug!(version = %versions.current(), "provider constructed");

        Self {
            model,
            versions,
            intents,
            _observer: observer,
            child,
        }
    }

    /// Merge `partial` into the model's local cache, shallowly, without a
    /// round trip. This is a synchronous local override: it does not itself
    /// advance the broadcast version (only the model's own `set_cache`
    /// chain could).
    pub fn set_local(&self, partial: Value) {
        let mut cache = self.model.cache();
        match (&mut cache, partial) {
            (Value::Object(target), Value::Object(fields)) => {
                for (key, value) in fields {
                    target.insert(key, value);
                }
                self.model.set_cache(cache);
            }
            (_, partial) => {
                // A non-object on either side degenerates to replacement.
                warn!("set_local without object cache/partial; replacing cache");
                self.model.set_cache(partial);
            }
        }
    }

    /// The typed context handed to descendants.
    #[must_use]
    pub fn context(&self) -> Context {
        Context {
            model: Rc::clone(&self.model),
            intents: self.intents.clone(),
            versions: self.versions.clone(),
        }
    }

    /// The owned model handle.
    #[must_use]
    pub fn model(&self) -> &ModelRc {
        &self.model
    }

    /// The intent registry (shared, append-only).
    #[must_use]
    pub fn intents(&self) -> &IntentRegistry {
        &self.intents
    }

    /// The replay-one version stream.
    #[must_use]
    pub fn versions(&self) -> &VersionStream {
        &self.versions
    }

    /// The single child subtree, unchanged.
    #[must_use]
    pub fn child(&self) -> &C {
        &self.child
    }

    /// The child, mutably.
    pub fn child_mut(&mut self) -> &mut C {
        &mut self.child
    }

    /// Tear down the provider, returning the child.
    pub fn into_child(self) -> C {
        self.child
    }
}

impl<C> std::fmt::Debug for Provider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("versions", &self.versions)
            .field("intents", &self.intents)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
