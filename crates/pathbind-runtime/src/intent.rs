#![forbid(unsafe_code)]

//! Named, lazily-created intent streams: a light in-tree event bus.
//!
//! Components emit ad-hoc JSON events ("intents") up to shared handlers
//! without threading callbacks through every intermediate layer. The
//! registry maps names to [`Subject<Value>`] streams and is owned by the
//! provider; entries are created on first lookup and live for the
//! provider's lifetime.
//!
//! # Invariants
//!
//! 1. Creation is idempotent: `get` with the same name always returns a
//!    handle to the same underlying stream.
//! 2. The registry is append-only; streams are never removed.
//! 3. An empty name is a configuration error, raised immediately.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;
use crate::reactive::Subject;

/// One named event stream in the registry.
pub type IntentStream = Subject<Value>;

/// Shared `name -> IntentStream` mapping with memoized creation.
#[derive(Clone, Default)]
pub struct IntentRegistry {
    streams: Rc<RefCell<AHashMap<String, IntentStream>>>,
}

impl IntentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the stream named `name`, creating it on first use.
    pub fn get(&self, name: &str) -> Result<IntentStream, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyIntentName);
        }
        let mut streams = self.streams.borrow_mut();
        if let Some(stream) = streams.get(name) {
            return Ok(stream.clone());
        }
        debug!(intent = name, "intent stream created");
        let stream = IntentStream::new();
        streams.insert(name.to_string(), stream.clone());
        Ok(stream)
    }

    /// Whether a stream for `name` has been created.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.streams.borrow().contains_key(name)
    }

    /// Number of created streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.borrow().is_empty()
    }
}

impl std::fmt::Debug for IntentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRegistry")
            .field("streams", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
