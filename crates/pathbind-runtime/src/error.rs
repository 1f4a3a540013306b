#![forbid(unsafe_code)]

//! Configuration errors for the runtime surface.
//!
//! These fail fast, at registry lookup or container mount, and always
//! name the offending contract. They are never deferred to a later render.

use pathbind_core::error::PathError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `IntentRegistry::get` was called with an empty name.
    #[error("intent name must be non-empty")]
    EmptyIntentName,

    /// A container's fragment declaration could not be normalized to paths.
    #[error("invalid fragment declaration for {component}: {source}")]
    Fragments {
        component: String,
        #[source]
        source: PathError,
    },
}
