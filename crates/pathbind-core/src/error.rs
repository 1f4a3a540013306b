#![forbid(unsafe_code)]

//! Error taxonomy for the binding layer.
//!
//! Two families, mirroring how failures surface:
//!
//! - [`PathError`]: a fragment declaration produced something that cannot be
//!   normalized into graph paths. These are configuration errors and are
//!   reported when the declaration is first evaluated, never deferred.
//! - [`FetchError`]: the model's asynchronous fetch failed. These are
//!   operational and isolated per container; they are surfaced through the
//!   error intent stream rather than swallowed.

use thiserror::Error;

/// Fragment normalization failures. All of these indicate a misconfigured
/// component rather than bad data from the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The tree notation root was not a JSON object.
    #[error("fragment tree root must be a JSON object, got {found}")]
    NonObjectRoot { found: &'static str },

    /// An interior object had no children, so no path terminates under it.
    #[error("fragment tree node at '{at}' is an empty object; no path terminates there")]
    EmptyNode { at: String },

    /// Normalization produced zero paths. A container with no declared data
    /// needs has no reason to exist.
    #[error("fragment query normalized to zero paths")]
    Empty,
}

/// A failed model fetch, carried to the error intent stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The model reported that one or more requested paths are unreachable.
    #[error("unresolvable path: {path}")]
    Unresolvable { path: String },

    /// Transport-level failure reported by the model collaborator.
    #[error("model transport error: {message}")]
    Transport { message: String },
}
