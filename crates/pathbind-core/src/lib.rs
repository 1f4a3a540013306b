#![forbid(unsafe_code)]

//! Core: graph paths, fragment queries, the promise primitive, and the
//! model capability boundary.

pub mod error;
pub mod memory;
pub mod model;
pub mod path;
pub mod promise;

pub use error::{FetchError, PathError};
pub use memory::MemoryModel;
pub use model::{
    ChangeObserver, ChangeObservers, FetchFuture, FetchResponse, Model, ModelRc, Version,
};
pub use path::{FragmentQuery, Path, PathKey};
pub use promise::{Deferred, Promise};
