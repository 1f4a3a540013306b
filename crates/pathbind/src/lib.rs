#![forbid(unsafe_code)]

//! pathbind public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use pathbind_core as core;
    pub use pathbind_runtime as runtime;

    pub use pathbind_core::{
        FetchError, FetchFuture, FetchResponse, FragmentQuery, MemoryModel, Model, ModelRc, Path,
        PathError, PathKey, Version, path,
    };
    pub use pathbind_runtime::{
        Bound, ConfigError, Container, ContainerSpec, Context, ERROR_INTENT, IntentCallback,
        IntentRegistry, IntentStream, Phase, Props, Provider, RefetchPolicy, Subject,
        Subscription, VersionStream, View, create_container,
    };
}
