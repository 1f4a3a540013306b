#![forbid(unsafe_code)]

//! Runtime: provider, container factory, intent registry, and reactive
//! stream plumbing for binding component trees to a versioned graph model.

pub mod container;
pub mod error;
pub mod intent;
pub mod props;
pub mod provider;
pub mod reactive;

pub use container::{
    Bound, Container, ContainerSpec, ERROR_INTENT, Phase, RefetchPolicy, create_container,
};
pub use error::ConfigError;
pub use intent::{IntentRegistry, IntentStream};
pub use props::{IntentCallback, Props, View};
pub use provider::{Context, Provider};
pub use reactive::{Subject, Subscription, VersionStream};
