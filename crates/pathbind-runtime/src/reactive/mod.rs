#![forbid(unsafe_code)]

//! Reactive stream primitives for the binding layer.
//!
//! - [`Subject`]: a hot multicast push stream with no replay. Intent
//!   streams are subjects.
//! - [`VersionStream`]: a replay-one stream of the model's version counter.
//!   New subscribers synchronously receive the current version, then every
//!   subsequent push.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! # Architecture
//!
//! Single-threaded shared ownership via `Rc<RefCell<..>>`. Subscriber
//! callbacks are stored as `Weak` slots and pruned lazily during emission;
//! the [`Subscription`] guard holds the only strong reference.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 3. `VersionStream` replays the most recent version to late subscribers;
//!    a late subscriber's first received value equals the version at
//!    subscribe time.
//! 4. Pushing a version equal to the current one is a no-op.

pub mod subject;
pub mod version_stream;

pub use subject::{Subject, Subscription};
pub use version_stream::VersionStream;
