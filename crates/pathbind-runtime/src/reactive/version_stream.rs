#![forbid(unsafe_code)]

//! Replay-one stream of the model's version counter.
//!
//! A `VersionStream` wraps one model's version: it always caches the most
//! recently pushed value and replays it synchronously to every new
//! subscriber, so late subscribers never wait for the next mutation to
//! learn the current version. Owned by the provider and shared (cloned)
//! into every container's context.

use std::cell::Cell;
use std::rc::Rc;

use pathbind_core::model::Version;
use tracing::trace;

use super::subject::{Subject, Subscription};

/// Multicast, replay-one version stream.
#[derive(Clone)]
pub struct VersionStream {
    current: Rc<Cell<Version>>,
    subject: Subject<Version>,
}

impl VersionStream {
    /// Create a stream seeded with the model's current version.
    #[must_use]
    pub fn new(initial: Version) -> Self {
        Self {
            current: Rc::new(Cell::new(initial)),
            subject: Subject::new(),
        }
    }

    /// The most recently pushed version.
    #[must_use]
    pub fn current(&self) -> Version {
        self.current.get()
    }

    /// Subscribe to version ticks. `callback` is invoked synchronously with
    /// the current version before this returns, then once per future push.
    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn(Version) + 'static) -> Subscription {
        callback(self.current.get());
        self.subject.subscribe(move |version: &Version| callback(*version))
    }

    /// Push a new version, notifying subscribers in registration order.
    /// Pushing the current version again is a no-op.
    pub fn push(&self, version: Version) {
        if version == self.current.get() {
            return;
        }
        trace!(%version, "version stream tick");
        self.current.set(version);
        self.subject.emit(&version);
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subject.subscriber_count()
    }
}

impl std::fmt::Debug for VersionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStream")
            .field("current", &self.current.get())
            .field("subscribers", &self.subject.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn v(n: u64) -> Version {
        let mut version = Version::initial();
        for _ in 1..n {
            version = version.next();
        }
        version
    }

    #[test]
    fn late_subscriber_receives_current_immediately() {
        let stream = VersionStream::new(v(3));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = stream.subscribe(move |version| s.borrow_mut().push(version));

        assert_eq!(*seen.borrow(), vec![v(3)]);
    }

    #[test]
    fn pushes_are_delivered_in_order() {
        let stream = VersionStream::new(v(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = stream.subscribe(move |version| s.borrow_mut().push(version));

        stream.push(v(2));
        stream.push(v(3));
        assert_eq!(*seen.borrow(), vec![v(1), v(2), v(3)]);
        assert_eq!(stream.current(), v(3));
    }

    #[test]
    fn duplicate_push_is_noop() {
        let stream = VersionStream::new(v(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = stream.subscribe(move |version| s.borrow_mut().push(version));

        stream.push(v(1));
        assert_eq!(*seen.borrow(), vec![v(1)], "same-version push must not re-emit");
    }

    #[test]
    fn clone_shares_current_and_subscribers() {
        let stream = VersionStream::new(v(1));
        let other = stream.clone();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = stream.subscribe(move |version| s.borrow_mut().push(version));

        other.push(v(2));
        assert_eq!(stream.current(), v(2));
        assert_eq!(*seen.borrow(), vec![v(1), v(2)]);
    }

    #[test]
    fn dropped_subscription_stops_ticks() {
        let stream = VersionStream::new(v(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = stream.subscribe(move |version| s.borrow_mut().push(version));

        drop(sub);
        stream.push(v(2));
        assert_eq!(*seen.borrow(), vec![v(1)]);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn each_subscriber_gets_replay_then_ticks() {
        let stream = VersionStream::new(v(1));

        let first = Rc::new(RefCell::new(Vec::new()));
        let f = Rc::clone(&first);
        let _sub_a = stream.subscribe(move |version| f.borrow_mut().push(version));

        stream.push(v(2));

        let second = Rc::new(RefCell::new(Vec::new()));
        let sec = Rc::clone(&second);
        let _sub_b = stream.subscribe(move |version| sec.borrow_mut().push(version));

        stream.push(v(3));

        assert_eq!(*first.borrow(), vec![v(1), v(2), v(3)]);
        assert_eq!(*second.borrow(), vec![v(2), v(3)]);
    }
}
