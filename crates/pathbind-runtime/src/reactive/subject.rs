#![forbid(unsafe_code)]

//! Hot multicast push stream (`Subject`) and its RAII subscription guard.
//!
//! A `Subject<T>` has no replay: subscribers only observe values emitted
//! while their [`Subscription`] is alive. Cloning a subject clones the
//! handle, not the stream; all clones share the same subscriber list.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: propagates to the emitter; later subscribers in
//!   that cycle are not notified.
//! - **Re-entrant emit from a subscriber**: allowed; the inner emission
//!   completes before the outer one resumes. Subscribers added during an
//!   emission are not notified for that emission.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One registered callback. The subscriber list holds this weakly; the
/// [`Subscription`] guard holds the strong reference.
struct Slot<T>(Box<dyn Fn(&T)>);

/// RAII guard for one subscription. Dropping it removes the callback before
/// the next notification cycle.
pub struct Subscription {
    _slot: Rc<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

/// Multicast, no-replay push stream.
pub struct Subject<T> {
    subscribers: Rc<RefCell<Vec<Weak<Slot<T>>>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T: 'static> Subject<T> {
    /// Create an empty subject.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register `callback` for future emissions.
    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let slot: Rc<Slot<T>> = Rc::new(Slot(Box::new(callback)));
        self.subscribers.borrow_mut().push(Rc::downgrade(&slot));
        Subscription { _slot: slot }
    }

    /// Deliver `value` to all live subscribers in registration order,
    /// pruning dead slots.
    pub fn emit(&self, value: &T) {
        // Collect strong refs first so the borrow is released before any
        // callback runs (a callback may subscribe or emit re-entrantly).
        let live: Vec<Rc<Slot<T>>> = {
            let mut slots = self.subscribers.borrow_mut();
            slots.retain(|slot| slot.strong_count() > 0);
            slots.iter().filter_map(Weak::upgrade).collect()
        };
        for slot in live {
            (slot.0)(value);
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    /// Whether `self` and `other` are handles to the same stream.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.subscribers, &other.subscribers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn emit_reaches_subscriber() {
        let subject = Subject::new();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = subject.subscribe(move |v: &i32| s.set(*v));

        subject.emit(&42);
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn no_replay_for_late_subscriber() {
        let subject = Subject::new();
        subject.emit(&1);

        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = subject.subscribe(move |v: &i32| s.set(*v));
        assert_eq!(seen.get(), 0, "subject must not replay past values");

        subject.emit(&2);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn subscribers_notified_in_registration_order() {
        let subject = Subject::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Vec::new();
        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            subs.push(subject.subscribe(move |_: &()| log.borrow_mut().push(tag)));
        }
        subject.emit(&());
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let subject = Subject::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = subject.subscribe(move |_: &i32| c.set(c.get() + 1));

        subject.emit(&1);
        assert_eq!(count.get(), 1);

        drop(sub);
        subject.emit(&2);
        assert_eq!(count.get(), 1, "callback must not fire after guard drop");
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn clone_shares_stream() {
        let a = Subject::new();
        let b = a.clone();
        assert!(a.ptr_eq(&b));

        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = a.subscribe(move |v: &i32| s.set(*v));
        b.emit(&9);
        assert_eq!(seen.get(), 9);
    }

    #[test]
    fn distinct_subjects_are_not_ptr_eq() {
        let a: Subject<i32> = Subject::new();
        let b: Subject<i32> = Subject::new();
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn subscriber_added_during_emit_misses_that_emission() {
        let subject: Subject<i32> = Subject::new();
        let late_seen = Rc::new(Cell::new(0));
        let held: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let subject_inner = subject.clone();
        let late = Rc::clone(&late_seen);
        let held_inner = Rc::clone(&held);
        let _sub = subject.subscribe(move |_: &i32| {
            if held_inner.borrow().is_none() {
                let late = Rc::clone(&late);
                let new_sub = subject_inner.subscribe(move |v: &i32| late.set(*v));
                *held_inner.borrow_mut() = Some(new_sub);
            }
        });

        subject.emit(&1);
        assert_eq!(late_seen.get(), 0, "mid-emission subscriber must wait");

        subject.emit(&2);
        assert_eq!(late_seen.get(), 2);
    }

    #[test]
    fn default_subject_starts_empty() {
        let subject: Subject<i32> = Subject::default();
        assert_eq!(subject.subscriber_count(), 0);
        assert_eq!(format!("{subject:?}"), "Subject { subscribers: 0 }");
    }

    #[test]
    fn emit_with_no_subscribers_is_noop() {
        let subject: Subject<String> = Subject::new();
        subject.emit(&"orphan".to_string());
        assert_eq!(subject.subscriber_count(), 0);
    }
}
