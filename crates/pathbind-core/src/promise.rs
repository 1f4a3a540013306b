#![forbid(unsafe_code)]

//! Single-threaded promise primitive bridging the model's async fetch
//! boundary.
//!
//! The binding layer runs on a cooperative UI loop: "asynchronous" means
//! interleaved tasks, not threads. A [`Deferred`] is held by the producer
//! (the model's transport) and a [`Promise`] by the consumer (a container's
//! fetch handler). Both are cheap `Rc` handles to the same state.
//!
//! # Invariants
//!
//! 1. A promise resolves at most once; later `resolve` calls are discarded
//!    with a warning.
//! 2. Callbacks registered before resolution run in registration order when
//!    the value arrives.
//! 3. A callback registered after resolution runs immediately with the
//!    settled value.
//! 4. Callbacks run at most once and are consumed by delivery.
//!
//! # Failure Modes
//!
//! - **Producer dropped unresolved**: consumers never hear back. The core
//!   imposes no timeout; a hung fetch leaves the last rendered state in
//!   place (timeout policy belongs to the model collaborator).
//! - **Callback panics**: propagates to the resolver's caller; remaining
//!   callbacks for that delivery are not run.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

type Callback<T> = Box<dyn FnOnce(&T)>;

enum PromiseState<T> {
    Pending(Vec<Callback<T>>),
    // Rc so delivery can run with no RefCell borrow outstanding; a callback
    // may freely inspect the promise or register further interest.
    Resolved(Rc<T>),
}

/// Consumer handle: register interest in the eventual value.
pub struct Promise<T> {
    state: Rc<RefCell<PromiseState<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.state.borrow() {
            PromiseState::Pending(cbs) => f
                .debug_struct("Promise")
                .field("state", &"pending")
                .field("waiters", &cbs.len())
                .finish(),
            PromiseState::Resolved(v) => f
                .debug_struct("Promise")
                .field("state", &"resolved")
                .field("value", v)
                .finish(),
        }
    }
}

impl<T: 'static> Promise<T> {
    /// Create an already-settled promise.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(PromiseState::Resolved(Rc::new(value)))),
        }
    }

    /// Create a pending promise along with its producer handle.
    #[must_use]
    pub fn pending() -> (Self, Deferred<T>) {
        let state = Rc::new(RefCell::new(PromiseState::Pending(Vec::new())));
        (
            Self {
                state: Rc::clone(&state),
            },
            Deferred { state },
        )
    }

    /// Run `f` with the value once it arrives (immediately if already
    /// settled).
    pub fn then(&self, f: impl FnOnce(&T) + 'static) {
        let value = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                PromiseState::Pending(callbacks) => {
                    callbacks.push(Box::new(f));
                    return;
                }
                PromiseState::Resolved(value) => Rc::clone(value),
            }
        };
        // Borrow released before the callback runs.
        f(&value);
    }

    /// Whether the value has arrived.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.state.borrow(), PromiseState::Resolved(_))
    }
}

/// Producer handle: settle the promise exactly once.
pub struct Deferred<T> {
    state: Rc<RefCell<PromiseState<T>>>,
}

impl<T: 'static> Deferred<T> {
    /// Settle the promise, delivering `value` to all registered callbacks in
    /// registration order. A second resolution is discarded.
    pub fn resolve(&self, value: T) {
        let value = Rc::new(value);
        let callbacks = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                PromiseState::Pending(callbacks) => {
                    let callbacks = std::mem::take(callbacks);
                    *state = PromiseState::Resolved(Rc::clone(&value));
                    callbacks
                }
                PromiseState::Resolved(_) => {
                    warn!("promise resolved more than once; extra resolution discarded");
                    return;
                }
            }
        };
        // Borrow released before delivery so callbacks may re-enter.
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").finish()
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
    fn resolve_delivers_to_waiter() {
        let (promise, deferred) = Promise::pending();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        promise.then(move |v| s.set(*v));

        assert!(!promise.is_resolved());
        deferred.resolve(42);
        assert!(promise.is_resolved());
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn then_after_resolve_fires_immediately() {
        let promise = Promise::resolved(7);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        promise.then(move |v| s.set(*v));
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn waiters_run_in_registration_order() {
        let (promise, deferred) = Promise::pending();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            promise.then(move |_: &i32| log.borrow_mut().push(tag));
        }
        deferred.resolve(0);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn double_resolve_is_discarded() {
        let (promise, deferred) = Promise::pending();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        promise.then(move |v| s.borrow_mut().push(*v));

        deferred.resolve(1);
        deferred.resolve(2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn callback_runs_at_most_once() {
        let (promise, deferred) = Promise::pending();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        promise.then(move |_: &i32| c.set(c.get() + 1));
        deferred.resolve(1);
        deferred.resolve(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn clone_shares_state() {
        let (promise, deferred) = Promise::pending();
        let other = promise.clone();
        deferred.resolve("done");
        assert!(other.is_resolved());
    }

    #[test]
    fn dropped_deferred_never_settles() {
        let (promise, deferred) = Promise::<i32>::pending();
        drop(deferred);
        assert!(!promise.is_resolved());
    }

    #[test]
    fn nested_then_during_delivery() {
        // A callback may register further interest while the value is being
        // delivered; the nested callback fires immediately.
        let (promise, deferred) = Promise::pending();
        let nested = Rc::new(Cell::new(0));
        let n = Rc::clone(&nested);
        let inner_promise = promise.clone();
        promise.then(move |_: &i32| {
            let n = Rc::clone(&n);
            inner_promise.then(move |v| n.set(*v));
        });
        deferred.resolve(9);
        assert_eq!(nested.get(), 9);
    }
}
