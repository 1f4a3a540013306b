#![forbid(unsafe_code)]

//! Container factory: wraps a presentational [`View`] with a declarative
//! data/interaction spec and binds it to the model's version stream.
//!
//! A mounted [`Container`] is a small state machine straddling three
//! contracts: the version stream (replay-one ticks), the model's async
//! fetch, and the host component lifecycle. Per version tick it re-invokes
//! the fragment declaration, normalizes it to graph paths, and issues a
//! fetch; arriving data is staged as initial state before the first mount
//! completes and merged + re-render-signaled afterwards.
//!
//! # Lifecycle
//!
//! `Constructing -> Mounted -> Unmounted`, no transition out of
//! `Unmounted`. The fetch completion handlers reach render state only
//! through a [`Weak`] reference to an internal gate owned by the container;
//! [`Container::unmount`] drops the gate, so a fetch resolving after
//! teardown structurally cannot write anywhere. There is no boolean
//! "mounted" flag for a late callback to misread.
//!
//! # Overlapping fetches
//!
//! Successive ticks do not wait for prior fetches. The per-container
//! [`RefetchPolicy`] decides what happens when completions arrive out of
//! order: apply in arrival order (`LastWriteWins`, the default) or discard
//! a completion once a newer tick has been issued (`DropStale`).
//!
//! # Fetch errors
//!
//! Never swallowed: each failure is logged and emitted as an envelope on
//! the [`ERROR_INTENT`] stream, isolated to the failing container.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use pathbind_core::error::FetchError;
use pathbind_core::model::{FetchResponse, ModelRc, Version};
use pathbind_core::path::FragmentQuery;
use serde_json::{Map, Value, json};
use tracing::{debug, trace, warn};

use crate::error::ConfigError;
use crate::intent::{IntentRegistry, IntentStream};
use crate::props::{IntentCallback, Props, View};
use crate::provider::Context;
use crate::reactive::{Subject, Subscription};

/// Reserved intent stream carrying fetch-failure envelopes
/// (`{"component": .., "error": ..}`).
pub const ERROR_INTENT: &str = "container:error";

/// What to do when fetch completions arrive out of tick order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchPolicy {
    /// Apply every completion in arrival order; the newest arrival wins for
    /// overlapping fields. Favors low latency.
    #[default]
    LastWriteWins,
    /// Discard a completion if a newer tick has been issued since its
    /// fetch started. Favors strict per-tick ordering.
    DropStale,
}

/// Host lifecycle phase of one container instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructing,
    Mounted,
    Unmounted,
}

type FragmentsFn = dyn Fn() -> FragmentQuery;
type InteractionsFn = dyn Fn(&ModelRc, &IntentRegistry) -> AHashMap<String, IntentCallback>;

// ---------------------------------------------------------------------------
// ContainerSpec
// ---------------------------------------------------------------------------

/// Declarative spec for a container: required fragment declaration,
/// optional interactions, overlap policy.
///
/// Fragments are required at construction; there is no sensible container
/// without declared data needs, so the factory cannot be called without
/// them.
#[derive(Clone)]
pub struct ContainerSpec {
    fragments: Rc<FragmentsFn>,
    interactions: Option<Rc<InteractionsFn>>,
    refetch: RefetchPolicy,
}

impl ContainerSpec {
    /// Declare the container's data needs. Re-invoked on every version tick
    /// (the declaration may depend on component state).
    pub fn new(fragments: impl Fn() -> FragmentQuery + 'static) -> Self {
        Self {
            fragments: Rc::new(fragments),
            interactions: None,
            refetch: RefetchPolicy::default(),
        }
    }

    /// Derive intent-producing callback props. Invoked once per container
    /// instance, at mount.
    #[must_use]
    pub fn interactions(
        mut self,
        f: impl Fn(&ModelRc, &IntentRegistry) -> AHashMap<String, IntentCallback> + 'static,
    ) -> Self {
        self.interactions = Some(Rc::new(f));
        self
    }

    /// Select the overlapping-fetch policy.
    #[must_use]
    pub fn refetch(mut self, policy: RefetchPolicy) -> Self {
        self.refetch = policy;
        self
    }
}

impl std::fmt::Debug for ContainerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerSpec")
            .field("interactions", &self.interactions.is_some())
            .field("refetch", &self.refetch)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Factory product: a view paired with its spec, not yet bound to a model.
/// Call [`Bound::mount`] with a provider's [`Context`] to bring it live.
pub struct Bound<V: View> {
    view: V,
    spec: ContainerSpec,
}

/// Wrap `view` with a data/interaction spec.
pub fn create_container<V: View>(view: V, spec: ContainerSpec) -> Bound<V> {
    Bound { view, spec }
}

impl<V: View + 'static> Bound<V> {
    /// Bind to a provider's context: run interactions, subscribe to the
    /// version stream (the current version replays synchronously, issuing
    /// the first fetch), and return the live container.
    ///
    /// Fails fast if the fragment declaration cannot be normalized.
    pub fn mount(self, ctx: &Context) -> Result<Container<V>, ConfigError> {
        let display_name = format!("{}Container", self.view.name());

        // Surface a statically misconfigured declaration at mount, not on a
        // later tick.
        (self.spec.fragments.as_ref())()
            .into_paths()
            .map_err(|source| ConfigError::Fragments {
                component: display_name.clone(),
                source,
            })?;

        let errors = ctx.intents.get(ERROR_INTENT)?;
        let callbacks = match &self.spec.interactions {
            Some(interactions) => interactions(&ctx.model, &ctx.intents),
            None => AHashMap::new(),
        };

        let state = Rc::new(RefCell::new(Map::new()));
        let phase = Rc::new(Cell::new(Phase::Constructing));
        let render_signal = Subject::new();

        let gate = Rc::new(RenderGate {
            display_name: display_name.clone(),
            state: Rc::clone(&state),
            phase: Rc::clone(&phase),
            render_signal: render_signal.clone(),
            issued_seq: Cell::new(0),
            errors,
            policy: self.spec.refetch,
        });

        let subscription = ctx.versions.subscribe(Self::tick_handler(
            Rc::downgrade(&gate),
            ctx.model.clone(),
            Rc::clone(&self.spec.fragments),
        ));

        debug!(component = %display_name, "container mounted");

        Ok(Container {
            view: self.view,
            display_name,
            fragments: self.spec.fragments,
            callbacks,
            state,
            phase,
            render_signal,
            gate: Some(gate),
            subscription: Some(subscription),
        })
    }

    fn tick_handler(
        gate: Weak<RenderGate>,
        model: ModelRc,
        fragments: Rc<FragmentsFn>,
    ) -> impl Fn(Version) {
        move |version| {
            let Some(live) = gate.upgrade() else {
                return;
            };
            let seq = live.issued_seq.get() + 1;
            live.issued_seq.set(seq);

            let paths = match (fragments.as_ref())().into_paths() {
                Ok(paths) => paths,
                Err(error) => {
                    warn!(
                        component = %live.display_name,
                        %error,
                        "fragment declaration failed on tick"
                    );
                    live.errors.emit(&json!({
                        "component": live.display_name,
                        "error": error.to_string(),
                    }));
                    return;
                }
            };

            trace!(
                component = %live.display_name,
                %version,
                seq,
                paths = paths.len(),
                "refetching fragments"
            );

            let handler_gate = gate.clone();
            model.get(&paths).then(move |outcome| {
                // A gate that no longer upgrades means the container was
                // torn down; the completion has nowhere to write.
                if let Some(live) = handler_gate.upgrade() {
                    live.apply(seq, outcome);
                }
            });
        }
    }
}

impl<V: View> std::fmt::Debug for Bound<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bound").field("spec", &self.spec).finish()
    }
}

// ---------------------------------------------------------------------------
// RenderGate
// ---------------------------------------------------------------------------

/// The only route from fetch completions to render state. Owned strongly by
/// the container alone; handlers hold `Weak` references, so dropping the
/// gate at teardown severs every pending completion.
struct RenderGate {
    display_name: String,
    state: Rc<RefCell<Map<String, Value>>>,
    phase: Rc<Cell<Phase>>,
    render_signal: Subject<()>,
    issued_seq: Cell<u64>,
    errors: IntentStream,
    policy: RefetchPolicy,
}

impl RenderGate {
    fn apply(&self, seq: u64, outcome: &Result<FetchResponse, FetchError>) {
        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                warn!(component = %self.display_name, %error, "fetch failed");
                self.errors.emit(&json!({
                    "component": self.display_name,
                    "error": error.to_string(),
                }));
                return;
            }
        };

        if response.is_empty() {
            trace!(component = %self.display_name, seq, "empty fetch payload discarded");
            return;
        }
        if self.policy == RefetchPolicy::DropStale && seq < self.issued_seq.get() {
            debug!(
                component = %self.display_name,
                seq,
                newest = self.issued_seq.get(),
                "stale fetch completion discarded"
            );
            return;
        }

        let Value::Object(incoming) = &response.json else {
            warn!(
                component = %self.display_name,
                "fetch payload is not a JSON object; discarded"
            );
            return;
        };

        {
            let mut state = self.state.borrow_mut();
            for (field, value) in incoming {
                state.insert(field.clone(), value.clone());
            }
        }

        match self.phase.get() {
            // Render has not happened yet: stage as initial state silently.
            Phase::Constructing => {}
            Phase::Mounted => self.render_signal.emit(&()),
            // Unreachable in practice: unmount drops the gate before any
            // further completion can be delivered.
            Phase::Unmounted => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// A live bound component: view + render state + version subscription.
pub struct Container<V: View> {
    view: V,
    display_name: String,
    fragments: Rc<FragmentsFn>,
    callbacks: AHashMap<String, IntentCallback>,
    state: Rc<RefCell<Map<String, Value>>>,
    phase: Rc<Cell<Phase>>,
    render_signal: Subject<()>,
    gate: Option<Rc<RenderGate>>,
    subscription: Option<Subscription>,
}

impl<V: View> Container<V> {
    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Diagnostic name of the wrapper (`"{view}Container"`).
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The wrapped fragment declaration, exposed for introspection just as
    /// it was declared on the spec.
    #[must_use]
    pub fn fragments(&self) -> Rc<FragmentsFn> {
        Rc::clone(&self.fragments)
    }

    /// Signal emitted when post-mount data arrival requires a re-render.
    /// The host subscribes and schedules [`render`](Self::render).
    #[must_use]
    pub fn render_signal(&self) -> &Subject<()> {
        &self.render_signal
    }

    /// Snapshot of the current props union.
    #[must_use]
    pub fn props(&self) -> Props {
        Props::from_parts(self.state.borrow().clone(), self.callbacks.clone())
    }

    /// Render the wrapped view with the current props union.
    pub fn render(&mut self) {
        let props = self.props();
        self.view.render(&props);
    }

    /// Host signal: the first render completed. From here on, data arrivals
    /// trigger re-render signals instead of initial-state staging.
    pub fn did_mount(&mut self) {
        match self.phase.get() {
            Phase::Constructing => self.phase.set(Phase::Mounted),
            Phase::Mounted => {}
            Phase::Unmounted => {
                warn!(component = %self.display_name, "did_mount after unmount ignored");
            }
        }
    }

    /// Host teardown: release the version subscription and sever all pending
    /// fetch completions. Idempotent; there is no way back.
    pub fn unmount(&mut self) {
        if self.phase.get() == Phase::Unmounted {
            debug!(component = %self.display_name, "repeated unmount ignored");
            return;
        }
        self.phase.set(Phase::Unmounted);
        self.subscription = None;
        self.gate = None;
        debug!(component = %self.display_name, "container unmounted");
    }

    /// The wrapped view.
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The wrapped view, mutably.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

impl<V: View> std::fmt::Debug for Container<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("display_name", &self.display_name)
            .field("phase", &self.phase.get())
            .field("fields", &self.state.borrow().len())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
