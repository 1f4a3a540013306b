#![forbid(unsafe_code)]

//! End-to-end: provider + bound container over the reference memory model.
//!
//! Drives the whole loop the way a host would: mount, first render,
//! `did_mount`, mutation-triggered refetch, re-render on signal, teardown.

use std::cell::RefCell;
use std::rc::Rc;

use pathbind_core::memory::MemoryModel;
use pathbind_core::path::FragmentQuery;
use pathbind_core::{Model, path};
use pathbind_runtime::{ContainerSpec, Phase, Props, Provider, View, create_container};
use serde_json::{Value, json};

/// Records the `user.name` field from every render.
struct NameCard {
    names: Rc<RefCell<Vec<Value>>>,
}

impl NameCard {
    fn new() -> (Self, Rc<RefCell<Vec<Value>>>) {
        let names = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                names: Rc::clone(&names),
            },
            names,
        )
    }
}

impl View for NameCard {
    fn render(&mut self, props: &Props) {
        let name = props
            .get_in(&["user", "name"])
            .cloned()
            .unwrap_or(Value::Null);
        self.names.borrow_mut().push(name);
    }
}

#[test]
fn mutation_rerenders_without_remount() {
    let model = MemoryModel::shared(json!({"user": {"name": "Ann"}}));
    let provider = Provider::new(model.clone(), ());

    let (card, names) = NameCard::new();
    let spec = ContainerSpec::new(|| FragmentQuery::Paths(vec![path!["user", "name"]]));
    let mut container = create_container(card, spec)
        .mount(&provider.context())
        .unwrap();

    // The memory model resolves synchronously, so the replayed first tick
    // already staged initial state.
    container.render();
    container.did_mount();
    assert_eq!(container.phase(), Phase::Mounted);
    assert_eq!(*names.borrow(), vec![json!("Ann")]);

    // Host wiring: render again whenever the container signals.
    let dirty = Rc::new(RefCell::new(0u32));
    let d = Rc::clone(&dirty);
    let _render_sub = container
        .render_signal()
        .subscribe(move |_: &()| *d.borrow_mut() += 1);

    model.commit(json!({"user": {"name": "Bo"}}));
    assert_eq!(*dirty.borrow(), 1, "one mutation, one re-render signal");
    container.render();

    assert_eq!(*names.borrow(), vec![json!("Ann"), json!("Bo")]);
    assert_eq!(container.phase(), Phase::Mounted, "no remount in between");
}

#[test]
fn tree_notation_binds_the_same_data() {
    let model = MemoryModel::shared(json!({"videos": {"0": {"title": "intro"}}}));
    let provider = Provider::new(model.clone(), ());

    let recorded = Rc::new(RefCell::new(Vec::new()));
    struct TitleView(Rc<RefCell<Vec<Value>>>);
    impl View for TitleView {
        fn render(&mut self, props: &Props) {
            if let Some(title) = props.get_in(&["videos", "0", "title"]) {
                self.0.borrow_mut().push(title.clone());
            }
        }
    }

    let spec =
        ContainerSpec::new(|| FragmentQuery::Tree(json!({"videos": {"0": {"title": true}}})));
    let mut container = create_container(TitleView(Rc::clone(&recorded)), spec)
        .mount(&provider.context())
        .unwrap();

    container.render();
    assert_eq!(*recorded.borrow(), vec![json!("intro")]);
}

#[test]
fn set_local_is_visible_in_cache_only() {
    let model = MemoryModel::shared(json!({"count": 1}));
    let provider = Provider::new(model.clone(), ());

    let (card, names) = NameCard::new();
    let spec = ContainerSpec::new(|| FragmentQuery::Paths(vec![path!["user", "name"]]));
    let mut container = create_container(card, spec)
        .mount(&provider.context())
        .unwrap();
    container.render();
    container.did_mount();
    let renders_before = names.borrow().len();

    provider.set_local(json!({"count": 5}));

    assert_eq!(model.cache(), json!({"count": 5}));
    assert_eq!(names.borrow().len(), renders_before, "local write must not re-render");
}

#[test]
fn two_containers_share_one_version_stream() {
    let model = MemoryModel::shared(json!({"user": {"name": "Ann", "age": 30}}));
    let provider = Provider::new(model.clone(), ());

    let (first_card, first_names) = NameCard::new();
    let mut first = create_container(
        first_card,
        ContainerSpec::new(|| FragmentQuery::Paths(vec![path!["user", "name"]])),
    )
    .mount(&provider.context())
    .unwrap();

    let ages = Rc::new(RefCell::new(Vec::new()));
    struct AgeView(Rc<RefCell<Vec<Value>>>);
    impl View for AgeView {
        fn render(&mut self, props: &Props) {
            if let Some(age) = props.get_in(&["user", "age"]) {
                self.0.borrow_mut().push(age.clone());
            }
        }
    }
    let mut second = create_container(
        AgeView(Rc::clone(&ages)),
        ContainerSpec::new(|| FragmentQuery::Paths(vec![path!["user", "age"]])),
    )
    .mount(&provider.context())
    .unwrap();

    first.render();
    first.did_mount();
    second.render();
    second.did_mount();
    assert_eq!(provider.versions().subscriber_count(), 2);

    model.commit(json!({"user": {"name": "Bo", "age": 31}}));
    first.render();
    second.render();

    assert_eq!(*first_names.borrow(), vec![json!("Ann"), json!("Bo")]);
    assert_eq!(*ages.borrow(), vec![json!(30), json!(31)]);

    // Tearing down one container leaves the sibling live.
    first.unmount();
    model.commit(json!({"user": {"age": 32}}));
    second.render();
    assert_eq!(ages.borrow().last(), Some(&json!(32)));
    assert_eq!(provider.versions().subscriber_count(), 1);
}
