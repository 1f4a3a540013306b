#![forbid(unsafe_code)]

//! The rendered props surface: the shallow union of a container's last
//! fetched JSON fields and its interaction-derived callbacks.
//!
//! Absent fields are simply absent: lookups return `None`, never an error.
//! The presentational side only reads; render state is mutated exclusively
//! by the container's data handler.

use std::rc::Rc;

use ahash::AHashMap;
use serde_json::{Map, Value};

/// A callback prop derived from a container's interaction declaration.
/// Typically pushes its argument into an intent stream.
pub type IntentCallback = Rc<dyn Fn(Value)>;

/// Input to a [`View`]'s render: data fields plus interaction callbacks.
#[derive(Clone, Default)]
pub struct Props {
    fields: Map<String, Value>,
    callbacks: AHashMap<String, IntentCallback>,
}

impl Props {
    /// Assemble props from a render-state snapshot and callback mapping.
    #[must_use]
    pub fn from_parts(fields: Map<String, Value>, callbacks: AHashMap<String, IntentCallback>) -> Self {
        Self { fields, callbacks }
    }

    /// Look up a data field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a nested data value by path steps from the field root.
    #[must_use]
    pub fn get_in(&self, steps: &[&str]) -> Option<&Value> {
        let (first, rest) = steps.split_first()?;
        let mut current = self.fields.get(*first)?;
        for step in rest {
            current = current.get(step)?;
        }
        Some(current)
    }

    /// Invoke the callback named `name` with `argument`. Returns whether a
    /// callback by that name exists.
    pub fn call(&self, name: &str, argument: Value) -> bool {
        match self.callbacks.get(name) {
            Some(callback) => {
                callback(argument);
                true
            }
            None => false,
        }
    }

    /// Names of all data fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Names of all callbacks.
    pub fn callback_names(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }

    /// Whether the props carry neither fields nor callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for Props {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Props")
            .field("fields", &self.fields)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// The presentational side a container wraps: consumes props, produces
/// output for the host rendering engine (out of scope here).
pub trait View {
    /// Render with the current props union.
    fn render(&mut self, props: &Props);

    /// Display name used in container diagnostics. Defaults to the type
    /// name without its module path.
    fn name(&self) -> &'static str
    where
        Self: Sized,
    {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn sample_props(callback_log: &Rc<RefCell<Vec<Value>>>) -> Props {
        let mut fields = Map::new();
        fields.insert("user".to_string(), json!({"name": "Ann"}));
        fields.insert("count".to_string(), json!(3));

        let mut callbacks: AHashMap<String, IntentCallback> = AHashMap::new();
        let log = Rc::clone(callback_log);
        callbacks.insert(
            "on_save".to_string(),
            Rc::new(move |arg| log.borrow_mut().push(arg)),
        );

        Props::from_parts(fields, callbacks)
    }

    #[test]
    fn field_lookup() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let props = sample_props(&log);
        assert_eq!(props.get("count"), Some(&json!(3)));
        assert_eq!(props.get("missing"), None);
        assert_eq!(props.get_in(&["user", "name"]), Some(&json!("Ann")));
        assert_eq!(props.get_in(&["user", "email"]), None);
    }

    #[test]
    fn callback_invocation() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let props = sample_props(&log);

        assert!(props.call("on_save", json!({"id": 1})));
        assert!(!props.call("on_delete", json!(null)));
        assert_eq!(*log.borrow(), vec![json!({"id": 1})]);
    }

    #[test]
    fn empty_props() {
        let props = Props::default();
        assert!(props.is_empty());
        assert_eq!(props.field_names().count(), 0);
        assert_eq!(props.callback_names().count(), 0);
    }

    #[test]
    fn view_name_strips_module_path() {
        struct UserCard;
        impl View for UserCard {
            fn render(&mut self, _props: &Props) {}
        }
        assert_eq!(UserCard.name(), "UserCard");
    }
}
