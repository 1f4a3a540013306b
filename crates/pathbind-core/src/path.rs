#![forbid(unsafe_code)]

//! Graph paths and declarative fragment queries.
//!
//! A [`Path`] addresses one leaf in the model's object graph as an ordered
//! list of [`PathKey`]s (string keys and numeric indices). A component
//! declares its data needs as a [`FragmentQuery`], either as an explicit
//! path list or as a nested tree whose leaves mark path terminals:
//!
//! ```
//! use pathbind_core::path::{FragmentQuery, Path, PathKey};
//! use serde_json::json;
//!
//! let q = FragmentQuery::Tree(json!({"videos": {"0": {"title": true}}}));
//! let paths = q.into_paths().unwrap();
//! assert_eq!(paths, vec![Path::from(vec![
//!     PathKey::key("videos"),
//!     PathKey::Index(0),
//!     PathKey::key("title"),
//! ])]);
//! ```
//!
//! # Invariants
//!
//! 1. Normalization is total over the tagged variants: `Paths` passes
//!    through, `Tree` flattens depth-first. There is no runtime shape
//!    sniffing; an unsupported shape is a typed error, not a guess.
//! 2. Flattening is structurally deterministic: the same tree always yields
//!    the same path list in the same order.
//! 3. A normalized query is never empty. Zero paths is [`PathError::Empty`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PathError;

// ---------------------------------------------------------------------------
// PathKey / Path
// ---------------------------------------------------------------------------

/// One step along a graph path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    /// String member key.
    Key(String),
    /// Numeric index.
    Index(u64),
}

impl PathKey {
    /// Shorthand for a string key.
    pub fn key(k: impl Into<String>) -> Self {
        Self::Key(k.into())
    }

    /// Parse a tree-notation key: digits become an index, anything else a key.
    fn from_tree_key(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) => Self::Index(n),
            Err(_) => Self::Key(raw.to_string()),
        }
    }
}

impl From<&str> for PathKey {
    fn from(k: &str) -> Self {
        Self::Key(k.to_string())
    }
}

impl From<String> for PathKey {
    fn from(k: String) -> Self {
        Self::Key(k)
    }
}

impl From<u64> for PathKey {
    fn from(i: u64) -> Self {
        Self::Index(i)
    }
}

impl From<usize> for PathKey {
    fn from(i: usize) -> Self {
        Self::Index(i as u64)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// An ordered path from the graph root down to one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Path(pub Vec<PathKey>);

impl Path {
    /// Number of keys in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the keys root-first.
    pub fn keys(&self) -> impl Iterator<Item = &PathKey> {
        self.0.iter()
    }
}

impl From<Vec<PathKey>> for Path {
    fn from(keys: Vec<PathKey>) -> Self {
        Self(keys)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for key in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{key}")?;
            first = false;
        }
        Ok(())
    }
}

/// Build a [`Path`] from mixed key literals.
///
/// ```
/// use pathbind_core::path;
/// let p = path!["videos", 0u64, "title"];
/// assert_eq!(p.to_string(), "videos.0.title");
/// ```
#[macro_export]
macro_rules! path {
    ($($key:expr),* $(,)?) => {
        $crate::path::Path::from(vec![$($crate::path::PathKey::from($key)),*])
    };
}

// ---------------------------------------------------------------------------
// FragmentQuery
// ---------------------------------------------------------------------------

/// A component's declared data needs, in one of two notations.
///
/// The variant is chosen by the declaration itself (tagged), so
/// normalization never has to infer the shape at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentQuery {
    /// Explicit ordered path list.
    Paths(Vec<Path>),
    /// Nested object notation: leaves mark path terminals.
    Tree(Value),
}

impl FragmentQuery {
    /// Normalize into an ordered path list.
    ///
    /// `Paths` passes through unchanged; `Tree` flattens depth-first in the
    /// tree's own (deterministic) key order.
    pub fn into_paths(self) -> Result<Vec<Path>, PathError> {
        let paths = match self {
            Self::Paths(paths) => paths,
            Self::Tree(tree) => flatten_tree(&tree)?,
        };
        if paths.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(paths)
    }
}

fn flatten_tree(tree: &Value) -> Result<Vec<Path>, PathError> {
    let Value::Object(root) = tree else {
        return Err(PathError::NonObjectRoot {
            found: json_type_name(tree),
        });
    };
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    flatten_node(root, &mut prefix, &mut out)?;
    Ok(out)
}

fn flatten_node(
    node: &serde_json::Map<String, Value>,
    prefix: &mut Vec<PathKey>,
    out: &mut Vec<Path>,
) -> Result<(), PathError> {
    if node.is_empty() {
        return Err(PathError::EmptyNode {
            at: Path(prefix.clone()).to_string(),
        });
    }
    for (raw_key, child) in node {
        prefix.push(PathKey::from_tree_key(raw_key));
        match child {
            Value::Object(inner) => flatten_node(inner, prefix, out)?,
            // Any non-object leaf terminates the path here.
            _ => out.push(Path(prefix.clone())),
        }
        prefix.pop();
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
