//! Dot-separated paths into a JSON state tree.
//!
//! A path like `settings.theme` addresses the `theme` key inside the
//! `settings` mapping. The empty path is the root of the tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Subscription key that matches a change at any path.
pub const WILDCARD: &str = "*";

/// A parsed dot-separated path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StatePath {
    segments: Vec<String>,
}

impl StatePath {
    /// The root path (the whole tree).
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a dotted string. Empty segments are ignored, so `""` and `"."`
    /// both parse to the root.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self {
            segments: input
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Builds a path from already-split segments.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this is the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The immediate parent. The root has no parent.
    #[must_use]
    pub fn parent(&self) -> Option<StatePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Strict ancestors, nearest first, excluding the root.
    ///
    /// For `a.b.c` this yields `a.b` then `a`.
    #[must_use]
    pub fn ancestors(&self) -> Vec<StatePath> {
        (1..self.segments.len())
            .rev()
            .map(|n| Self {
                segments: self.segments[..n].to_vec(),
            })
            .collect()
    }

    /// Returns true if `self` is a strict ancestor of `other`.
    /// The root is an ancestor of every non-root path.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &StatePath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Appends `other` to this path.
    #[must_use]
    pub fn join(&self, other: &StatePath) -> StatePath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Formats back to a dotted string. The root formats as `""`.
    #[must_use]
    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Looks up the value this path addresses inside `root`.
    ///
    /// Mappings are indexed by key and sequences by numeric index. Returns
    /// `None` when any segment is missing.
    #[must_use]
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value` at this path inside `root`, returning the previous value.
    ///
    /// Missing intermediates are created as empty mappings. Intermediates that
    /// exist but are neither mappings nor sequences are overwritten with empty
    /// mappings. A sequence addressed by a numeric segment is kept: an index
    /// past the end grows it, padding with `null`. Writing the root path
    /// replaces the whole tree.
    pub fn assign(&self, root: &mut Value, value: Value) -> Option<Value> {
        let Some((leaf, parents)) = self.segments.split_last() else {
            return Some(std::mem::replace(root, value));
        };

        let mut current = root;
        for segment in parents {
            current = descend_or_create(current, segment);
        }

        if let Value::Array(items) = current {
            if let Ok(index) = leaf.parse::<usize>() {
                if index < items.len() {
                    return Some(std::mem::replace(&mut items[index], value));
                }
                items.resize(index, Value::Null);
                items.push(value);
                return None;
            }
        }
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        match current {
            Value::Object(map) => map.insert(leaf.clone(), value),
            _ => None,
        }
    }

    /// Removes the leaf this path addresses, returning it.
    ///
    /// A mapping entry is removed outright. A sequence element is replaced by
    /// `null` so later indices keep addressing the same elements. Does
    /// nothing when the parent does not resolve to an existing mapping or
    /// sequence. Removing the root is a no-op.
    pub fn remove_from(&self, root: &mut Value) -> Option<Value> {
        let (leaf, parents) = self.segments.split_last()?;
        let mut current = root;
        for segment in parents {
            current = match current {
                Value::Object(map) => map.get_mut(segment)?,
                Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        match current {
            Value::Object(map) => map.shift_remove(leaf),
            Value::Array(items) => {
                let slot = items.get_mut(leaf.parse::<usize>().ok()?)?;
                Some(std::mem::replace(slot, Value::Null))
            }
            _ => None,
        }
    }
}

fn descend_or_create<'a>(current: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = match &*current {
        Value::Array(_) => segment.parse::<usize>().ok(),
        _ => None,
    };
    match (current, index) {
        (Value::Array(items), Some(i)) => {
            if i >= items.len() {
                items.resize(i + 1, Value::Null);
            }
            &mut items[i]
        }
        (slot, _) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            // Indexing a mapping by key inserts null when absent; the next
            // step (or the leaf write) replaces it.
            &mut slot[segment]
        }
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl From<&str> for StatePath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for StatePath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&String> for StatePath {
    fn from(s: &String) -> Self {
        Self::parse(s)
    }
}

impl From<StatePath> for String {
    fn from(path: StatePath) -> Self {
        path.to_dotted()
    }
}
