//! Ordered attribute storage.
//!
//! Attributes are name/value pairs attached to nodes and to the document.
//! [`AttrMap`] preserves insertion order, which is the order attribute
//! declarations were encountered in; lookups, inserts and removals are all
//! explicit operations rather than anything structural.

use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

/// An attribute value: a string, or a bare boolean flag.
///
/// A `true` flag renders as the empty string during substitution; a `false`
/// flag behaves as unset without removing the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            AttrValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Str(_) => None,
        }
    }

    /// The text this value contributes to substituted output. `None` for a
    /// `false` flag, which reads as unset.
    pub fn text(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            AttrValue::Bool(true) => Some(""),
            AttrValue::Bool(false) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// A string-keyed attribute map that iterates in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrMap {
    entries: LinkedHashMap<String, AttrValue>,
}

impl AttrMap {
    pub fn new() -> Self {
        AttrMap::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.get(name)
    }

    /// String form of an attribute, if it is set and is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(AttrValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Assigns `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.entries.replace(name.into(), value.into())
    }

    /// Removes `name`, returning the prior value.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.entries.remove(name)
    }

    /// Copies every entry of `other` into this map, overwriting clashes.
    pub fn merge(&mut self, other: &AttrMap) {
        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, AttrValue)> for AttrMap {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        let mut map = AttrMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}
