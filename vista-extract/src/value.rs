//! What an extraction produces.

use std::fmt;
use std::ops::Index;

use crate::document::Document;
use crate::node::Node;

/// Output of one content slot.
pub enum Value<D: Document> {
    /// The content was absent.
    Null,
    Node(Node<D>),
    Text(String),
    List(Vec<Value<D>>),
    Record(Record<D>),
}

impl<D: Document> Value<D> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_node(&self) -> Option<&Node<D>> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<D>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record<D>> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl<D: Document> From<Option<String>> for Value<D> {
    fn from(text: Option<String>) -> Self {
        text.map_or(Value::Null, Value::Text)
    }
}

impl<D: Document> Clone for Value<D> {
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Node(node) => Value::Node(node.clone()),
            Value::Text(text) => Value::Text(text.clone()),
            Value::List(items) => Value::List(items.clone()),
            Value::Record(record) => Value::Record(record.clone()),
        }
    }
}

impl<D: Document> PartialEq for Value<D> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl<D: Document> fmt::Debug for Value<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Node(node) => node.fmt(f),
            Value::Text(text) => text.fmt(f),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Record(record) => record.fmt(f),
        }
    }
}

/// Slot name to value, in declaration order.
///
/// Entries are reachable by key (`record["title"]`, [`Record::get`]) and
/// through typed accessors such as [`Record::node`] and [`Record::list`].
pub struct Record<D: Document> {
    entries: Vec<(String, Value<D>)>,
}

impl<D: Document> Record<D> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `name`, replacing an earlier value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value<D>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value<D>> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<D>)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// `true` when the slot is missing or evaluated to nothing.
    pub fn is_null(&self, name: &str) -> bool {
        self.get(name).map_or(true, Value::is_null)
    }

    pub fn node(&self, name: &str) -> Option<&Node<D>> {
        self.get(name).and_then(Value::as_node)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    /// Items of a group slot; empty when the slot is absent.
    pub fn list(&self, name: &str) -> &[Value<D>] {
        self.get(name).and_then(Value::as_list).unwrap_or(&[])
    }

    pub fn record(&self, name: &str) -> Option<&Record<D>> {
        self.get(name).and_then(Value::as_record)
    }
}

impl<D: Document> Default for Record<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> Index<&str> for Record<D> {
    type Output = Value<D>;

    fn index(&self, name: &str) -> &Value<D> {
        match self.get(name) {
            Some(value) => value,
            None => panic!("record has no slot named `{name}`"),
        }
    }
}

impl<D: Document> IntoIterator for Record<D> {
    type Item = (String, Value<D>);
    type IntoIter = std::vec::IntoIter<(String, Value<D>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<D: Document> FromIterator<(String, Value<D>)> for Record<D> {
    fn from_iter<I: IntoIterator<Item = (String, Value<D>)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl<D: Document> Clone for Record<D> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

/// Key order is not part of equality.
impl<D: Document> PartialEq for Record<D> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<D: Document> fmt::Debug for Record<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
