//! Resolved annotations.
//!
//! An [`Annotation`] is the immutable view of one [`AnnotationNode`]:
//! its name plus the arguments with every expression resolved into a
//! [`Value`].  Arguments live in an ordered map keyed either by name or
//! by position, mirroring how annotation arguments are written:
//!
//! ```text
//! @Route("/users", methods={"GET", "POST"}, name="users")
//!        ^ 0       ^ "methods"             ^ "name"
//! ```

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;

use crate::node::{AnnotationNode, ExprItem, LiteralKind, ParseNode};

/// Positional indexes stay below the largest PHP integer key.
pub const MAX_INDEX: usize = i64::MAX as usize;

/// Key of a resolved argument or array entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgumentKey {
    Named(String),
    Index(usize),
}

impl ArgumentKey {
    /// Canonical decimal names (`"0"`, `"12"`) below [`MAX_INDEX`]
    /// address positions, the same way integer-like string keys behave
    /// in PHP arrays.  Larger numbers stay names.
    fn normalise(name: &str) -> Self {
        let canonical = !name.is_empty()
            && name.bytes().all(|b| b.is_ascii_digit())
            && (name == "0" || !name.starts_with('0'));
        match canonical
            .then(|| name.parse::<usize>().ok())
            .flatten()
            .filter(|index| *index < MAX_INDEX)
        {
            Some(index) => ArgumentKey::Index(index),
            None => ArgumentKey::Named(name.to_string()),
        }
    }
}

impl From<&str> for ArgumentKey {
    fn from(name: &str) -> Self {
        ArgumentKey::normalise(name)
    }
}

impl From<String> for ArgumentKey {
    fn from(name: String) -> Self {
        ArgumentKey::normalise(&name)
    }
}

impl From<usize> for ArgumentKey {
    fn from(index: usize) -> Self {
        ArgumentKey::Index(index)
    }
}

impl From<i32> for ArgumentKey {
    fn from(index: i32) -> Self {
        match usize::try_from(index) {
            Ok(index) => ArgumentKey::Index(index),
            Err(_) => ArgumentKey::Named(index.to_string()),
        }
    }
}

impl fmt::Display for ArgumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKey::Named(name) => f.write_str(name),
            ArgumentKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Ordered map of resolved arguments (or array entries).
///
/// Positional entries receive sequential indexes in order of
/// appearance.  Assigning a key that already exists replaces the value
/// but keeps the original position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    entries: Vec<(ArgumentKey, Value)>,
    next_index: usize,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional entry.
    ///
    /// Once an explicit key has used up the positions below
    /// [`MAX_INDEX`], further entries share the name `"{MAX_INDEX}"`
    /// and the last one wins.
    pub fn push(&mut self, value: Value) {
        if self.next_index >= MAX_INDEX {
            tracing::warn!("no positional index left after {}; entry stored by name", MAX_INDEX);
            self.insert(ArgumentKey::Named(MAX_INDEX.to_string()), value);
            return;
        }
        let key = ArgumentKey::Index(self.next_index);
        self.next_index += 1;
        self.entries.push((key, value));
    }

    /// Insert under an explicit key.
    pub fn insert(&mut self, key: impl Into<ArgumentKey>, value: Value) {
        let key = key.into();
        if let ArgumentKey::Index(index) = key {
            let next = index.saturating_add(1).min(MAX_INDEX);
            self.next_index = self.next_index.max(next);
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: impl Into<ArgumentKey>) -> Option<&Value> {
        let key = key.into();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: impl Into<ArgumentKey>) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArgumentKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArgumentKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// `true` when the keys are exactly `0..len` in order, i.e. the map
    /// reads as a plain list.
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == ArgumentKey::Index(i))
    }

    /// Resolve a list of items, honouring optional names.
    ///
    /// An empty name or `"0"` does not count as a name: the item is
    /// appended positionally.
    fn from_items(items: &[ExprItem]) -> Self {
        let mut resolved = Arguments::new();
        for item in items {
            let value = Annotation::expression(&item.expr);
            match item.name.as_deref() {
                Some(name) if !name.is_empty() && name != "0" => resolved.insert(name, value),
                _ => resolved.push(value),
            }
        }
        resolved
    }
}

/// A resolved expression.
///
/// Scalar literals keep the exact text the grammar produced; the typed
/// accessors parse on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(String),
    Double(String),
    String(String),
    Identifier(String),
    Array(Arguments),
    Annotation(Box<Annotation>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Raw text of any scalar literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Integer(s) | Value::Double(s) | Value::String(s) | Value::Identifier(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(s) | Value::Double(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Arguments> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            Value::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One resolved annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    name: Option<String>,
    arguments: Arguments,
    expr_arguments: Vec<ExprItem>,
}

impl Annotation {
    pub fn new(node: &AnnotationNode) -> Self {
        Annotation {
            name: node.name.clone().filter(|n| !n.is_empty()),
            arguments: Arguments::from_items(&node.arguments),
            expr_arguments: node.arguments.clone(),
        }
    }

    /// Resolve one expression.
    ///
    /// Arrays become ordered maps and nested annotations become nested
    /// [`Annotation`]s; every other node maps to its scalar.
    pub fn expression(expr: &ParseNode) -> Value {
        match expr {
            ParseNode::Literal { kind, value } => match kind {
                LiteralKind::Integer => Value::Integer(value.clone()),
                LiteralKind::Double => Value::Double(value.clone()),
                LiteralKind::String => Value::String(value.clone()),
                LiteralKind::Identifier => Value::Identifier(value.clone()),
            },
            ParseNode::Null => Value::Null,
            ParseNode::True => Value::Bool(true),
            ParseNode::False => Value::Bool(false),
            ParseNode::Array(items) => Value::Array(Arguments::from_items(items)),
            ParseNode::Annotation(node) => Value::Annotation(Box::new(Annotation::new(node))),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Argument by name or zero-based position; `None` when absent.
    pub fn argument(&self, position: impl Into<ArgumentKey>) -> Option<&Value> {
        self.arguments.get(position)
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// The unresolved argument nodes, in source order.
    pub fn expr_arguments(&self) -> &[ExprItem] {
        &self.expr_arguments
    }

    pub fn named_argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn named_parameter(&self, name: &str) -> Option<&Value> {
        self.named_argument(name)
    }

    /// Whether the argument exists and is not `null`.
    pub fn has_argument(&self, position: impl Into<ArgumentKey>) -> bool {
        self.arguments.get(position).is_some_and(|v| !v.is_null())
    }

    pub fn number_arguments(&self) -> usize {
        self.arguments.len()
    }
}

// ─── Serialization ──────────────────────────────────────────────────────────
//
// Resolved values serialize as plain JSON for display: lists become
// arrays, keyed maps become objects, numeric literals become numbers
// when their text parses.

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(s) => match s.parse::<i64>() {
                Ok(n) => serializer.serialize_i64(n),
                Err(_) => serializer.serialize_str(s),
            },
            Value::Double(s) => match s.parse::<f64>() {
                Ok(n) => serializer.serialize_f64(n),
                Err(_) => serializer.serialize_str(s),
            },
            Value::String(s) | Value::Identifier(s) => serializer.serialize_str(s),
            Value::Array(items) => items.serialize(serializer),
            Value::Annotation(annotation) => annotation.serialize(serializer),
        }
    }
}

impl Serialize for Arguments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for value in self.values() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(&key.to_string(), value)?;
            }
            map.end()
        }
    }
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("arguments", &self.arguments)?;
        map.end()
    }
}
