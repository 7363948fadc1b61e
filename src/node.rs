//! Parse nodes produced by the docblock grammar.
//!
//! A [`ParseNode`] is the intermediate representation between the
//! grammar (see [`crate::docblock`]) and the resolved object model
//! ([`crate::Annotation`]).  Nodes serialize to the classic tagged
//! dictionary layout, a JSON object whose numeric `type` field names
//! the variant:
//!
//! ```text
//! {"type": 300, "name": "Stored", "arguments": [
//!     {"name": "table", "expr": {"type": 303, "value": "users"}}
//! ]}
//! ```
//!
//! Decoding is the only place an unknown `type` tag can appear, so it is
//! also the only place [`AnnotationsError::UnknownExpression`] is raised.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{AnnotationsError, Result};

pub const PHANNOT_T_ANNOTATION: i64 = 300;
pub const PHANNOT_T_INTEGER: i64 = 301;
pub const PHANNOT_T_DOUBLE: i64 = 302;
pub const PHANNOT_T_STRING: i64 = 303;
pub const PHANNOT_T_NULL: i64 = 304;
pub const PHANNOT_T_FALSE: i64 = 305;
pub const PHANNOT_T_TRUE: i64 = 306;
pub const PHANNOT_T_IDENTIFIER: i64 = 307;
pub const PHANNOT_T_ARRAY: i64 = 308;

/// Scalar literal kinds whose raw text is carried through resolution
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Double,
    String,
    Identifier,
}

impl LiteralKind {
    pub fn tag(self) -> i64 {
        match self {
            LiteralKind::Integer => PHANNOT_T_INTEGER,
            LiteralKind::Double => PHANNOT_T_DOUBLE,
            LiteralKind::String => PHANNOT_T_STRING,
            LiteralKind::Identifier => PHANNOT_T_IDENTIFIER,
        }
    }
}

/// One expression as emitted by the grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseNode {
    Literal { kind: LiteralKind, value: String },
    Null,
    True,
    False,
    Array(Vec<ExprItem>),
    Annotation(AnnotationNode),
}

/// An argument or array item: an optional key plus its expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExprItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub expr: ParseNode,
}

/// An `@Name(...)` occurrence.
///
/// `file` and `line` locate the `@` that opened the annotation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationNode {
    pub name: Option<String>,
    pub arguments: Vec<ExprItem>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl ParseNode {
    /// Build a literal node.
    pub fn literal(kind: LiteralKind, value: impl Into<String>) -> Self {
        ParseNode::Literal {
            kind,
            value: value.into(),
        }
    }

    /// The numeric wire tag of this node.
    pub fn tag(&self) -> i64 {
        match self {
            ParseNode::Literal { kind, .. } => kind.tag(),
            ParseNode::Null => PHANNOT_T_NULL,
            ParseNode::True => PHANNOT_T_TRUE,
            ParseNode::False => PHANNOT_T_FALSE,
            ParseNode::Array(_) => PHANNOT_T_ARRAY,
            ParseNode::Annotation(_) => PHANNOT_T_ANNOTATION,
        }
    }

    /// Decode a node from its tagged-dictionary form.
    ///
    /// A missing or unrecognised `type` fails with
    /// [`AnnotationsError::UnknownExpression`].  An array whose `items`
    /// payload is not a list decodes as an empty array.
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let raw_tag = value.get("type").unwrap_or(&JsonValue::Null);
        let tag = match raw_tag {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.parse::<i64>().ok(),
            _ => None,
        };

        let literal = |kind| ParseNode::Literal {
            kind,
            value: literal_text(value.get("value")),
        };

        match tag {
            Some(PHANNOT_T_INTEGER) => Ok(literal(LiteralKind::Integer)),
            Some(PHANNOT_T_DOUBLE) => Ok(literal(LiteralKind::Double)),
            Some(PHANNOT_T_STRING) => Ok(literal(LiteralKind::String)),
            Some(PHANNOT_T_IDENTIFIER) => Ok(literal(LiteralKind::Identifier)),
            Some(PHANNOT_T_NULL) => Ok(ParseNode::Null),
            Some(PHANNOT_T_FALSE) => Ok(ParseNode::False),
            Some(PHANNOT_T_TRUE) => Ok(ParseNode::True),
            Some(PHANNOT_T_ARRAY) => Ok(ParseNode::Array(items_from_value(value.get("items"))?)),
            Some(PHANNOT_T_ANNOTATION) => Ok(ParseNode::Annotation(AnnotationNode::from_value(
                value,
            )?)),
            _ => Err(AnnotationsError::UnknownExpression {
                tag: tag_text(raw_tag),
            }),
        }
    }
}

impl AnnotationNode {
    pub fn new(name: impl Into<String>) -> Self {
        AnnotationNode {
            name: Some(name.into()),
            ..AnnotationNode::default()
        }
    }

    /// Builder-style helper used by the grammar and by tests.
    pub fn with_argument(mut self, name: Option<&str>, expr: ParseNode) -> Self {
        self.arguments.push(ExprItem {
            name: name.map(str::to_string),
            expr,
        });
        self
    }

    /// Decode an annotation entry.
    ///
    /// The `type` tag is not checked here: every element of a docblock's
    /// list is an annotation by construction, so only `name`,
    /// `arguments`, `file` and `line` are read.
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let name = value
            .get("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let arguments = items_from_value(value.get("arguments"))?;
        let file = value
            .get("file")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let line = value
            .get("line")
            .and_then(JsonValue::as_u64)
            .and_then(|l| u32::try_from(l).ok());

        Ok(AnnotationNode {
            name,
            arguments,
            file,
            line,
        })
    }

    /// Decode a list of annotation entries; a non-list decodes as empty.
    pub fn list_from_value(value: &JsonValue) -> Result<Vec<Self>> {
        match value.as_array() {
            Some(entries) => entries.iter().map(AnnotationNode::from_value).collect(),
            None => Ok(Vec::new()),
        }
    }
}

fn items_from_value(items: Option<&JsonValue>) -> Result<Vec<ExprItem>> {
    let Some(JsonValue::Array(items)) = items else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| {
            let name = item
                .get("name")
                .and_then(JsonValue::as_str)
                .map(str::to_string);
            let expr = ParseNode::from_value(item.get("expr").unwrap_or(&JsonValue::Null))?;
            Ok(ExprItem { name, expr })
        })
        .collect()
}

fn literal_text(value: Option<&JsonValue>) -> String {
    match value {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn tag_text(raw: &JsonValue) -> String {
    match raw {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ─── Serialization ──────────────────────────────────────────────────────────

impl Serialize for ParseNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ParseNode::Annotation(node) => node.serialize(serializer),
            ParseNode::Literal { kind, value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", &kind.tag())?;
                map.serialize_entry("value", value)?;
                map.end()
            }
            ParseNode::Array(items) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", &PHANNOT_T_ARRAY)?;
                map.serialize_entry("items", items)?;
                map.end()
            }
            ParseNode::Null | ParseNode::True | ParseNode::False => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", &self.tag())?;
                map.end()
            }
        }
    }
}

impl Serialize for AnnotationNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &PHANNOT_T_ANNOTATION)?;
        if let Some(name) = &self.name {
            map.serialize_entry("name", name)?;
        }
        if !self.arguments.is_empty() {
            map.serialize_entry("arguments", &self.arguments)?;
        }
        if let Some(file) = &self.file {
            map.serialize_entry("file", file)?;
        }
        if let Some(line) = self.line {
            map.serialize_entry("line", &line)?;
        }
        map.end()
    }
}
