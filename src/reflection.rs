//! Per-class annotation model.
//!
//! [`ReflectionData`] is the raw dictionary the reader assembles for a
//! class: the class docblock's nodes plus one node list per annotated
//! constant, property and method.  [`Reflection`] wraps it and derives
//! [`Collection`]s lazily, each view at most once.

use std::cell::OnceCell;
use std::ops::Index;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::collection::Collection;
use crate::error::Result;
use crate::node::AnnotationNode;

/// Node lists keyed by member name, in declaration order.
pub type MemberNodes = Vec<(String, Vec<AnnotationNode>)>;

/// The raw parse tree of one class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReflectionData {
    /// `None` when the class has no docblock at all.
    pub class: Option<Vec<AnnotationNode>>,
    pub constants: MemberNodes,
    pub properties: MemberNodes,
    pub methods: MemberNodes,
}

impl ReflectionData {
    pub fn is_empty(&self) -> bool {
        self.class.is_none()
            && self.constants.is_empty()
            && self.properties.is_empty()
            && self.methods.is_empty()
    }

    /// Decode the dictionary form produced by `serde_json::to_value`.
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let class = match value.get("class") {
            Some(nodes) => Some(AnnotationNode::list_from_value(nodes)?),
            None => None,
        };

        Ok(ReflectionData {
            class,
            constants: members_from_value(value.get("constants"))?,
            properties: members_from_value(value.get("properties"))?,
            methods: members_from_value(value.get("methods"))?,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_value(&value)
    }
}

fn members_from_value(value: Option<&JsonValue>) -> Result<MemberNodes> {
    let Some(JsonValue::Object(members)) = value else {
        return Ok(Vec::new());
    };
    members
        .iter()
        .map(|(name, nodes)| Ok((name.clone(), AnnotationNode::list_from_value(nodes)?)))
        .collect()
}

impl Serialize for ReflectionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Members<'a>(&'a MemberNodes);

        impl Serialize for Members<'_> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, nodes) in self.0 {
                    map.serialize_entry(name, nodes)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(None)?;
        if let Some(class) = &self.class {
            map.serialize_entry("class", class)?;
        }
        for (key, members) in [
            ("constants", &self.constants),
            ("properties", &self.properties),
            ("methods", &self.methods),
        ] {
            if !members.is_empty() {
                map.serialize_entry(key, &Members(members))?;
            }
        }
        map.end()
    }
}

/// Collections keyed by member name, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemberCollections {
    entries: Vec<(String, Collection)>,
}

impl MemberCollections {
    fn build(members: &MemberNodes) -> Self {
        MemberCollections {
            entries: members
                .iter()
                .map(|(name, nodes)| (name.clone(), Collection::new(nodes)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Lookup ignoring ASCII case, as PHP does for method names.
    pub fn get_ignore_case(&self, name: &str) -> Option<&Collection> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| c)
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

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Collection)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }
}

impl Index<&str> for MemberCollections {
    type Output = Collection;

    /// Annotations of the member with exactly this name.
    ///
    /// # Panics
    ///
    /// Panics if no annotations were recorded for the member.  Use
    /// [`MemberCollections::get`] for a lookup that may miss.
    fn index(&self, name: &str) -> &Collection {
        match self.get(name) {
            Some(collection) => collection,
            None => panic!("no annotations recorded for member '{name}'"),
        }
    }
}

/// Lazily-derived annotation views over one class's [`ReflectionData`].
#[derive(Debug, Default)]
pub struct Reflection {
    data: ReflectionData,
    class_annotations: OnceCell<Option<Collection>>,
    constant_annotations: OnceCell<MemberCollections>,
    property_annotations: OnceCell<MemberCollections>,
    method_annotations: OnceCell<MemberCollections>,
}

impl Reflection {
    pub fn new(data: ReflectionData) -> Self {
        Reflection {
            data,
            ..Reflection::default()
        }
    }

    /// Class-level annotations; `None` when the class docblock produced
    /// no annotations.
    pub fn class_annotations(&self) -> Option<&Collection> {
        self.class_annotations
            .get_or_init(|| {
                self.data
                    .class
                    .as_deref()
                    .filter(|nodes| !nodes.is_empty())
                    .map(Collection::new)
            })
            .as_ref()
    }

    pub fn constants_annotations(&self) -> &MemberCollections {
        self.constant_annotations
            .get_or_init(|| MemberCollections::build(&self.data.constants))
    }

    pub fn properties_annotations(&self) -> &MemberCollections {
        self.property_annotations
            .get_or_init(|| MemberCollections::build(&self.data.properties))
    }

    /// Method keys are stored verbatim; use
    /// [`MemberCollections::get_ignore_case`] for lookups.
    pub fn methods_annotations(&self) -> &MemberCollections {
        self.method_annotations
            .get_or_init(|| MemberCollections::build(&self.data.methods))
    }

    pub fn reflection_data(&self) -> &ReflectionData {
        &self.data
    }
}

impl From<ReflectionData> for Reflection {
    fn from(data: ReflectionData) -> Self {
        Reflection::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{LiteralKind, ParseNode};

    fn sample_data() -> ReflectionData {
        ReflectionData {
            class: Some(vec![AnnotationNode::new("Stored").with_argument(
                Some("table"),
                ParseNode::literal(LiteralKind::String, "users"),
            )]),
            constants: vec![("STATUS".into(), vec![AnnotationNode::new("Deprecated")])],
            properties: vec![
                ("id".into(), vec![AnnotationNode::new("Identity")]),
                ("name".into(), vec![]),
            ],
            methods: vec![("barMethod".into(), vec![AnnotationNode::new("Get")])],
        }
    }

    #[test]
    fn derived_views_are_memoized() {
        let reflection = Reflection::new(sample_data());
        let first = reflection.methods_annotations();
        let second = reflection.methods_annotations();
        assert!(std::ptr::eq(first, second));

        let class_first = reflection.class_annotations().unwrap();
        let class_second = reflection.class_annotations().unwrap();
        assert!(std::ptr::eq(class_first, class_second));
    }

    #[test]
    fn empty_class_entry_yields_no_collection() {
        let reflection = Reflection::new(ReflectionData {
            class: Some(Vec::new()),
            ..ReflectionData::default()
        });
        assert!(reflection.class_annotations().is_none());
        assert!(reflection.constants_annotations().is_empty());
        assert!(reflection.properties_annotations().is_empty());
    }

    #[test]
    fn members_keep_empty_docblocks() {
        let reflection = Reflection::new(sample_data());
        let properties = reflection.properties_annotations();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["name"].count(), 0);
        assert!(properties["id"].has("Identity"));
    }

    #[test]
    #[should_panic(expected = "no annotations recorded for member 'missing'")]
    fn indexing_a_missing_member_panics() {
        let reflection = Reflection::new(sample_data());
        let _ = &reflection.properties_annotations()["missing"];
    }

    #[test]
    fn method_lookup_ignoring_case() {
        let reflection = Reflection::new(sample_data());
        let methods = reflection.methods_annotations();
        assert!(methods.get("BARMETHOD").is_none());
        assert!(methods.get_ignore_case("BARMETHOD").unwrap().has("Get"));
    }

    #[test]
    fn json_round_trip_rebuilds_equal_collections() {
        let original = Reflection::new(sample_data());
        let text = serde_json::to_string(original.reflection_data()).unwrap();
        let rebuilt = Reflection::new(ReflectionData::from_json(&text).unwrap());

        assert_eq!(rebuilt.reflection_data(), original.reflection_data());
        assert_eq!(rebuilt.class_annotations(), original.class_annotations());
        assert_eq!(
            rebuilt.properties_annotations(),
            original.properties_annotations()
        );
        assert_eq!(rebuilt.methods_annotations(), original.methods_annotations());
    }
}
