//! The annotations of one docblock.

use crate::annotation::Annotation;
use crate::error::{AnnotationsError, Result};
use crate::node::AnnotationNode;

/// Ordered, immutable group of annotations taken from a single
/// docblock (a class, one constant, one property or one method).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    annotations: Vec<Annotation>,
}

impl Collection {
    pub fn new(nodes: &[AnnotationNode]) -> Self {
        Collection {
            annotations: nodes.iter().map(Annotation::new).collect(),
        }
    }

    /// A collection with no annotations.
    pub const fn empty() -> Self {
        Collection {
            annotations: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// First annotation called `name`.
    ///
    /// Unlike the adapter's member lookups this is strict: a missing
    /// annotation is an error.
    pub fn get(&self, name: &str) -> Result<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.name() == Some(name))
            .ok_or_else(|| AnnotationsError::NotFound {
                name: name.to_string(),
            })
    }

    /// Every annotation called `name`, in docblock order.
    pub fn get_all(&self, name: &str) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.name() == Some(name))
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name() == Some(name))
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Iterate from the first annotation; each call starts over.
    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
