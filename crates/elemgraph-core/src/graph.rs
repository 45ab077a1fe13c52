//! Flat element arena.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::element::{Element, InstanceElement, TypeDefinition};

/// Aggregate of all elements produced by one fetch cycle.
///
/// Elements live in a flat vector; references between them are identifiers,
/// so cyclic reference structures need no shared ownership. Identifiers may be
/// duplicated transiently, which is why lookups return every match.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementGraph {
    /// All elements, in fetch order.
    pub elements: Vec<Element>,
    /// Arbitrary metadata about the fetch.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ElementGraph {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            metadata: HashMap::new(),
        }
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of instances.
    pub fn instance_count(&self) -> usize {
        self.instances().count()
    }

    /// Iterate over all elements. Each call restarts from the beginning.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Iterate over instances only.
    pub fn instances(&self) -> impl Iterator<Item = &InstanceElement> {
        self.elements.iter().filter_map(Element::as_instance)
    }

    /// Iterate over type definitions only.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.elements.iter().filter_map(|e| match e {
            Element::Type(t) => Some(t),
            Element::Instance(_) => None,
        })
    }

    /// Total number of references held by instances.
    pub fn reference_count(&self) -> usize {
        let mut count = 0;
        for instance in self.instances() {
            instance.walk_references(|_, _| count += 1);
        }
        count
    }
}

impl From<Vec<Element>> for ElementGraph {
    fn from(elements: Vec<Element>) -> Self {
        Self::new(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elem_id::ElemId;
    use crate::value::{Value, ValueMap};

    fn sample() -> ElementGraph {
        let mut value = ValueMap::new();
        value.insert(
            "book".to_string(),
            Value::reference(ElemId::instance("a", "book", "b1")),
        );
        ElementGraph::new(vec![
            TypeDefinition::new("a", "book").into(),
            InstanceElement::new("a", "book", "b1", ValueMap::new()).into(),
            InstanceElement::new("a", "recipe", "same", value.clone()).into(),
            InstanceElement::new("a", "recipe", "same", value).into(),
        ])
    }

    #[test]
    fn test_counts() {
        let graph = sample();
        assert_eq!(graph.element_count(), 4);
        assert_eq!(graph.instance_count(), 3);
        assert_eq!(graph.types().count(), 1);
        assert_eq!(graph.reference_count(), 2);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let graph = sample();
        let first: Vec<_> = graph.iter().map(|e| e.elem_id().full_name()).collect();
        let second: Vec<_> = graph.iter().map(|e| e.elem_id().full_name()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let graph = sample();
        let same = ElemId::instance("a", "recipe", "same");
        assert_eq!(graph.instances().filter(|i| i.elem_id == same).count(), 2);
    }
}
