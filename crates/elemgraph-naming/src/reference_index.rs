//! Inverse adjacency from referenced instances to the places referencing them.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use elemgraph_core::{ElemId, InstanceElement, ValuePath};

/// A single place in the graph holding a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSite {
    /// Instance holding the reference.
    pub source: ElemId,
    /// Where inside the source instance the reference is stored.
    pub path: ValuePath,
    /// Exact (possibly nested) identifier the reference points at.
    pub target: ElemId,
}

/// Map of top-level target id to every site referencing it.
///
/// Buckets appear in the order their target was first seen. Sites within a
/// bucket follow input instance order, then pre-order traversal of values
/// followed by annotations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceIndex {
    buckets: IndexMap<ElemId, Vec<ReferenceSite>>,
}

impl ReferenceIndex {
    /// Scan `instances` once and index references whose top-level target is in
    /// `nameable_targets`. References to other targets are ignored.
    pub fn build<'a, I>(instances: I, nameable_targets: &HashSet<ElemId>) -> Self
    where
        I: IntoIterator<Item = &'a InstanceElement>,
    {
        let mut buckets: IndexMap<ElemId, Vec<ReferenceSite>> = IndexMap::new();
        for instance in instances {
            instance.walk_references(|reference, path| {
                let target = reference.top_level_target();
                if !nameable_targets.contains(&target) {
                    return;
                }
                buckets.entry(target).or_default().push(ReferenceSite {
                    source: instance.elem_id.clone(),
                    path,
                    target: reference.elem_id.clone(),
                });
            });
        }
        Self { buckets }
    }

    /// Sites referencing `target`.
    pub fn referrers(&self, target: &ElemId) -> &[ReferenceSite] {
        self.buckets.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Referenced targets, in first-seen order.
    pub fn targets(&self) -> impl Iterator<Item = &ElemId> {
        self.buckets.keys()
    }

    /// Buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&ElemId, &[ReferenceSite])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of distinct targets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of indexed sites.
    pub fn site_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elemgraph_core::{Value, ValueMap};

    fn instance(type_name: &str, name: &str, refs: &[(&str, ElemId)]) -> InstanceElement {
        let mut value = ValueMap::new();
        for (field, target) in refs {
            value.insert(field.to_string(), Value::reference(target.clone()));
        }
        InstanceElement::new("a", type_name, name, value)
    }

    #[test]
    fn test_only_nameable_targets_indexed() {
        let book = ElemId::instance("a", "book", "b1");
        let tool = ElemId::instance("a", "tool", "t1");
        let recipe = instance("recipe", "r1", &[("book", book.clone()), ("tool", tool.clone())]);

        let nameable: HashSet<ElemId> = [book.clone()].into_iter().collect();
        let index = ReferenceIndex::build([&recipe], &nameable);

        assert_eq!(index.len(), 1);
        assert_eq!(index.referrers(&book).len(), 1);
        assert!(index.referrers(&tool).is_empty());
        assert_eq!(index.referrers(&book)[0].path.to_string(), "value.book");
    }

    #[test]
    fn test_nested_targets_bucket_under_top_level() {
        let book = ElemId::instance("a", "book", "b1");
        let nested = book.create_nested_id(&["chapters", "0"]);
        let recipe = instance("recipe", "r1", &[("chapter", nested.clone())]);

        let nameable: HashSet<ElemId> = [book.clone()].into_iter().collect();
        let index = ReferenceIndex::build([&recipe], &nameable);

        let sites = index.referrers(&book);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].target, nested);
    }

    #[test]
    fn test_bucket_order_follows_input() {
        let b1 = ElemId::instance("a", "book", "b1");
        let b2 = ElemId::instance("a", "book", "b2");
        let first = instance("recipe", "r1", &[("x", b2.clone()), ("y", b1.clone())]);
        let second = instance("recipe", "r2", &[("x", b1.clone())]);

        let nameable: HashSet<ElemId> = [b1.clone(), b2.clone()].into_iter().collect();
        let index = ReferenceIndex::build([&first, &second], &nameable);

        let targets: Vec<&ElemId> = index.targets().collect();
        assert_eq!(targets, vec![&b2, &b1]);
        let sources: Vec<&str> = index.referrers(&b1).iter().map(|s| s.source.name()).collect();
        assert_eq!(sources, vec!["r1", "r2"]);
        assert_eq!(index.site_count(), 3);
    }
}
