//! Typed elements: type definitions and instances.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::elem_id::{ElemId, ElemIdType};
use crate::value::{PathSegment, ReferenceExpression, Value, ValueMap, ValuePath, ValueSection};

/// Well-known annotation names.
pub mod annotations {
    /// List of references to the parent instances of an instance.
    pub const PARENT: &str = "_parent";
    /// Timestamp-like value recording the last change to an element.
    pub const CHANGED_AT: &str = "_changed_at";
}

/// A field declared on a type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Identifier of the field (`adapter.type.field.name`).
    pub elem_id: ElemId,
    /// Field annotations.
    #[serde(default)]
    pub annotations: ValueMap,
}

impl FieldDefinition {
    pub fn new(parent: &ElemId, name: &str) -> Self {
        Self {
            elem_id: ElemId::field(parent.adapter(), parent.type_name(), name),
            annotations: ValueMap::new(),
        }
    }
}

/// Declaration of a type: its fields and type-level annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Identifier of the type (`adapter.type`).
    pub elem_id: ElemId,
    /// Declared fields, in declaration order.
    #[serde(default)]
    pub fields: IndexMap<String, FieldDefinition>,
    /// Type annotations.
    #[serde(default)]
    pub annotations: ValueMap,
}

impl TypeDefinition {
    pub fn new(adapter: &str, type_name: &str) -> Self {
        Self {
            elem_id: ElemId::type_id(adapter, type_name),
            fields: IndexMap::new(),
            annotations: ValueMap::new(),
        }
    }

    /// Declare a field (builder style).
    pub fn with_field(mut self, name: &str) -> Self {
        let field = FieldDefinition::new(&self.elem_id, name);
        self.fields.insert(name.to_string(), field);
        self
    }
}

/// A concrete data element of a given type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceElement {
    /// Current identifier; rewritten in place by naming.
    pub elem_id: ElemId,
    /// Field values.
    #[serde(default)]
    pub value: ValueMap,
    /// Annotation values, including `_parent`.
    #[serde(default)]
    pub annotations: ValueMap,
}

impl InstanceElement {
    pub fn new(adapter: &str, type_name: &str, name: &str, value: ValueMap) -> Self {
        Self {
            elem_id: ElemId::instance(adapter, type_name, name),
            value,
            annotations: ValueMap::new(),
        }
    }

    /// Identifier of the owning type.
    pub fn type_id(&self) -> ElemId {
        self.elem_id.owning_type_id()
    }

    /// Name of the owning type.
    pub fn type_name(&self) -> &str {
        self.elem_id.type_name()
    }

    /// Set a single annotation (builder style).
    pub fn with_annotation(mut self, name: &str, value: Value) -> Self {
        self.annotations.insert(name.to_string(), value);
        self
    }

    /// Set the parent references (builder style).
    pub fn with_parents(self, parents: Vec<ElemId>) -> Self {
        let refs = parents.into_iter().map(Value::reference).collect();
        self.with_annotation(annotations::PARENT, Value::List(refs))
    }

    /// Parent references, in declared order.
    pub fn parents(&self) -> Vec<&ReferenceExpression> {
        match self.annotations.get(annotations::PARENT) {
            Some(Value::List(items)) => items.iter().filter_map(Value::as_reference).collect(),
            Some(Value::Reference(r)) => vec![r],
            _ => Vec::new(),
        }
    }

    /// Visit every reference in the values, then in the annotations.
    pub fn walk_references<F>(&self, mut visit: F)
    where
        F: FnMut(&ReferenceExpression, ValuePath),
    {
        for (section, map) in [
            (ValueSection::Value, &self.value),
            (ValueSection::Annotation, &self.annotations),
        ] {
            for (key, value) in map {
                let mut path = vec![PathSegment::Key(key.clone())];
                value.walk_references(&mut path, &mut |r, segments| {
                    visit(r, ValuePath::new(section, segments.to_vec()))
                });
            }
        }
    }

    /// Value stored at `path`.
    pub fn value_at(&self, path: &ValuePath) -> Option<&Value> {
        let (first, rest) = path.segments.split_first()?;
        let root = match path.section {
            ValueSection::Value => &self.value,
            ValueSection::Annotation => &self.annotations,
        };
        let PathSegment::Key(key) = first else {
            return None;
        };
        let mut current = root.get(key)?;
        for segment in rest {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Mutable value stored at `path`.
    pub fn value_at_mut(&mut self, path: &ValuePath) -> Option<&mut Value> {
        let (first, rest) = path.segments.split_first()?;
        let root = match path.section {
            ValueSection::Value => &mut self.value,
            ValueSection::Annotation => &mut self.annotations,
        };
        let PathSegment::Key(key) = first else {
            return None;
        };
        let mut current = root.get_mut(key)?;
        for segment in rest {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }
}

/// Any element of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Type(TypeDefinition),
    Instance(InstanceElement),
}

impl Element {
    /// Identifier of the element.
    pub fn elem_id(&self) -> &ElemId {
        match self {
            Element::Type(t) => &t.elem_id,
            Element::Instance(i) => &i.elem_id,
        }
    }

    /// Element annotations.
    pub fn annotations(&self) -> &ValueMap {
        match self {
            Element::Type(t) => &t.annotations,
            Element::Instance(i) => &i.annotations,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceElement> {
        match self {
            Element::Instance(i) => Some(i),
            Element::Type(_) => None,
        }
    }

    pub fn as_instance_mut(&mut self) -> Option<&mut InstanceElement> {
        match self {
            Element::Instance(i) => Some(i),
            Element::Type(_) => None,
        }
    }

    pub fn is_instance(&self) -> bool {
        self.elem_id().id_type() == ElemIdType::Instance
    }
}

impl From<InstanceElement> for Element {
    fn from(instance: InstanceElement) -> Self {
        Element::Instance(instance)
    }
}

impl From<TypeDefinition> for Element {
    fn from(definition: TypeDefinition) -> Self {
        Element::Type(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recipe() -> InstanceElement {
        let value: ValueMap = serde_json::from_value(json!({
            "name": "r1",
            "book_id": {"$ref": "myAdapter.book.instance.rootBook"},
            "steps": [{"uses": {"$ref": "myAdapter.tool.instance.knife"}}]
        }))
        .unwrap();
        InstanceElement::new("myAdapter", "recipe", "r1", value)
            .with_parents(vec![ElemId::instance("myAdapter", "book", "rootBook")])
    }

    #[test]
    fn test_parents() {
        let instance = recipe();
        let parents = instance.parents();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].elem_id.name(), "rootBook");
    }

    #[test]
    fn test_walk_references_order() {
        let instance = recipe();
        let mut paths = Vec::new();
        instance.walk_references(|_, path| paths.push(path.to_string()));
        assert_eq!(
            paths,
            vec![
                "value.book_id",
                "value.steps.0.uses",
                "annotation._parent.0",
            ]
        );
    }

    #[test]
    fn test_value_at_mut_rewrites_in_place() {
        let mut instance = recipe();
        let path = ValuePath::new(
            ValueSection::Value,
            vec![
                PathSegment::Key("steps".into()),
                PathSegment::Index(0),
                PathSegment::Key("uses".into()),
            ],
        );

        *instance.value_at_mut(&path).unwrap() = Value::from("replaced");
        assert_eq!(instance.value_at(&path), Some(&Value::from("replaced")));
    }

    #[test]
    fn test_type_field_ids() {
        let definition = TypeDefinition::new("myAdapter", "book").with_field("id");
        assert_eq!(
            definition.fields["id"].elem_id.full_name(),
            "myAdapter.book.field.id"
        );
    }

    #[test]
    fn test_element_serde_tag() {
        let element: Element = serde_json::from_value(json!({
            "kind": "type",
            "elem_id": "myAdapter.book",
            "fields": {
                "id": {"elem_id": "myAdapter.book.field.id"}
            }
        }))
        .unwrap();
        assert!(!element.is_instance());
        assert_eq!(element.elem_id().full_name(), "myAdapter.book");
    }
}
