//! Field and annotation values, including references between elements.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::elem_id::ElemId;

/// Ordered mapping of names to values, used for instance values and annotations.
pub type ValueMap = IndexMap<String, Value>;

/// A directed pointer to another element.
///
/// References are stored by identifier, never by ownership, so reference cycles
/// between elements are representable. The optional `value` is a resolved
/// snapshot of the target and is never walked as part of the referencing element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceExpression {
    /// Identifier of the target element (possibly nested).
    #[serde(rename = "$ref")]
    pub elem_id: ElemId,
    /// Resolved snapshot of the target's value.
    #[serde(rename = "$value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Box<Value>>,
}

impl ReferenceExpression {
    /// Create an unresolved reference.
    pub fn new(elem_id: ElemId) -> Self {
        Self {
            elem_id,
            value: None,
        }
    }

    /// Create a reference carrying a resolved snapshot of its target.
    pub fn with_value(elem_id: ElemId, value: Value) -> Self {
        Self {
            elem_id,
            value: Some(Box::new(value)),
        }
    }

    /// Identifier of the top-level element this reference points into.
    pub fn top_level_target(&self) -> ElemId {
        self.elem_id.create_top_level_parent_id().0
    }
}

/// A value held in an element field or annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Pointer to another element.
    Reference(ReferenceExpression),
    /// Absent / null value.
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    /// Reference to the given element.
    pub fn reference(elem_id: ElemId) -> Self {
        Value::Reference(ReferenceExpression::new(elem_id))
    }

    /// Get the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the reference, if this is a reference.
    pub fn as_reference(&self) -> Option<&ReferenceExpression> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Child value under a single path segment.
    pub fn child(&self, segment: &PathSegment) -> Option<&Value> {
        match (self, segment) {
            (Value::Map(map), PathSegment::Key(key)) => map.get(key),
            (Value::List(items), PathSegment::Index(i)) => items.get(*i),
            (Value::List(items), PathSegment::Key(key)) => {
                key.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    }

    /// Mutable child value under a single path segment.
    pub fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut Value> {
        match (self, segment) {
            (Value::Map(map), PathSegment::Key(key)) => map.get_mut(key),
            (Value::List(items), PathSegment::Index(i)) => items.get_mut(*i),
            _ => None,
        }
    }

    /// Render this value as a naming fragment.
    ///
    /// Strings are used as-is, numbers and booleans in their display form,
    /// null as the empty string, references as the target's name, and
    /// structured values as compact JSON.
    pub fn to_name_fragment(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Reference(r) => r.elem_id.name().to_string(),
            Value::List(_) | Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Visit every reference below this value in pre-order.
    ///
    /// Reference snapshots are not descended into.
    pub fn walk_references<F>(&self, path: &mut Vec<PathSegment>, visit: &mut F)
    where
        F: FnMut(&ReferenceExpression, &[PathSegment]),
    {
        match self {
            Value::Reference(r) => visit(r, path),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    item.walk_references(path, visit);
                    path.pop();
                }
            }
            Value::Map(map) => {
                for (key, item) in map {
                    path.push(PathSegment::Key(key.clone()));
                    item.walk_references(path, visit);
                    path.pop();
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ReferenceExpression> for Value {
    fn from(r: ReferenceExpression) -> Self {
        Value::Reference(r)
    }
}

/// Look up a dotted path (`a.b.0`) in a value map.
pub fn get_by_path<'a>(map: &'a ValueMap, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = map.get(first)?;
    for part in parts {
        current = current.child(&PathSegment::Key(part.to_string()))?;
    }
    Some(current)
}

/// One step of a path into a value tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Which part of an instance a [`ValuePath`] starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSection {
    /// Field values.
    Value,
    /// Annotation values.
    Annotation,
}

/// Location of a value inside an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePath {
    pub section: ValueSection,
    pub segments: Vec<PathSegment>,
}

impl ValuePath {
    pub fn new(section: ValueSection, segments: Vec<PathSegment>) -> Self {
        Self { section, segments }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = match self.section {
            ValueSection::Value => "value",
            ValueSection::Annotation => "annotation",
        };
        f.write_str(section)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_fragments() {
        assert_eq!(Value::from("abc").to_name_fragment(), "abc");
        assert_eq!(Value::from(123).to_name_fragment(), "123");
        assert_eq!(Value::from(true).to_name_fragment(), "true");
        assert_eq!(Value::Null.to_name_fragment(), "");

        let r = Value::reference(ElemId::instance("a", "t", "target"));
        assert_eq!(r.to_name_fragment(), "target");
    }

    #[test]
    fn test_deserialize_reference_vs_map() {
        let v: Value = serde_json::from_value(json!({"$ref": "a.t.instance.x"})).unwrap();
        assert!(v.as_reference().is_some());

        let v: Value =
            serde_json::from_value(json!({"$ref": "a.t.instance.x", "other": 1})).unwrap();
        assert!(matches!(v, Value::Map(_)));

        let v: Value = serde_json::from_value(json!([1, "two", null])).unwrap();
        assert!(matches!(v, Value::List(ref items) if items.len() == 3));
    }

    #[test]
    fn test_get_by_path() {
        let map: ValueMap = serde_json::from_value(json!({
            "outer": {"inner": [10, 20]},
            "flat": "x"
        }))
        .unwrap();

        assert_eq!(get_by_path(&map, "flat"), Some(&Value::from("x")));
        assert_eq!(get_by_path(&map, "outer.inner.1"), Some(&Value::from(20)));
        assert!(get_by_path(&map, "outer.missing").is_none());
    }

    #[test]
    fn test_walk_skips_reference_snapshots() {
        let inner = Value::reference(ElemId::instance("a", "t", "hidden"));
        let outer = Value::List(vec![
            Value::Reference(ReferenceExpression::with_value(
                ElemId::instance("a", "t", "visible"),
                Value::List(vec![inner]),
            )),
        ]);

        let mut seen = Vec::new();
        outer.walk_references(&mut Vec::new(), &mut |r, path| {
            seen.push((r.elem_id.name().to_string(), path.to_vec()));
        });

        assert_eq!(seen, vec![("visible".to_string(), vec![PathSegment::Index(0)])]);
    }
}
