//! Hierarchical element identifiers.
//!
//! An [`ElemId`] names a type, a field of a type, or an instance, optionally
//! followed by a nested path into that element's values:
//!
//! ```text
//! myAdapter.book                          type
//! myAdapter.book.field.id                 field of a type
//! myAdapter.book.instance.rootBook        instance
//! myAdapter.book.instance.rootBook.tags.0 nested value of an instance
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, CoreResult};

/// Separator between the parts of a full name.
pub const NAME_SEPARATOR: char = '.';

/// Kind of element an identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElemIdType {
    /// A type definition.
    Type,
    /// A field declared on a type definition.
    Field,
    /// A concrete instance.
    Instance,
    /// An annotation type declared on a type definition.
    Annotation,
    /// An annotation value set on a type definition.
    Attr,
}

impl ElemIdType {
    /// The keyword used for this kind inside a full name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElemIdType::Type => "type",
            ElemIdType::Field => "field",
            ElemIdType::Instance => "instance",
            ElemIdType::Annotation => "annotation",
            ElemIdType::Attr => "attr",
        }
    }
}

impl FromStr for ElemIdType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "type" => Ok(ElemIdType::Type),
            "field" => Ok(ElemIdType::Field),
            "instance" => Ok(ElemIdType::Instance),
            "annotation" => Ok(ElemIdType::Annotation),
            "attr" => Ok(ElemIdType::Attr),
            other => Err(CoreError::UnknownIdType(other.to_string())),
        }
    }
}

impl fmt::Display for ElemIdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Globally unique, hierarchical key of an element.
///
/// Equality and ordering are structural. The serialized form is the full name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElemId {
    adapter: String,
    type_name: String,
    id_type: ElemIdType,
    name_parts: Vec<String>,
}

impl ElemId {
    /// Create an identifier from its parts.
    pub fn new(
        adapter: impl Into<String>,
        type_name: impl Into<String>,
        id_type: ElemIdType,
        name_parts: Vec<String>,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            type_name: type_name.into(),
            id_type,
            name_parts,
        }
    }

    /// Identifier of a type definition.
    pub fn type_id(adapter: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(adapter, type_name, ElemIdType::Type, Vec::new())
    }

    /// Identifier of a top-level instance.
    pub fn instance(
        adapter: impl Into<String>,
        type_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(adapter, type_name, ElemIdType::Instance, vec![name.into()])
    }

    /// Identifier of a field declared on a type.
    pub fn field(
        adapter: impl Into<String>,
        type_name: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::new(adapter, type_name, ElemIdType::Field, vec![field.into()])
    }

    /// Adapter (namespace) this element belongs to.
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// Name of the type this identifier lives under.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Kind of element.
    pub fn id_type(&self) -> ElemIdType {
        self.id_type
    }

    /// Name parts after the id type keyword.
    pub fn name_parts(&self) -> &[String] {
        &self.name_parts
    }

    /// Last component of the full name.
    pub fn name(&self) -> &str {
        self.name_parts
            .last()
            .map(String::as_str)
            .unwrap_or(&self.type_name)
    }

    /// Identifier of the type that owns this element.
    pub fn owning_type_id(&self) -> ElemId {
        ElemId::type_id(self.adapter.clone(), self.type_name.clone())
    }

    /// Extend this identifier with a nested path.
    ///
    /// Paths below a type id address its annotation values, so they are
    /// written in the `attr` form.
    pub fn create_nested_id<S: AsRef<str>>(&self, parts: &[S]) -> ElemId {
        let mut nested = self.clone();
        if nested.id_type == ElemIdType::Type && !parts.is_empty() {
            nested.id_type = ElemIdType::Attr;
        }
        nested
            .name_parts
            .extend(parts.iter().map(|p| p.as_ref().to_string()));
        nested
    }

    /// Split into the top-level element id and the path below it.
    pub fn create_top_level_parent_id(&self) -> (ElemId, Vec<String>) {
        match self.id_type {
            ElemIdType::Instance if !self.name_parts.is_empty() => {
                let top = ElemId::new(
                    self.adapter.clone(),
                    self.type_name.clone(),
                    ElemIdType::Instance,
                    vec![self.name_parts[0].clone()],
                );
                (top, self.name_parts[1..].to_vec())
            }
            ElemIdType::Type => (self.owning_type_id(), self.name_parts.clone()),
            _ => {
                let mut path = vec![self.id_type.as_str().to_string()];
                path.extend(self.name_parts.iter().cloned());
                (self.owning_type_id(), path)
            }
        }
    }

    /// Replace the top-level prefix `from` with `to`, keeping any nested path.
    ///
    /// Returns `None` when this identifier does not live under `from`.
    pub fn rebase(&self, from: &ElemId, to: &ElemId) -> Option<ElemId> {
        let (top, path) = self.create_top_level_parent_id();
        if &top != from {
            return None;
        }
        if self.id_type == ElemIdType::Instance || path.is_empty() {
            return Some(to.create_nested_id(&path));
        }
        // Field/annotation ids hang off a type: re-attach under the new type name.
        Some(ElemId::new(
            to.adapter.clone(),
            to.type_name.clone(),
            self.id_type,
            self.name_parts.clone(),
        ))
    }

    /// Dot-joined full name.
    pub fn full_name(&self) -> String {
        self.to_string()
    }

    /// Parse a full name produced by [`ElemId::full_name`].
    pub fn from_full_name(full_name: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidElemId {
            full_name: full_name.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = full_name.split(NAME_SEPARATOR).collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(invalid("expected at least <adapter>.<type>"));
        }

        if parts.len() == 2 {
            return Ok(ElemId::type_id(parts[0], parts[1]));
        }

        let id_type: ElemIdType = parts[2].parse()?;
        if id_type == ElemIdType::Type {
            return Err(invalid("type ids have no explicit id type"));
        }
        if parts.len() < 4 {
            return Err(invalid("missing name after id type"));
        }

        Ok(ElemId::new(
            parts[0],
            parts[1],
            id_type,
            parts[3..].iter().map(|p| p.to_string()).collect(),
        ))
    }
}

impl fmt::Display for ElemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.adapter, NAME_SEPARATOR, self.type_name)?;
        if self.id_type != ElemIdType::Type {
            write!(f, "{}{}", NAME_SEPARATOR, self.id_type)?;
        }
        for part in &self.name_parts {
            write!(f, "{}{}", NAME_SEPARATOR, part)?;
        }
        Ok(())
    }
}

impl FromStr for ElemId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        ElemId::from_full_name(s)
    }
}

impl Serialize for ElemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full_name())
    }
}

impl<'de> Deserialize<'de> for ElemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let full_name = String::deserialize(deserializer)?;
        ElemId::from_full_name(&full_name).map_err(serde::de::Error::custom)
    }
}
