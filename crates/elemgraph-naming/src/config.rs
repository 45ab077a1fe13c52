//! Per-type naming configuration.
//!
//! Configuration is JSON with camelCase keys:
//!
//! ```json
//! {
//!   "types": {
//!     "book":   { "idFields": ["id", "&parent_book_id"] },
//!     "folder": { "idFields": ["name"], "extendsParentId": true }
//!   },
//!   "typeDefaults": { "idFields": ["id"] }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NamingError, NamingResult};

/// Prefix marking an id field whose reference target contributes its name.
pub const REFERENCE_MARKER: char = '&';

/// One entry of a type's `idFields` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IdField {
    /// Contributes the literal value of the field.
    Plain(String),
    /// Contributes the resolved name of the referenced instance.
    Reference(String),
}

impl IdField {
    /// Field path (dotted) this specifier reads.
    pub fn field_path(&self) -> &str {
        match self {
            IdField::Plain(path) | IdField::Reference(path) => path,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, IdField::Reference(_))
    }
}

impl From<String> for IdField {
    fn from(raw: String) -> Self {
        match raw.strip_prefix(REFERENCE_MARKER) {
            Some(path) => IdField::Reference(path.to_string()),
            None => IdField::Plain(raw),
        }
    }
}

impl From<&str> for IdField {
    fn from(raw: &str) -> Self {
        IdField::from(raw.to_string())
    }
}

impl From<IdField> for String {
    fn from(field: IdField) -> Self {
        field.to_string()
    }
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdField::Plain(path) => f.write_str(path),
            IdField::Reference(path) => write!(f, "{}{}", REFERENCE_MARKER, path),
        }
    }
}

/// Naming rules for a single type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeNamingConfig {
    /// Ordered id-field specifiers.
    #[serde(default)]
    pub id_fields: Vec<IdField>,
    /// Prefix the name with the first parent's resolved name.
    #[serde(default)]
    pub extends_parent_id: bool,
}

impl TypeNamingConfig {
    pub fn new<I, S>(id_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<IdField>,
    {
        Self {
            id_fields: id_fields.into_iter().map(Into::into).collect(),
            extends_parent_id: false,
        }
    }

    /// Builder: set `extends_parent_id`.
    pub fn extending_parent(mut self) -> Self {
        self.extends_parent_id = true;
        self
    }

    /// Whether names under this config depend on other instances.
    pub fn depends_on_references(&self) -> bool {
        self.extends_parent_id || self.id_fields.iter().any(IdField::is_reference)
    }

    fn validate(&self, type_name: &str) -> NamingResult<()> {
        if self.id_fields.is_empty() && !self.extends_parent_id {
            return Err(NamingError::invalid_config(type_name, "idFields is empty"));
        }
        for field in &self.id_fields {
            let path = field.field_path();
            if path.is_empty() {
                return Err(NamingError::invalid_config(
                    type_name,
                    format!("id field {:?} names no field", field.to_string()),
                ));
            }
            if path.split('.').any(str::is_empty) {
                return Err(NamingError::invalid_config(
                    type_name,
                    format!("id field {:?} has an empty path segment", path),
                ));
            }
        }
        Ok(())
    }
}

fn default_type_defaults() -> TypeNamingConfig {
    TypeNamingConfig::new(["id"])
}

/// Naming configuration for a whole workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingConfig {
    /// Explicit configuration per type name.
    #[serde(default)]
    pub types: HashMap<String, TypeNamingConfig>,
    /// Applies to types without explicit configuration.
    #[serde(default = "default_type_defaults")]
    pub type_defaults: TypeNamingConfig,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
            type_defaults: default_type_defaults(),
        }
    }
}

impl NamingConfig {
    pub fn new(type_defaults: TypeNamingConfig) -> Self {
        Self {
            types: HashMap::new(),
            type_defaults,
        }
    }

    /// Builder: add configuration for one type.
    pub fn with_type(mut self, type_name: impl Into<String>, config: TypeNamingConfig) -> Self {
        self.types.insert(type_name.into(), config);
        self
    }

    /// Configuration for a type, falling back to the defaults.
    pub fn config_for(&self, type_name: &str) -> &TypeNamingConfig {
        self.types.get(type_name).unwrap_or(&self.type_defaults)
    }

    /// Whether instances of this type get renamed.
    ///
    /// Only types whose names depend on other instances are renamed; all
    /// others keep the name they were fetched with.
    pub fn is_nameable(&self, type_name: &str) -> bool {
        self.config_for(type_name).depends_on_references()
    }

    /// Check that every type configuration can be evaluated.
    pub fn validate(&self) -> NamingResult<()> {
        self.type_defaults.validate("<typeDefaults>")?;
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        for name in names {
            self.types[name].validate(name)?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> NamingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> NamingResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| NamingError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "types": {
            "book": { "idFields": ["id", "&parent_book_id"] },
            "folder": { "idFields": ["name"], "extendsParentId": true },
            "group": { "idFields": ["name"] }
        },
        "typeDefaults": { "idFields": ["id"] }
    }"#;

    #[test]
    fn test_parse_id_fields() {
        let config = NamingConfig::from_json_str(SAMPLE).unwrap();
        let book = config.config_for("book");
        assert_eq!(
            book.id_fields,
            vec![
                IdField::Plain("id".into()),
                IdField::Reference("parent_book_id".into())
            ]
        );
        assert!(config.config_for("folder").extends_parent_id);
    }

    #[test]
    fn test_fallback_to_defaults() {
        let config = NamingConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.config_for("unknown"), &default_type_defaults());
    }

    #[test]
    fn test_nameable_types() {
        let config = NamingConfig::from_json_str(SAMPLE).unwrap();
        assert!(config.is_nameable("book"));
        assert!(config.is_nameable("folder"));
        assert!(!config.is_nameable("group"));
        assert!(!config.is_nameable("unknown"));
    }

    #[test]
    fn test_id_field_serializes_with_marker() {
        let json = serde_json::to_string(&TypeNamingConfig::new(["a", "&b"])).unwrap();
        assert_eq!(json, r#"{"idFields":["a","&b"],"extendsParentId":false}"#);
    }

    #[test]
    fn test_validate_rejects_empty_specifiers() {
        let config = NamingConfig::default().with_type("t", TypeNamingConfig::new(["&"]));
        assert!(matches!(
            config.validate(),
            Err(NamingError::InvalidConfig { ref type_name, .. }) if type_name == "t"
        ));

        let config = NamingConfig::default().with_type("t", TypeNamingConfig::new(["a..b"]));
        assert!(config.validate().is_err());

        let config = NamingConfig::default().with_type("t", TypeNamingConfig::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("naming.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = NamingConfig::load(&path).unwrap();
        assert_eq!(config.types.len(), 3);

        let missing = NamingConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(NamingError::ConfigRead { .. })));
    }
}
