//! Reference-driven naming for element graphs.
//!
//! Fetched instances often carry opaque names. This crate renames instances of
//! configured types from their own id fields and from the names of the
//! instances they reference, then rewrites every reference to the renamed
//! instances so the graph stays consistent.
//!
//! ## Example
//!
//! ```
//! use elemgraph_core::{ElemId, Element, InstanceElement, Value, ValueMap};
//! use elemgraph_naming::{resolve_names, NamingConfig, TypeNamingConfig};
//!
//! let mut root = ValueMap::new();
//! root.insert("id".into(), Value::from(123));
//! root.insert("parent_book_id".into(), Value::from("ROOT"));
//!
//! let mut child = ValueMap::new();
//! child.insert("id".into(), Value::from(456));
//! child.insert(
//!     "parent_book_id".into(),
//!     Value::reference(ElemId::instance("lib", "book", "root")),
//! );
//!
//! let mut elements: Vec<Element> = vec![
//!     InstanceElement::new("lib", "book", "root", root).into(),
//!     InstanceElement::new("lib", "book", "child", child).into(),
//! ];
//!
//! let config = NamingConfig::default()
//!     .with_type("book", TypeNamingConfig::new(["id", "&parent_book_id"]));
//! resolve_names(&mut elements, &config).unwrap();
//!
//! assert_eq!(elements[0].elem_id().name(), "123_ROOT");
//! assert_eq!(elements[1].elem_id().name(), "456_123_ROOT");
//! ```

pub mod config;
mod error;
mod filter;
mod reference_index;
mod resolver;

pub use config::{IdField, NamingConfig, TypeNamingConfig, REFERENCE_MARKER};
pub use error::{NamingError, NamingResult};
pub use filter::{FetchFilter, ReferencedInstanceNames};
pub use reference_index::{ReferenceIndex, ReferenceSite};
pub use resolver::{
    resolve_names, NameResolver, NamingReport, ID_SEPARATOR, PARENT_SEPARATOR,
};
