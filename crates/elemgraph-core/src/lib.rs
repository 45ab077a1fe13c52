//! Core domain types shared across the elemgraph workspace.
//!
//! The graph is a flat collection of [`Element`]s. Elements point at each other
//! through [`ReferenceExpression`]s that carry an [`ElemId`], never an owning
//! pointer, so the graph may contain cycles.

mod change;
mod elem_id;
mod element;
mod error;
mod graph;
mod value;

pub use change::Change;
pub use elem_id::{ElemId, ElemIdType, NAME_SEPARATOR};
pub use element::{annotations, Element, FieldDefinition, InstanceElement, TypeDefinition};
pub use error::{CoreError, CoreResult};
pub use graph::ElementGraph;
pub use value::{
    get_by_path, PathSegment, ReferenceExpression, Value, ValueMap, ValuePath, ValueSection,
};
