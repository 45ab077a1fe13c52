//! Incrementally maintained secondary indexes over element changes.
//!
//! ## Core Concepts
//!
//! - **RemoteMap**: ordered string-keyed store with batched, all-or-nothing calls
//! - **ElementsSource**: the full current element set, used for rebuilds
//! - **Changed-at index**: `_changed_at` value to the ids of the elements carrying it
//!
//! ## Example
//!
//! ```
//! use elemgraph_core::{
//!     annotations, Change, ElemId, ElementGraph, InstanceElement, Value, ValueMap,
//! };
//! use elemgraph_index::{ChangedAtIndex, InMemoryRemoteMap};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let book = InstanceElement::new("lib", "book", "b1", ValueMap::new())
//!     .with_annotation(annotations::CHANGED_AT, Value::from("2024-03-01"));
//! let graph = ElementGraph::new(vec![book.clone().into()]);
//!
//! let index = ChangedAtIndex::new(InMemoryRemoteMap::<Vec<ElemId>>::new());
//! let versions: InMemoryRemoteMap<u32> = InMemoryRemoteMap::new();
//! index
//!     .update(&[Change::addition(book.into())], &versions, &graph, true)
//!     .await
//!     .unwrap();
//!
//! let ids = index.ids_at("2024-03-01").await.unwrap();
//! assert_eq!(ids[0].full_name(), "lib.book.instance.b1");
//! # });
//! ```

pub mod changed_at;
mod elements_source;
mod error;
pub mod remote_map;

pub use changed_at::{
    changed_at_entries, update_changed_at_index, ChangedAtIndex, IndexUpdate,
    CHANGED_AT_INDEX_KEY, CHANGED_AT_INDEX_VERSION,
};
pub use elements_source::{all_elements_changes, ElementsSource};
pub use error::{IndexError, IndexResult};
pub use remote_map::{FileRemoteMap, InMemoryRemoteMap, RemoteMap, SELF_DIR};
