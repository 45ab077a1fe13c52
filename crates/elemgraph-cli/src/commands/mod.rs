//! CLI command implementations.

pub mod config;
pub mod index;
pub mod refs;
pub mod resolve;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use elemgraph_core::ElementGraph;

/// Read and parse a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load an element graph document.
pub fn load_graph(path: &Path) -> Result<ElementGraph> {
    let graph: ElementGraph = read_json(path)?;
    tracing::debug!(
        path = %path.display(),
        elements = graph.element_count(),
        instances = graph.instance_count(),
        "Loaded graph"
    );
    Ok(graph)
}
