//! Refs command implementation.
//!
//! Prints the reference index of a graph document.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use elemgraph_core::ElemId;
use elemgraph_naming::{NamingConfig, ReferenceIndex};

use super::load_graph;

/// Print every nameable target with the places referencing it.
pub fn execute(path: &Path, naming: &NamingConfig, json: bool) -> Result<()> {
    let graph = load_graph(path)?;
    let targets: HashSet<ElemId> = graph
        .instances()
        .filter(|i| naming.is_nameable(i.type_name()))
        .map(|i| i.elem_id.clone())
        .collect();
    let index = ReferenceIndex::build(graph.instances(), &targets);

    if json {
        println!("{}", serde_json::to_string_pretty(&index)?);
        return Ok(());
    }

    for (target, sites) in index.iter() {
        println!("{} ({})", target, sites.len());
        for site in sites {
            println!("  <- {} at {}", site.source, site.path);
        }
    }
    println!(
        "{} targets, {} references ({} references in graph)",
        index.len(),
        index.site_count(),
        graph.reference_count()
    );
    Ok(())
}
