//! Resolve command implementation.
//!
//! Runs the naming filter over a graph document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use elemgraph_naming::{NamingConfig, ReferencedInstanceNames};

use super::load_graph;

/// Rename the graph at `path` and print or write the result.
pub fn execute(path: &Path, naming: NamingConfig, output: Option<PathBuf>) -> Result<()> {
    let mut graph = load_graph(path)?;
    let filter = ReferencedInstanceNames::new(naming);
    let report = filter.run(&mut graph.elements)?;

    let json = serde_json::to_string_pretty(&graph)?;
    let summary = format!(
        "Renamed {} instances, rewrote {} references ({} suppressed, {} cyclic, {} duplicate ids, {} missing targets)",
        report.renamed.len(),
        report.rewritten_references,
        report.suppressed.len(),
        report.cyclic.len(),
        report.duplicates.len(),
        report.missing_targets.len(),
    );

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            for (from, to) in &report.renamed {
                println!("{} -> {}", from, to);
            }
            println!("{}", summary);
            println!("Wrote {}", output_path.display());
        }
        None => {
            println!("{}", json);
            eprintln!("{}", summary);
        }
    }

    Ok(())
}
