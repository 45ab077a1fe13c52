//! Index command implementation.
//!
//! Maintains the file-backed changed-at index under `<store>/.self/index/`.

use std::path::Path;

use anyhow::{Context, Result};

use elemgraph_core::{Change, ElemId};
use elemgraph_index::{ChangedAtIndex, FileRemoteMap, CHANGED_AT_INDEX_KEY};

use super::{load_graph, read_json};

/// Namespace of the version map.
const VERSIONS_NAMESPACE: &str = "index_versions";

fn open_index(store_dir: &Path) -> ChangedAtIndex<FileRemoteMap<Vec<ElemId>>> {
    ChangedAtIndex::new(FileRemoteMap::new(store_dir, CHANGED_AT_INDEX_KEY))
}

/// Apply a change set to the index.
pub async fn apply(
    store_dir: &Path,
    changes_path: &Path,
    graph_path: &Path,
    cache_is_valid: bool,
) -> Result<()> {
    let changes: Vec<Change> = read_json(changes_path)?;
    let graph = load_graph(graph_path)?;

    let index = open_index(store_dir);
    let versions: FileRemoteMap<u32> = FileRemoteMap::new(store_dir, VERSIONS_NAMESPACE);
    let update = index
        .update(&changes, &versions, &graph, cache_is_valid)
        .await
        .context("Failed to update changed-at index")?;

    if update.rebuilt {
        println!("Rebuilt index from {} elements", graph.element_count());
    } else {
        println!("Applied {} changes", changes.len());
    }
    println!(
        "{} keys written, {} keys deleted ({})",
        update.keys_set,
        update.keys_deleted,
        index.map().path().display()
    );
    Ok(())
}

/// Print indexed ids, optionally restricted to a key range.
pub async fn query(store_dir: &Path, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let index = open_index(store_dir);
    let entries = index
        .range(from, to)
        .await
        .context("Failed to read changed-at index")?;

    for (key, ids) in &entries {
        let ids: Vec<String> = ids.iter().map(ElemId::full_name).collect();
        println!("{}: {}", key, ids.join(", "));
    }
    if entries.is_empty() {
        println!("(no entries)");
    }
    Ok(())
}
