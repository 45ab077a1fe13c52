//! Secondary index from `_changed_at` values to the elements carrying them.
//!
//! The index is maintained incrementally from change sets. A version marker
//! stored next to it triggers a full rebuild from the element source when the
//! stored layout is out of date, and an invalid cache clears it before the
//! changes are applied.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, info_span, Instrument};

use elemgraph_core::{annotations, Change, ElemId, Element, Value, ValueMap};

use crate::elements_source::{all_elements_changes, ElementsSource};
use crate::error::IndexResult;
use crate::remote_map::RemoteMap;

/// Layout version of the changed-at index.
pub const CHANGED_AT_INDEX_VERSION: u32 = 3;

/// Key of the changed-at index in the version map.
pub const CHANGED_AT_INDEX_KEY: &str = "changed_at_index";

/// Summary of one update call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexUpdate {
    /// The index was cleared before applying changes.
    pub rebuilt: bool,
    /// Keys written with a non-empty id list.
    pub keys_set: usize,
    /// Keys deleted because no id is left under them.
    pub keys_deleted: usize,
}

fn changed_at_key(annotations: &ValueMap) -> Option<String> {
    match annotations.get(annotations::CHANGED_AT) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_name_fragment()),
    }
}

/// `(key, id)` pairs an element contributes to the index.
///
/// Type definitions also contribute each field carrying its own annotation,
/// under the field's id.
pub fn changed_at_entries(element: &Element) -> Vec<(String, ElemId)> {
    let mut entries = Vec::new();
    if let Element::Type(type_def) = element {
        for field in type_def.fields.values() {
            if let Some(key) = changed_at_key(&field.annotations) {
                entries.push((key, field.elem_id.clone()));
            }
        }
    }
    if let Some(key) = changed_at_key(element.annotations()) {
        entries.push((key, element.elem_id().clone()));
    }
    entries
}

fn touched_keys(changes: &[Change]) -> BTreeSet<String> {
    changes
        .iter()
        .flat_map(|change| change.before().into_iter().chain(change.after()))
        .flat_map(changed_at_entries)
        .map(|(key, _)| key)
        .collect()
}

fn add_entries(entries: Vec<(String, ElemId)>, state: &mut BTreeMap<String, BTreeSet<ElemId>>) {
    for (key, id) in entries {
        state.entry(key).or_default().insert(id);
    }
}

fn remove_entries(entries: Vec<(String, ElemId)>, state: &mut BTreeMap<String, BTreeSet<ElemId>>) {
    for (key, id) in entries {
        if let Some(ids) = state.get_mut(&key) {
            ids.remove(&id);
        }
    }
}

fn apply_change(change: &Change, state: &mut BTreeMap<String, BTreeSet<ElemId>>) {
    match change {
        Change::Addition { after } => add_entries(changed_at_entries(after), state),
        Change::Removal { before } => remove_entries(changed_at_entries(before), state),
        Change::Modification { before, after } => {
            let before: BTreeSet<_> = changed_at_entries(before).into_iter().collect();
            let after: BTreeSet<_> = changed_at_entries(after).into_iter().collect();
            if before == after {
                return;
            }
            remove_entries(before.difference(&after).cloned().collect(), state);
            add_entries(after.difference(&before).cloned().collect(), state);
        }
    }
}

async fn apply_changes(
    changes: &[Change],
    index: &dyn RemoteMap<Vec<ElemId>>,
) -> IndexResult<(usize, usize)> {
    let keys: Vec<String> = touched_keys(changes).into_iter().collect();
    if keys.is_empty() {
        return Ok((0, 0));
    }

    let stored = index.get_many(&keys).await?;
    let mut state: BTreeMap<String, BTreeSet<ElemId>> = keys
        .into_iter()
        .zip(stored)
        .filter_map(|(key, ids)| ids.map(|ids| (key, ids.into_iter().collect())))
        .collect();

    for change in changes {
        apply_change(change, &mut state);
    }

    let (empty, filled): (Vec<_>, Vec<_>) = state.into_iter().partition(|(_, ids)| ids.is_empty());
    let to_delete: Vec<String> = empty.into_iter().map(|(key, _)| key).collect();
    let to_set: Vec<(String, Vec<ElemId>)> = filled
        .into_iter()
        .map(|(key, ids)| (key, ids.into_iter().collect()))
        .collect();
    let counts = (to_set.len(), to_delete.len());

    index.set_all(to_set).await?;
    index.delete_all(&to_delete).await?;
    Ok(counts)
}

/// Bring the changed-at index up to date with `changes`.
///
/// When the stored version differs from [`CHANGED_AT_INDEX_VERSION`], the
/// changes are replaced by an addition for every element of `elements_source`.
/// On a version mismatch or when `cache_is_valid` is false the index is cleared
/// first. The version marker is written last, so a failed call can be retried
/// with the same arguments.
pub async fn update_changed_at_index(
    changes: &[Change],
    index: &dyn RemoteMap<Vec<ElemId>>,
    version_map: &dyn RemoteMap<u32>,
    elements_source: &dyn ElementsSource,
    cache_is_valid: bool,
) -> IndexResult<IndexUpdate> {
    let span = info_span!(
        "update_changed_at_index",
        changes = changes.len(),
        cache_is_valid = cache_is_valid,
    );
    update_inner(changes, index, version_map, elements_source, cache_is_valid)
        .instrument(span)
        .await
}

async fn update_inner(
    changes: &[Change],
    index: &dyn RemoteMap<Vec<ElemId>>,
    version_map: &dyn RemoteMap<u32>,
    elements_source: &dyn ElementsSource,
    cache_is_valid: bool,
) -> IndexResult<IndexUpdate> {
    let stored_version = version_map.get(CHANGED_AT_INDEX_KEY).await?;
    let version_matches = stored_version == Some(CHANGED_AT_INDEX_VERSION);

    let rebuild_changes;
    let relevant: &[Change] = if version_matches {
        changes
    } else {
        info!(
            stored = ?stored_version,
            expected = CHANGED_AT_INDEX_VERSION,
            "Changed-at index is out of date, re-indexing"
        );
        rebuild_changes = all_elements_changes(elements_source).await?;
        &rebuild_changes
    };
    if !cache_is_valid {
        info!("Cache is invalid, re-indexing changed-at index");
    }

    let rebuilt = !cache_is_valid || !version_matches;
    if rebuilt {
        index.clear().await?;
    }

    let (keys_set, keys_deleted) = apply_changes(relevant, index).await?;

    if rebuilt {
        version_map
            .set(CHANGED_AT_INDEX_KEY, CHANGED_AT_INDEX_VERSION)
            .await?;
    }

    debug!(keys_set, keys_deleted, rebuilt, "Updated changed-at index");
    Ok(IndexUpdate {
        rebuilt,
        keys_set,
        keys_deleted,
    })
}

/// Read and update access to a changed-at index.
///
/// Keys compare as strings, so ISO-8601 timestamps order chronologically.
pub struct ChangedAtIndex<M> {
    map: M,
}

impl<M> ChangedAtIndex<M>
where
    M: RemoteMap<Vec<ElemId>>,
{
    pub fn new(map: M) -> Self {
        Self { map }
    }

    /// The underlying store.
    pub fn map(&self) -> &M {
        &self.map
    }

    /// See [`update_changed_at_index`].
    pub async fn update(
        &self,
        changes: &[Change],
        version_map: &dyn RemoteMap<u32>,
        elements_source: &dyn ElementsSource,
        cache_is_valid: bool,
    ) -> IndexResult<IndexUpdate> {
        update_changed_at_index(changes, &self.map, version_map, elements_source, cache_is_valid)
            .await
    }

    /// Ids recorded under exactly `key`.
    pub async fn ids_at(&self, key: &str) -> IndexResult<Vec<ElemId>> {
        Ok(self.map.get(key).await?.unwrap_or_default())
    }

    /// Entries with `from <= key <= to`; open bounds when `None`.
    pub async fn range(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> IndexResult<Vec<(String, Vec<ElemId>)>> {
        Ok(self
            .map
            .entries()
            .await?
            .into_iter()
            .filter(|(key, _)| from.map_or(true, |f| key.as_str() >= f))
            .filter(|(key, _)| to.map_or(true, |t| key.as_str() <= t))
            .collect())
    }

    /// Entries with `from <= key <= to`.
    pub async fn ids_between(
        &self,
        from: &str,
        to: &str,
    ) -> IndexResult<Vec<(String, Vec<ElemId>)>> {
        self.range(Some(from), Some(to)).await
    }

    /// Entries with `key >= from`.
    pub async fn ids_since(&self, from: &str) -> IndexResult<Vec<(String, Vec<ElemId>)>> {
        self.range(Some(from), None).await
    }
}
