//! Persisted key-value stores backing secondary indexes.
//!
//! ## File Structure
//!
//! ```text
//! .self/
//! └── index/
//!     ├── changed_at_index.json   # One JSON object per namespace
//!     └── index_versions.json
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::IndexResult;

/// Name of the persistence folder.
pub const SELF_DIR: &str = ".self";

/// Subdirectory holding index namespaces.
const INDEX_DIR: &str = "index";

/// Ordered string-keyed store.
///
/// Batched calls apply fully or fail; a failed call leaves the store as it was.
#[async_trait]
pub trait RemoteMap<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> IndexResult<Option<V>>;

    /// Values for `keys`, in input order.
    async fn get_many(&self, keys: &[String]) -> IndexResult<Vec<Option<V>>>;

    async fn set(&self, key: &str, value: V) -> IndexResult<()>;

    async fn set_all(&self, entries: Vec<(String, V)>) -> IndexResult<()>;

    /// Delete `keys`. Absent keys are ignored.
    async fn delete_all(&self, keys: &[String]) -> IndexResult<()>;

    async fn clear(&self) -> IndexResult<()>;

    /// All keys in ascending order.
    async fn keys(&self) -> IndexResult<Vec<String>>;

    /// All entries in ascending key order.
    async fn entries(&self) -> IndexResult<Vec<(String, V)>>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryRemoteMap<V> {
    entries: RwLock<BTreeMap<String, V>>,
}

impl<V> InMemoryRemoteMap<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl<V> RemoteMap<V> for InMemoryRemoteMap<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> IndexResult<Option<V>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> IndexResult<Vec<Option<V>>> {
        let entries = self.entries.read().await;
        Ok(keys.iter().map(|k| entries.get(k).cloned()).collect())
    }

    async fn set(&self, key: &str, value: V) -> IndexResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_all(&self, entries: Vec<(String, V)>) -> IndexResult<()> {
        self.entries.write().await.extend(entries);
        Ok(())
    }

    async fn delete_all(&self, keys: &[String]) -> IndexResult<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> IndexResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn keys(&self) -> IndexResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn entries(&self) -> IndexResult<Vec<(String, V)>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Store persisted as one pretty-printed JSON object per namespace under
/// `<root>/.self/index/<namespace>.json`.
///
/// The file is loaded on first access and rewritten (temp file, then rename)
/// by every mutating call.
#[derive(Debug)]
pub struct FileRemoteMap<V> {
    namespace: String,
    path: PathBuf,
    state: Mutex<Option<BTreeMap<String, V>>>,
}

impl<V> FileRemoteMap<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a store for `namespace` in the given workspace root.
    pub fn new(root: impl AsRef<Path>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let path = root
            .as_ref()
            .join(SELF_DIR)
            .join(INDEX_DIR)
            .join(format!("{}.json", namespace));
        Self {
            namespace,
            path,
            state: Mutex::new(None),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> IndexResult<BTreeMap<String, V>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let entries: BTreeMap<String, V> = serde_json::from_slice(&bytes)?;
                debug!(
                    namespace = %self.namespace,
                    entries = entries.len(),
                    "Loaded index namespace"
                );
                Ok(entries)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, entries: &BTreeMap<String, V>) -> IndexResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(
            namespace = %self.namespace,
            entries = entries.len(),
            path = %self.path.display(),
            "Saved index namespace"
        );
        Ok(())
    }

    async fn read<R, F>(&self, f: F) -> IndexResult<R>
    where
        F: FnOnce(&BTreeMap<String, V>) -> R + Send,
        R: Send,
    {
        let mut guard = self.state.lock().await;
        let entries = match guard.take() {
            Some(entries) => entries,
            None => self.read_file().await?,
        };
        let result = f(&entries);
        *guard = Some(entries);
        Ok(result)
    }

    async fn update<F>(&self, f: F) -> IndexResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, V>) + Send,
    {
        let mut guard = self.state.lock().await;
        let mut entries = match guard.as_ref() {
            Some(entries) => entries.clone(),
            None => self.read_file().await?,
        };
        f(&mut entries);
        self.write_file(&entries).await?;
        *guard = Some(entries);
        Ok(())
    }
}

#[async_trait]
impl<V> RemoteMap<V> for FileRemoteMap<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> IndexResult<Option<V>> {
        self.read(|entries| entries.get(key).cloned()).await
    }

    async fn get_many(&self, keys: &[String]) -> IndexResult<Vec<Option<V>>> {
        self.read(|entries| keys.iter().map(|k| entries.get(k).cloned()).collect())
            .await
    }

    async fn set(&self, key: &str, value: V) -> IndexResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
        .await
    }

    async fn set_all(&self, new_entries: Vec<(String, V)>) -> IndexResult<()> {
        if new_entries.is_empty() {
            return Ok(());
        }
        self.update(|entries| entries.extend(new_entries)).await
    }

    async fn delete_all(&self, keys: &[String]) -> IndexResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.update(|entries| {
            for key in keys {
                entries.remove(key);
            }
        })
        .await
    }

    async fn clear(&self) -> IndexResult<()> {
        self.update(BTreeMap::clear).await
    }

    async fn keys(&self) -> IndexResult<Vec<String>> {
        self.read(|entries| entries.keys().cloned().collect()).await
    }

    async fn entries(&self) -> IndexResult<Vec<(String, V)>> {
        self.read(|entries| entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_batches() {
        let map: InMemoryRemoteMap<u32> = InMemoryRemoteMap::new();
        map.set_all(vec![("b".into(), 2), ("a".into(), 1), ("c".into(), 3)])
            .await
            .unwrap();
        map.delete_all(&["c".to_string(), "missing".to_string()])
            .await
            .unwrap();

        assert_eq!(map.keys().await.unwrap(), vec!["a", "b"]);
        assert_eq!(
            map.get_many(&["b".to_string(), "x".to_string(), "a".to_string()])
                .await
                .unwrap(),
            vec![Some(2), None, Some(1)]
        );

        map.clear().await.unwrap();
        assert!(map.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_map_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let map: FileRemoteMap<Vec<String>> = FileRemoteMap::new(dir.path(), "dates");
        assert_eq!(map.get("2024").await.unwrap(), None);

        map.set("2024", vec!["x".into()]).await.unwrap();
        assert!(map.path().ends_with(".self/index/dates.json"));
        assert!(map.path().exists());

        let reopened: FileRemoteMap<Vec<String>> = FileRemoteMap::new(dir.path(), "dates");
        assert_eq!(reopened.get("2024").await.unwrap(), Some(vec!["x".to_string()]));
        assert_eq!(reopened.namespace(), "dates");
    }

    #[tokio::test]
    async fn test_file_map_rejects_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let map: FileRemoteMap<u32> = FileRemoteMap::new(dir.path(), "broken");
        std::fs::create_dir_all(map.path().parent().unwrap()).unwrap();
        std::fs::write(map.path(), "not json").unwrap();

        assert!(map.get("k").await.is_err());
        assert!(map.set("k", 1).await.is_err());
        assert_eq!(std::fs::read_to_string(map.path()).unwrap(), "not json");
    }
}
