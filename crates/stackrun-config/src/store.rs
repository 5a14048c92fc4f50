//! JSON-file-backed config store.

use async_trait::async_trait;
use stackrun_core::{ConfigStore, Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_STATE_FILE: &str = ".stackrun/state.json";

/// Config store persisting all keys in one JSON object on disk.
pub struct FileConfigStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!("{} is not a valid store file: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await?;
        debug!(key = %key, path = %self.path.display(), "Stored config value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("state.json"));
        assert_eq!(store.get("DEV_DO_K8S_STATE").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("nested/state.json"));

        store.set("DEV_DO_K8S_STATE", r#"{"a":1}"#).await.unwrap();
        store.set("PRD_DO_K8S_STATE", "{}").await.unwrap();
        store.set("DEV_DO_K8S_STATE", r#"{"b":2}"#).await.unwrap();

        assert_eq!(
            store.get("DEV_DO_K8S_STATE").await.unwrap().as_deref(),
            Some(r#"{"b":2}"#)
        );
        assert_eq!(store.get("PRD_DO_K8S_STATE").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileConfigStore::new(&path);
        assert!(matches!(store.get("X").await, Err(Error::Store(_))));
    }
}
