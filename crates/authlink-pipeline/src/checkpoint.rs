//! File-backed checkpoint and allow-list
//!
//! The checkpoint file holds a single decimal id. The allow-list file
//! holds one id per line. A missing file means "no checkpoint" or "no
//! allow-list" respectively; unreadable content is `StoreError::InvalidData`.

use async_trait::async_trait;
use authlink_core::catalog::parse_id_list;
use authlink_core::{AllowListSource, CheckpointStore, StoreError, StoreResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

async fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Transport(format!("{}: {}", path.display(), e))),
    }
}

/// Checkpoint persisted in a text file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn read(&self) -> StoreResult<Option<u64>> {
        let Some(text) = read_optional(&self.path).await? else {
            debug!(path = %self.path.display(), "No checkpoint file");
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse::<u64>().map(Some).map_err(|_| {
            StoreError::InvalidData(format!(
                "checkpoint {} contains '{}'",
                self.path.display(),
                text
            ))
        })
    }

    async fn write(&self, id: u64) -> StoreResult<()> {
        tokio::fs::write(&self.path, id.to_string())
            .await
            .map_err(|e| StoreError::Transport(format!("{}: {}", self.path.display(), e)))
    }
}

/// Allow-list read from a text file on every load
#[derive(Debug, Clone)]
pub struct FileAllowList {
    path: PathBuf,
}

impl FileAllowList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AllowListSource for FileAllowList {
    async fn load(&self) -> StoreResult<Option<Vec<u64>>> {
        let Some(text) = read_optional(&self.path).await? else {
            return Ok(None);
        };
        parse_id_list(&text)
            .map(Some)
            .map_err(|reason| StoreError::InvalidData(format!("{}: {}", self.path.display(), reason)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_checkpoint_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoint"));
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn checkpoint_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint");

        FileCheckpointStore::new(&path).write(1234).await.unwrap();
        assert_eq!(FileCheckpointStore::new(&path).read().await.unwrap(), Some(1234));
    }

    #[tokio::test]
    async fn corrupt_checkpoint_is_invalid_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint");
        std::fs::write(&path, "12ab").unwrap();

        let result = FileCheckpointStore::new(&path).read().await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn allow_list_is_sorted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids");
        std::fs::write(&path, "30\n10\n\n20\n").unwrap();

        let ids = FileAllowList::new(&path).load().await.unwrap();
        assert_eq!(ids, Some(vec![10, 20, 30]));
    }

    #[tokio::test]
    async fn missing_allow_list_allows_everything() {
        let dir = TempDir::new().unwrap();
        let ids = FileAllowList::new(dir.path().join("absent")).load().await.unwrap();
        assert_eq!(ids, None);
    }
}
