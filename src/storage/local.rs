use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::error::{AppError, Result};
use crate::models::ContentHash;
use crate::storage::{BlobReader, BlobStore};

/// Local file system blob store.
///
/// Layout: `<base>/sha256/ab/cd/<hash>`, where `ab` and `cd` are the first
/// two byte pairs of the hex digest.
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn get_full_path(&self, location: &str) -> Result<PathBuf> {
        let relative = Path::new(location);
        let well_formed = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(AppError::Storage(format!("Invalid blob location: {}", location)));
        }
        Ok(self.base_path.join(relative))
    }

    /// Remove now-empty fan-out directories up to the store root
    async fn prune_empty_parents(&self, full_path: &Path) -> Result<()> {
        let mut current_dir = full_path.parent().map(|p| p.to_path_buf());
        while let Some(dir) = current_dir {
            if dir == self.base_path {
                break;
            }
            match fs::read_dir(&dir).await {
                Ok(mut entries) => {
                    if entries.next_entry().await?.is_some() {
                        break;
                    }
                    // A concurrent put may have just recreated it
                    if fs::remove_dir(&dir).await.is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
            current_dir = dir.parent().map(|p| p.to_path_buf());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn locate(&self, hash: &ContentHash) -> String {
        let hex = hash.as_str();
        format!("sha256/{}/{}/{}", &hex[..2], &hex[2..4], hex)
    }

    async fn put(&self, hash: &ContentHash, staged: &Path) -> Result<String> {
        let location = self.locate(hash);
        let full_path = self.get_full_path(&location)?;

        if fs::try_exists(&full_path).await? {
            tracing::debug!("Blob {} already present, skipping write", hash);
            return Ok(location);
        }

        let parent = full_path
            .parent()
            .ok_or_else(|| AppError::Storage(format!("Blob path has no parent: {}", location)))?;
        fs::create_dir_all(parent).await?;

        // Staged files are already fsynced; the rename is atomic and the
        // directory sync makes it durable.
        fs::rename(staged, &full_path).await?;
        fs::File::open(parent).await?.sync_all().await?;

        tracing::debug!("Stored blob {} at {:?}", hash, full_path);
        Ok(location)
    }

    async fn open(&self, location: &str) -> Result<BlobReader> {
        let full_path = self.get_full_path(location)?;

        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::Storage(format!("Blob missing from store: {}", location))
            } else {
                AppError::Storage(format!("Failed to open blob: {}", e))
            }
        })?;

        Ok(Box::pin(file))
    }

    async fn delete(&self, location: &str) -> Result<bool> {
        let full_path = self.get_full_path(location)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted blob {:?}", full_path);
                self.prune_empty_parents(&full_path).await?;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, location: &str) -> Result<bool> {
        let full_path = self.get_full_path(location)?;
        Ok(fs::try_exists(&full_path).await?)
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}
