//! Single-pass staging of incoming payloads.
//!
//! Bytes are written to a temporary file next to the blob store while the
//! SHA-256 digest and length are computed, so the payload is read exactly
//! once and its size never comes from the client.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::ContentHash;

const STAGING_PREFIX: &str = "upload-";
const READ_BUF_SIZE: usize = 64 * 1024;

/// Directory holding in-flight uploads
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create the staging area, making the directory if needed.
    ///
    /// Put it on the same filesystem as the blob store so a blob put is a
    /// rename rather than a copy.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start a new staging file accepting at most `max_bytes`
    pub async fn begin(&self, max_bytes: u64) -> Result<StagingWriter> {
        let path = self.dir.join(format!("{}{}", STAGING_PREFIX, Uuid::new_v4()));
        let file = fs::File::create(&path).await?;
        Ok(StagingWriter {
            file,
            hasher: Sha256::new(),
            size: 0,
            max_bytes,
            path: StagedPath(path),
        })
    }

    /// Drain `reader` into a new staging file
    pub async fn stage<R>(&self, mut reader: R, max_bytes: u64) -> Result<StagedBlob>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut writer = self.begin(max_bytes).await?;
        let mut buf = vec![0u8; READ_BUF_SIZE];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write(&buf[..n]).await?;
        }
        writer.finish().await
    }

    /// Delete staging files last modified more than `max_age` ago.
    ///
    /// Live uploads clean up after themselves; anything this old was left by
    /// a crash.
    pub async fn purge_older_than(&self, max_age: Duration) -> Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut purged = 0;

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_upload = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(STAGING_PREFIX));
            if !is_upload {
                continue;
            }
            let modified = entry.metadata().await?.modified()?;
            if modified < cutoff && fs::remove_file(entry.path()).await.is_ok() {
                purged += 1;
            }
        }

        if purged > 0 {
            tracing::info!("Purged {} stale staging files from {:?}", purged, self.dir);
        }
        Ok(purged)
    }
}

/// Incremental writer for one staged upload
pub struct StagingWriter {
    file: fs::File,
    hasher: Sha256,
    size: u64,
    max_bytes: u64,
    path: StagedPath,
}

impl StagingWriter {
    /// Append a chunk, failing once the payload exceeds the limit
    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        let size = self.size + chunk.len() as u64;
        if size > self.max_bytes {
            return Err(AppError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }
        self.hasher.update(chunk);
        self.file.write_all(chunk).await?;
        self.size = size;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.size
    }

    /// Flush to disk and produce the digest
    pub async fn finish(mut self) -> Result<StagedBlob> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(StagedBlob {
            hash: ContentHash::from_digest(self.hasher.finalize().as_slice()),
            size: self.size,
            path: self.path,
        })
    }
}

/// A fully written, hashed payload awaiting ingestion
#[derive(Debug)]
pub struct StagedBlob {
    hash: ContentHash,
    size: u64,
    path: StagedPath,
}

impl StagedBlob {
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path.0
    }
}

/// Removes the staging file unless it was moved into the store
#[derive(Debug)]
struct StagedPath(PathBuf);

impl Drop for StagedPath {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove staging file {:?}: {}", self.0, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stage_hashes_and_measures() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path().join(".staging")).await.unwrap();

        let data = vec![7u8; 200_000];
        let staged = staging.stage(data.as_slice(), 1 << 20).await.unwrap();

        assert_eq!(staged.size(), 200_000);
        assert_eq!(staged.hash(), &ContentHash::of(&data));
        assert_eq!(std::fs::read(staged.path()).unwrap(), data);
    }

    #[tokio::test]
    async fn test_oversized_payload_is_rejected_and_cleaned() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).await.unwrap();

        let data = vec![1u8; 11];
        let err = staging.stage(data.as_slice(), 10).await.unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge { limit: 10 }));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_staged_blob_removes_file() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).await.unwrap();

        let staged = staging.stage(&b"temporary"[..], 100).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_purge_keeps_fresh_uploads() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path()).await.unwrap();

        let writer = staging.begin(100).await.unwrap();
        assert_eq!(staging.purge_older_than(Duration::from_secs(3600)).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(staging.purge_older_than(Duration::ZERO).await.unwrap(), 1);
        drop(writer);
    }
}
