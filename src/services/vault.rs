//! The vault engine: deduplicating ingest, access-checked fetch, revoke and
//! sharing on top of the content, ownership, quota and share ledgers.
//!
//! Every mutating operation is a single metadata transaction whose first
//! statement is a write, so SQLite hands out the write lock before anything
//! is read. Payloads are hashed into a staging file before the transaction
//! opens; the only blob I/O under the lock is the rename that publishes a
//! new blob.

use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::config::StorageConfig;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    ContentHash, FileListItem, ShareGrant, SharedFile, StorageUsageResponse, VaultFile,
};
use crate::services::{ContentLedger, FileService, QuotaLedger, ShareService};
use crate::storage::{BlobReader, BlobStore, StagedBlob, StagingArea, StagingWriter};

/// Size limits applied by the engine
#[derive(Debug, Clone, Copy)]
pub struct VaultLimits {
    pub max_upload_bytes: u64,
    pub default_quota_bytes: i64,
}

impl From<&StorageConfig> for VaultLimits {
    fn from(config: &StorageConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            default_quota_bytes: config.default_quota_bytes,
        }
    }
}

#[derive(Clone)]
pub struct VaultEngine {
    db: Database,
    blobs: Arc<dyn BlobStore>,
    staging: StagingArea,
    limits: VaultLimits,
}

impl VaultEngine {
    pub fn new(
        db: Database,
        blobs: Arc<dyn BlobStore>,
        staging: StagingArea,
        limits: VaultLimits,
    ) -> Self {
        Self {
            db,
            blobs,
            staging,
            limits,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn limits(&self) -> VaultLimits {
        self.limits
    }

    pub(crate) fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Start a staged upload for callers that receive the payload in chunks
    pub async fn begin_upload(&self) -> Result<StagingWriter> {
        self.staging.begin(self.limits.max_upload_bytes).await
    }

    /// Ingest a payload read from `reader`
    pub async fn ingest<R>(&self, user_id: &str, display_name: &str, reader: R) -> Result<VaultFile>
    where
        R: AsyncRead + Unpin + Send,
    {
        FileService::validate_display_name(display_name)?;
        let staged = self
            .staging
            .stage(reader, self.limits.max_upload_bytes)
            .await?;
        self.ingest_staged(user_id, display_name, staged).await
    }

    /// Record a staged payload as a new upload owned by `user_id`.
    ///
    /// Charges quota, takes a content reference and writes the blob only if
    /// this upload holds the sole reference, all in one transaction.
    pub async fn ingest_staged(
        &self,
        user_id: &str,
        display_name: &str,
        staged: StagedBlob,
    ) -> Result<VaultFile> {
        FileService::validate_display_name(display_name)?;
        let size = i64::try_from(staged.size()).map_err(|_| AppError::PayloadTooLarge {
            limit: self.limits.max_upload_bytes,
        })?;
        let hash = staged.hash().clone();
        let location = self.blobs.locate(&hash);

        let mut tx = self.db.pool().begin().await?;

        QuotaLedger::ensure(&mut tx, user_id, self.limits.default_quota_bytes).await?;
        QuotaLedger::charge(&mut tx, user_id, size).await?;

        let content = ContentLedger::acquire(&mut tx, &hash, size, &location).await?;
        let wrote_blob = content.ref_count == 1;
        if wrote_blob {
            self.blobs.put(&hash, staged.path()).await?;
        }

        let file = FileService::insert(&mut tx, user_id, &hash, display_name, size).await?;

        if let Err(e) = tx.commit().await {
            if wrote_blob {
                tracing::warn!("Commit failed after storing blob {}, reaping", hash);
                if let Err(reap_err) = self.reap(&hash).await {
                    tracing::warn!("Failed to reap blob {}: {}", hash, reap_err);
                }
            }
            return Err(e.into());
        }

        tracing::info!(
            "User {} ingested {} ({} bytes, content {}, refs {}{})",
            user_id,
            file.id,
            size,
            hash,
            content.ref_count,
            if wrote_blob { ", stored" } else { ", deduplicated" }
        );
        Ok(file)
    }

    /// Resolve a file the user may read (owner or grantee)
    pub async fn stat(&self, user_id: &str, file_id: &str) -> Result<VaultFile> {
        let file = FileService::get_file(self.db.pool(), file_id).await?;
        if file.owner_id != user_id
            && !ShareService::has_grant(self.db.pool(), file_id, user_id).await?
        {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
        Ok(file)
    }

    /// Open a readable file's content
    pub async fn fetch(&self, user_id: &str, file_id: &str) -> Result<(VaultFile, BlobReader)> {
        let file = self.stat(user_id, file_id).await?;

        let content = ContentLedger::get(self.db.pool(), &file.content_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        match self.blobs.open(&content.location).await {
            Ok(reader) => Ok((file, reader)),
            // Revoked (and reaped) between the lookup and the open
            Err(e) => match FileService::get_file(self.db.pool(), file_id).await {
                Err(AppError::NotFound(msg)) => Err(AppError::NotFound(msg)),
                _ => Err(e),
            },
        }
    }

    /// Delete one of the user's uploads.
    ///
    /// Ownership row, grants, content reference and quota charge go in one
    /// transaction. When that drops the last reference the record and blob
    /// are reaped afterwards; a crash in between leaves a zero-reference
    /// record for the reconciler.
    pub async fn revoke(&self, user_id: &str, file_id: &str) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        let file = FileService::delete_owned(&mut tx, user_id, file_id).await?;
        ShareService::delete_for_file(&mut tx, file_id).await?;
        let content = ContentLedger::release(&mut tx, &file.content_hash).await?;
        QuotaLedger::refund(&mut tx, user_id, file.size).await?;

        tx.commit().await?;

        tracing::info!(
            "User {} revoked {} (content {}, refs {})",
            user_id,
            file_id,
            file.content_hash,
            content.ref_count
        );

        if content.ref_count == 0 {
            if let Err(e) = self.reap(&file.content_hash).await {
                tracing::warn!(
                    "Deferred removal of content {} to the reconciler: {}",
                    file.content_hash,
                    e
                );
            }
        }

        Ok(())
    }

    /// Remove a content record and its blob if nothing references it.
    ///
    /// Returns whether a blob was removed. The blob is deleted before the
    /// record deletion commits, so a failure can only leave a record without
    /// a blob at zero references, never a referenced record without a blob.
    pub async fn reap(&self, hash: &ContentHash) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let removed = ContentLedger::remove_unreferenced(&mut tx, hash).await?;
        let location = match removed {
            Some(location) => location,
            None => {
                if ContentLedger::ref_count(&mut tx, hash).await?.is_some() {
                    // Still referenced
                    return Ok(false);
                }
                // No record at all: only an uncommitted ingest left this blob
                self.blobs.locate(hash)
            }
        };

        let deleted = self.blobs.delete(&location).await?;
        tx.commit().await?;

        if deleted {
            tracing::info!("Removed unreferenced content {}", hash);
        }
        Ok(deleted)
    }

    /// Share a file with another user
    pub async fn share(&self, granter_id: &str, file_id: &str, target_id: &str) -> Result<ShareGrant> {
        ShareService::grant(self.db.pool(), granter_id, file_id, target_id).await
    }

    /// Withdraw a share
    pub async fn unshare(&self, granter_id: &str, file_id: &str, target_id: &str) -> Result<()> {
        ShareService::revoke_grant(self.db.pool(), granter_id, file_id, target_id).await
    }

    pub async fn list_grants(&self, owner_id: &str, file_id: &str) -> Result<Vec<ShareGrant>> {
        ShareService::list_for_file(self.db.pool(), owner_id, file_id).await
    }

    pub async fn list_files(&self, user_id: &str) -> Result<Vec<FileListItem>> {
        FileService::list_files(self.db.pool(), user_id).await
    }

    pub async fn list_shared_with(&self, user_id: &str) -> Result<Vec<SharedFile>> {
        ShareService::list_received(self.db.pool(), user_id).await
    }

    pub async fn usage(&self, user_id: &str) -> Result<StorageUsageResponse> {
        QuotaLedger::usage(self.db.pool(), user_id, self.limits.default_quota_bytes).await
    }

    pub async fn set_quota_limit(&self, user_id: &str, limit: i64) -> Result<StorageUsageResponse> {
        QuotaLedger::set_limit(&self.db, user_id, limit, self.limits.default_quota_bytes).await?;
        self.usage(user_id).await
    }
}
