use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;
use crate::models::ContentHash;

/// Streaming handle on a stored blob
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Durable byte storage keyed by content hash
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Location a blob with this hash is (or would be) stored at
    fn locate(&self, hash: &ContentHash) -> String;

    /// Move a fully written, hash-verified staging file into the store.
    ///
    /// Returns once the blob is durable. Putting a hash that is already
    /// present leaves the existing blob untouched.
    async fn put(&self, hash: &ContentHash, staged: &Path) -> Result<String>;

    /// Open a blob for streaming reads
    async fn open(&self, location: &str) -> Result<BlobReader>;

    /// Read a whole blob into memory
    async fn get(&self, location: &str) -> Result<Bytes> {
        let mut reader = self.open(location).await?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        Ok(Bytes::from(data))
    }

    /// Remove a blob. Returns `false` when it was already absent.
    async fn delete(&self, location: &str) -> Result<bool>;

    /// Check if a blob exists
    async fn exists(&self, location: &str) -> Result<bool>;

    /// Get the storage type name
    fn storage_type(&self) -> &'static str;
}
