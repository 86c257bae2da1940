use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;

/// Hex-encoded SHA-256 digest identifying a content payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash a complete in-memory payload.
    pub fn of(data: &[u8]) -> Self {
        Self::from_digest(Sha256::digest(data).as_slice())
    }

    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row per distinct payload stored in the blob store.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentRecord {
    pub hash: ContentHash,
    pub location: String,
    pub size: i64,
    pub ref_count: i64,
    pub created_at: String,
}
