use serde::Serialize;
use sqlx::FromRow;

use super::ContentHash;

/// A user's logical upload. Many may reference the same content.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VaultFile {
    pub id: String,
    pub owner_id: String,
    pub content_hash: ContentHash,
    pub display_name: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub uploaded_at: String,
}

/// File listing entry with the dedup state of its content
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileListItem {
    pub id: String,
    pub display_name: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub content_hash: ContentHash,
    pub ref_count: i64,
    pub uploaded_at: String,
}

/// A file someone else shared with the current user
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SharedFile {
    pub id: String,
    pub display_name: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub owner_id: String,
    pub uploaded_at: String,
    pub granted_at: String,
}
