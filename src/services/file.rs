use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ContentHash, FileListItem, VaultFile};

const MAX_DISPLAY_NAME_LEN: usize = 255;

/// Ownership registry: one row per logical upload
pub struct FileService;

impl FileService {
    /// Validate a user-supplied file name
    pub fn validate_display_name(name: &str) -> Result<()> {
        if name.trim().is_empty()
            || name.len() > MAX_DISPLAY_NAME_LEN
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(AppError::InvalidInput("Invalid file name".to_string()));
        }
        Ok(())
    }

    /// Insert a new ownership record
    pub async fn insert(
        conn: &mut SqliteConnection,
        owner_id: &str,
        content_hash: &ContentHash,
        display_name: &str,
        size: i64,
    ) -> Result<VaultFile> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let mime_type = mime_guess::from_path(display_name)
            .first()
            .map(|m| m.essence_str().to_string());

        let file: VaultFile = sqlx::query_as(
            r#"
            INSERT INTO files (id, owner_id, content_hash, display_name, size, mime_type, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(content_hash)
        .bind(display_name)
        .bind(size)
        .bind(&mime_type)
        .bind(&now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(file)
    }

    /// Get file by ID
    pub async fn get_file(pool: &SqlitePool, file_id: &str) -> Result<VaultFile> {
        sqlx::query_as("SELECT * FROM files WHERE id = ?")
            .bind(file_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// Get a file, requiring `user_id` to own it
    pub async fn get_owned(pool: &SqlitePool, user_id: &str, file_id: &str) -> Result<VaultFile> {
        let file = Self::get_file(pool, file_id).await?;
        if file.owner_id != user_id {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
        Ok(file)
    }

    /// Delete a file owned by `owner_id`, returning the removed row.
    ///
    /// The delete runs first so it is the statement that takes the write lock.
    pub async fn delete_owned(
        conn: &mut SqliteConnection,
        owner_id: &str,
        file_id: &str,
    ) -> Result<VaultFile> {
        let deleted: Option<VaultFile> =
            sqlx::query_as("DELETE FROM files WHERE id = ? AND owner_id = ? RETURNING *")
                .bind(file_id)
                .bind(owner_id)
                .fetch_optional(&mut *conn)
                .await?;

        if let Some(file) = deleted {
            return Ok(file);
        }

        let exists: Option<String> = sqlx::query_scalar("SELECT owner_id FROM files WHERE id = ?")
            .bind(file_id)
            .fetch_optional(&mut *conn)
            .await?;

        match exists {
            Some(_) => Err(AppError::Forbidden("Only the owner can delete this file".to_string())),
            None => Err(AppError::NotFound("File not found".to_string())),
        }
    }

    /// List a user's files, newest first
    pub async fn list_files(pool: &SqlitePool, owner_id: &str) -> Result<Vec<FileListItem>> {
        let files = sqlx::query_as(
            r#"
            SELECT
              f.id,
              f.display_name,
              f.size,
              f.mime_type,
              f.content_hash,
              c.ref_count,
              f.uploaded_at
            FROM files f
            JOIN contents c ON c.hash = f.content_hash
            WHERE f.owner_id = ?
            ORDER BY f.uploaded_at DESC, f.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_rules() {
        assert!(FileService::validate_display_name("report.pdf").is_ok());
        assert!(FileService::validate_display_name("").is_err());
        assert!(FileService::validate_display_name("   ").is_err());
        assert!(FileService::validate_display_name("a/b.txt").is_err());
        assert!(FileService::validate_display_name("a\\b.txt").is_err());
        assert!(FileService::validate_display_name(&"x".repeat(256)).is_err());
    }
}
