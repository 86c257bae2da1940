use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ShareGrant, ShareMode, SharedFile};
use crate::services::{FileService, UserService};

/// Read grants from file owners to other users
pub struct ShareService;

impl ShareService {
    /// Grant `target_id` read access to a file owned by `granter_id`.
    ///
    /// Only the owner may grant. Granting an existing pair returns the
    /// existing grant. Sharing with yourself is rejected.
    pub async fn grant(
        pool: &SqlitePool,
        granter_id: &str,
        file_id: &str,
        target_id: &str,
    ) -> Result<ShareGrant> {
        FileService::get_owned(pool, granter_id, file_id).await?;

        if granter_id == target_id {
            return Err(AppError::InvalidInput(
                "Cannot share a file with yourself".to_string(),
            ));
        }

        if !UserService::exists(pool, target_id).await? {
            return Err(AppError::NotFound("Target user not found".to_string()));
        }

        let share_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        // Ownership check and insert in one statement, so a concurrent delete
        // of the file cannot slip in between.
        let result = sqlx::query(
            r#"
            INSERT INTO shares (id, file_id, granted_by, granted_to, mode, granted_at)
            SELECT ?, id, owner_id, ?, ?, ? FROM files WHERE id = ? AND owner_id = ?
            ON CONFLICT(file_id, granted_to) DO NOTHING
            "#,
        )
        .bind(&share_id)
        .bind(target_id)
        .bind(ShareMode::Read.as_str())
        .bind(&now)
        .bind(file_id)
        .bind(granter_id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!("User {} shared file {} with {}", granter_id, file_id, target_id);
        }

        sqlx::query_as("SELECT * FROM shares WHERE file_id = ? AND granted_to = ?")
            .bind(file_id)
            .bind(target_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// Withdraw a grant. Only the file owner may do this.
    pub async fn revoke_grant(
        pool: &SqlitePool,
        granter_id: &str,
        file_id: &str,
        target_id: &str,
    ) -> Result<()> {
        FileService::get_owned(pool, granter_id, file_id).await?;

        let result = sqlx::query("DELETE FROM shares WHERE file_id = ? AND granted_to = ?")
            .bind(file_id)
            .bind(target_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Share not found".to_string()));
        }

        tracing::info!("User {} unshared file {} from {}", granter_id, file_id, target_id);
        Ok(())
    }

    /// Remove every grant on a file
    pub async fn delete_for_file(conn: &mut SqliteConnection, file_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM shares WHERE file_id = ?")
            .bind(file_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Whether `user_id` holds a grant on the file
    pub async fn has_grant(pool: &SqlitePool, file_id: &str, user_id: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shares WHERE file_id = ? AND granted_to = ?")
                .bind(file_id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }

    /// Grants on one file (owner only)
    pub async fn list_for_file(
        pool: &SqlitePool,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Vec<ShareGrant>> {
        FileService::get_owned(pool, owner_id, file_id).await?;

        let grants = sqlx::query_as("SELECT * FROM shares WHERE file_id = ? ORDER BY granted_at")
            .bind(file_id)
            .fetch_all(pool)
            .await?;
        Ok(grants)
    }

    /// Files other users have shared with `user_id`
    pub async fn list_received(pool: &SqlitePool, user_id: &str) -> Result<Vec<SharedFile>> {
        let files = sqlx::query_as(
            r#"
            SELECT
              f.id,
              f.display_name,
              f.size,
              f.mime_type,
              f.owner_id,
              f.uploaded_at,
              s.granted_at
            FROM shares s
            JOIN files f ON s.file_id = f.id
            WHERE s.granted_to = ?
            ORDER BY s.granted_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(files)
    }
}
