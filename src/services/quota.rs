use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{QuotaRecord, StorageUsageResponse};

/// Per-user byte accounting.
///
/// Every upload is charged its full logical size, even when its content is
/// already stored for someone else.
pub struct QuotaLedger;

impl QuotaLedger {
    /// Create the user's quota row with `default_limit` if it does not exist
    pub async fn ensure(conn: &mut SqliteConnection, user_id: &str, default_limit: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO quotas (user_id, used_bytes, limit_bytes, updated_at)
            VALUES (?, 0, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(default_limit)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Add `bytes` to the user's usage if it stays within the limit.
    /// Check and increment are one statement.
    pub async fn charge(conn: &mut SqliteConnection, user_id: &str, bytes: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE quotas
            SET used_bytes = used_bytes + ?, updated_at = ?
            WHERE user_id = ? AND used_bytes + ? <= limit_bytes
            "#,
        )
        .bind(bytes)
        .bind(&now)
        .bind(user_id)
        .bind(bytes)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let (used, limit): (i64, i64) =
                sqlx::query_as("SELECT used_bytes, limit_bytes FROM quotas WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Quota not found".to_string()))?;
            return Err(AppError::QuotaExceeded {
                used,
                requested: bytes,
                limit,
            });
        }

        Ok(())
    }

    /// Return `bytes` previously charged for an upload
    pub async fn refund(conn: &mut SqliteConnection, user_id: &str, bytes: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE quotas
            SET used_bytes = used_bytes - ?, updated_at = ?
            WHERE user_id = ? AND used_bytes >= ?
            "#,
        )
        .bind(bytes)
        .bind(&now)
        .bind(user_id)
        .bind(bytes)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "Quota for user {} cannot be refunded {} bytes",
                user_id, bytes
            )));
        }
        Ok(())
    }

    /// Get a user's quota row
    pub async fn get(pool: &SqlitePool, user_id: &str) -> Result<Option<QuotaRecord>> {
        let quota = sqlx::query_as("SELECT * FROM quotas WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(quota)
    }

    /// Usage summary; users who never uploaded report the default limit
    pub async fn usage(
        pool: &SqlitePool,
        user_id: &str,
        default_limit: i64,
    ) -> Result<StorageUsageResponse> {
        let quota = Self::get(pool, user_id).await?.unwrap_or_else(|| QuotaRecord {
            user_id: user_id.to_string(),
            used_bytes: 0,
            limit_bytes: default_limit,
            updated_at: Utc::now().to_rfc3339(),
        });

        let file_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE owner_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(StorageUsageResponse::new(&quota, file_count))
    }

    /// Change a user's limit. Lowering it below current usage is refused.
    pub async fn set_limit(
        db: &Database,
        user_id: &str,
        limit: i64,
        default_limit: i64,
    ) -> Result<QuotaRecord> {
        if limit < 0 {
            return Err(AppError::InvalidInput("Quota limit must not be negative".to_string()));
        }

        let mut tx = db.pool().begin().await?;
        Self::ensure(&mut tx, user_id, default_limit).await?;

        let now = Utc::now().to_rfc3339();
        let quota: Option<QuotaRecord> = sqlx::query_as(
            r#"
            UPDATE quotas SET limit_bytes = ?, updated_at = ?
            WHERE user_id = ? AND used_bytes <= ?
            RETURNING *
            "#,
        )
        .bind(limit)
        .bind(&now)
        .bind(user_id)
        .bind(limit)
        .fetch_optional(&mut *tx)
        .await?;

        let quota = quota.ok_or_else(|| {
            AppError::InvalidInput("Quota limit is below current usage".to_string())
        })?;

        tx.commit().await?;
        tracing::info!("Set quota for user {} to {} bytes", user_id, limit);
        Ok(quota)
    }
}
