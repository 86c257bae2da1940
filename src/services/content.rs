use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{AppError, Result};
use crate::models::{ContentHash, ContentRecord};

/// Reference-counted index of stored payloads
pub struct ContentLedger;

impl ContentLedger {
    /// Insert the record with one reference, or add a reference to the
    /// existing one. A single upsert on the unique hash, so concurrent first
    /// uploads cannot both create it.
    ///
    /// A returned `ref_count` of 1 means the caller holds the only live
    /// reference and must make sure the blob is present.
    pub async fn acquire(
        conn: &mut SqliteConnection,
        hash: &ContentHash,
        size: i64,
        location: &str,
    ) -> Result<ContentRecord> {
        let now = Utc::now().to_rfc3339();
        let record: ContentRecord = sqlx::query_as(
            r#"
            INSERT INTO contents (hash, location, size, ref_count, created_at)
            VALUES (?, ?, ?, 1, ?)
            ON CONFLICT(hash) DO UPDATE SET ref_count = ref_count + 1
            RETURNING hash, location, size, ref_count, created_at
            "#,
        )
        .bind(hash)
        .bind(location)
        .bind(size)
        .bind(&now)
        .fetch_one(&mut *conn)
        .await?;

        if record.size != size {
            return Err(AppError::Conflict(format!(
                "Content {} is recorded with size {} but payload has {} bytes",
                hash, record.size, size
            )));
        }

        Ok(record)
    }

    /// Drop one reference. The record stays (at zero) until reaped.
    pub async fn release(conn: &mut SqliteConnection, hash: &ContentHash) -> Result<ContentRecord> {
        let record: Option<ContentRecord> = sqlx::query_as(
            r#"
            UPDATE contents SET ref_count = ref_count - 1
            WHERE hash = ? AND ref_count > 0
            RETURNING hash, location, size, ref_count, created_at
            "#,
        )
        .bind(hash)
        .fetch_optional(&mut *conn)
        .await?;

        record.ok_or_else(|| {
            AppError::Internal(format!("Content {} has no live reference to release", hash))
        })
    }

    /// Delete the record if nothing references it, returning its location
    pub async fn remove_unreferenced(
        conn: &mut SqliteConnection,
        hash: &ContentHash,
    ) -> Result<Option<String>> {
        let location: Option<String> =
            sqlx::query_scalar("DELETE FROM contents WHERE hash = ? AND ref_count = 0 RETURNING location")
                .bind(hash)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(location)
    }

    /// Get content record by hash
    pub async fn get(pool: &SqlitePool, hash: &ContentHash) -> Result<Option<ContentRecord>> {
        let record = sqlx::query_as("SELECT * FROM contents WHERE hash = ?")
            .bind(hash)
            .fetch_optional(pool)
            .await?;
        Ok(record)
    }

    /// Live reference count inside a transaction; `None` when no record exists
    pub async fn ref_count(conn: &mut SqliteConnection, hash: &ContentHash) -> Result<Option<i64>> {
        let count = sqlx::query_scalar("SELECT ref_count FROM contents WHERE hash = ?")
            .bind(hash)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Hashes whose records have dropped to zero references, in hash order,
    /// starting after `after`
    pub async fn list_unreferenced(
        pool: &SqlitePool,
        after: Option<&ContentHash>,
        limit: i64,
    ) -> Result<Vec<ContentHash>> {
        let hashes = sqlx::query_scalar(
            r#"
            SELECT hash FROM contents
            WHERE ref_count = 0 AND hash > ?
            ORDER BY hash
            LIMIT ?
            "#,
        )
        .bind(after.map(ContentHash::as_str).unwrap_or(""))
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(hashes)
    }
}
