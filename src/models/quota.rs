use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-user storage allowance, charged by logical upload size
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuotaRecord {
    pub user_id: String,
    pub used_bytes: i64,
    pub limit_bytes: i64,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct StorageUsageResponse {
    pub used: i64,
    pub limit: i64,
    pub percentage: u8,
    pub file_count: i64,
}

impl StorageUsageResponse {
    pub fn new(quota: &QuotaRecord, file_count: i64) -> Self {
        let percentage = if quota.limit_bytes > 0 {
            ((quota.used_bytes as f64 / quota.limit_bytes as f64) * 100.0).min(100.0) as u8
        } else {
            0
        };
        Self {
            used: quota.used_bytes,
            limit: quota.limit_bytes,
            percentage,
            file_count,
        }
    }
}

/// Admin request to change a user's limit
#[derive(Debug, Deserialize)]
pub struct SetQuotaRequest {
    pub limit_bytes: i64,
}
