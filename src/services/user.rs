use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::{User, UserSummary};

/// User service
pub struct UserService;

impl UserService {
    /// Get user by ID
    pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<User> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Check whether a user id is registered
    pub async fn exists(pool: &SqlitePool, user_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    /// Registered users other than `except_id`, for choosing a share target
    pub async fn list_users(pool: &SqlitePool, except_id: &str) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as(
            "SELECT id, email, name, created_at FROM users WHERE id != ? ORDER BY email",
        )
        .bind(except_id)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }
}
