use axum::{extract::State, Extension, Json};

use crate::error::{ApiResponse, Result};
use crate::models::{CurrentUser, StorageUsageResponse, UserSummary};
use crate::services::UserService;
use crate::AppState;

/// Get storage usage
/// GET /api/v1/user/storage
pub async fn get_storage_usage(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<StorageUsageResponse>>> {
    let usage = state.engine.usage(&current_user.id).await?;
    Ok(Json(ApiResponse::success(usage)))
}

/// List other users, to find a share target
/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    let users = UserService::list_users(state.engine.db().pool(), &current_user.id).await?;
    Ok(Json(ApiResponse::success(users)))
}
