use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{CurrentUser, SetQuotaRequest, StorageUsageResponse};
use crate::services::UserService;
use crate::AppState;

/// Check if user is admin
fn require_admin(user: &CurrentUser) -> Result<()> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

/// Set a user's quota limit
/// PUT /api/v1/admin/users/:id/quota
pub async fn set_user_quota(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(user_id): Path<String>,
    Json(req): Json<SetQuotaRequest>,
) -> Result<Json<ApiResponse<StorageUsageResponse>>> {
    require_admin(&current_user)?;
    UserService::get_user(state.engine.db().pool(), &user_id).await?;

    let usage = state.engine.set_quota_limit(&user_id, req.limit_bytes).await?;
    Ok(Json(ApiResponse::success(usage)))
}
