use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::error::{ApiResponse, Result};
use crate::models::{CreateShareRequest, CurrentUser, ShareGrant, SharedFile};
use crate::AppState;

/// Share a file with another user
/// POST /api/v1/files/:id/shares
pub async fn create_share(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(file_id): Path<String>,
    Json(req): Json<CreateShareRequest>,
) -> Result<Json<ApiResponse<ShareGrant>>> {
    let grant = state
        .engine
        .share(&current_user.id, &file_id, &req.target_user_id)
        .await?;
    Ok(Json(ApiResponse::success(grant)))
}

/// List grants on a file
/// GET /api/v1/files/:id/shares
pub async fn list_file_shares(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ShareGrant>>>> {
    let grants = state.engine.list_grants(&current_user.id, &file_id).await?;
    Ok(Json(ApiResponse::success(grants)))
}

/// Withdraw a share
/// DELETE /api/v1/files/:id/shares/:user_id
pub async fn delete_share(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path((file_id, target_user_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .engine
        .unshare(&current_user.id, &file_id, &target_user_id)
        .await?;
    Ok(Json(ApiResponse::<()>::success_message("Share deleted")))
}

/// Files shared with the current user
/// GET /api/v1/shares/received
pub async fn list_received_shares(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<SharedFile>>>> {
    let files = state.engine.list_shared_with(&current_user.id).await?;
    Ok(Json(ApiResponse::success(files)))
}
