use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tokio_util::io::ReaderStream;

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{CurrentUser, FileListItem, VaultFile};
use crate::storage::StagedBlob;
use crate::AppState;

/// List the current user's files
/// GET /api/v1/files
pub async fn list_files(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<FileListItem>>>> {
    let files = state.engine.list_files(&current_user.id).await?;
    Ok(Json(ApiResponse::success(files)))
}

/// Get a specific file (owner or grantee)
/// GET /api/v1/files/:id
pub async fn get_file(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VaultFile>>> {
    let file = state.engine.stat(&current_user.id, &id).await?;
    Ok(Json(ApiResponse::success(file)))
}

/// Upload a file
/// POST /api/v1/files/upload
///
/// Multipart fields: `file` (the payload) and an optional `name` overriding
/// the uploaded file name.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<VaultFile>>> {
    let mut staged: Option<StagedBlob> = None;
    let mut file_name: Option<String> = None;
    let mut display_name: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to process multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                if staged.is_some() {
                    return Err(AppError::InvalidInput("Only one file per upload".to_string()));
                }
                file_name = field.file_name().map(|s| s.to_string());

                // Hash while streaming; the payload is never buffered whole
                let mut writer = state.engine.begin_upload().await?;
                while let Some(chunk) = field.chunk().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file chunk: {}", e))
                })? {
                    writer.write(&chunk).await?;
                }
                tracing::debug!("Received {} bytes for upload", writer.bytes_written());
                staged = Some(writer.finish().await?);
            }
            "name" => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read name field: {}", e))
                })?;
                if !text.is_empty() {
                    display_name = Some(text);
                }
            }
            _ => {}
        }
    }

    let staged = staged.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    let display_name = display_name
        .or(file_name)
        .ok_or_else(|| AppError::InvalidInput("No file name provided".to_string()))?;

    let file = state
        .engine
        .ingest_staged(&current_user.id, &display_name, staged)
        .await?;
    Ok(Json(ApiResponse::success(file)))
}

/// Download a file
/// GET /api/v1/files/:id/download
pub async fn download_file(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response> {
    let (file, reader) = state.engine.fetch(&current_user.id, &id).await?;

    let content_type = file
        .mime_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let fallback_name = file.display_name.replace(['"', '\\'], "_");
    let encoded_name = urlencoding::encode(&file.display_name);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file.size)
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                fallback_name, encoded_name
            ),
        )
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Delete a file
/// DELETE /api/v1/files/:id
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.engine.revoke(&current_user.id, &id).await?;
    Ok(Json(ApiResponse::<()>::success_message("File deleted")))
}
