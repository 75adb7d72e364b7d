use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use guardian_core::models::UploadResponse;
use guardian_core::AppError;

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::process_upload;
use crate::state::AppState;

/// Upload handler
///
/// Accepts one multipart file, runs detection, persists the audit record,
/// and returns the detections plus the annotated image (base64) for image
/// media. Authentication has already happened in the middleware; no asset
/// is staged for an unauthenticated or invalid request.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    responses(
        (status = 201, description = "Upload processed and recorded", body = UploadResponse),
        (status = 400, description = "Unsupported media type or malformed request", body = ErrorResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Image could not be decoded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = %ctx.user_id, operation = "upload")
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), HttpAppError> {
    let (data, filename, content_type) = extract_file(multipart).await?;

    let response = process_upload(&state, &ctx.user_id, &filename, &content_type, data).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Pull the single expected file part out of the multipart body.
async fn extract_file(mut multipart: Multipart) -> Result<(Bytes, String, String), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .ok_or_else(|| AppError::InvalidInput("Missing file content type".to_string()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        return Ok((data, filename, content_type));
    }

    Err(AppError::InvalidInput(
        "Missing 'file' field in multipart request".to_string(),
    ))
}
