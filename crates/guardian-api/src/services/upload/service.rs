//! Upload pipeline orchestration: validate -> stage -> detect -> persist.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use chrono::Utc;
use guardian_core::models::{format_upload_time, Detection, UploadResponse};
use guardian_core::AppError;

use super::staging::StagedAsset;
use crate::state::AppState;

/// Run one upload through the full pipeline and return the response body.
///
/// Exactly one audit record is written per successful run; any failure
/// before the insert leaves zero records behind. Both staged assets (the
/// source, and the annotated copy when one was produced) are released on
/// every exit path: explicitly on success, and by their `Drop` guards when
/// an error propagates out with `?`.
pub async fn process_upload(
    state: &AppState,
    user_id: &str,
    filename: &str,
    content_type: &str,
    data: Bytes,
) -> Result<UploadResponse, AppError> {
    // 1. Validate before anything is staged.
    let is_image = content_type.starts_with("image/");
    let is_video = content_type.starts_with("video/");
    if !is_image && !is_video {
        return Err(AppError::InvalidInput(
            "Invalid file type. Use JPEG/PNG or MP4/AVI.".to_string(),
        ));
    }
    if data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }
    if data.len() > state.max_upload_size {
        return Err(AppError::PayloadTooLarge(format!(
            "{} bytes exceeds max {} bytes",
            data.len(),
            state.max_upload_size
        )));
    }

    // 2. Stage the source payload.
    let mut source = state.staging.stage(&data, filename).await?;
    let mut annotated = StagedAsset::empty();

    // 3. Detect. Video media takes the placeholder path; the engine only
    //    sees images.
    let (detections, result_image) = if is_image {
        let output = state.engine.run(data.to_vec(), true).await?;
        let encoded = match output.annotated_png {
            Some(png) => {
                annotated = state.staging.stage(&png, "annotated.png").await?;
                Some(BASE64.encode(&png))
            }
            None => None,
        };
        (output.detections, encoded)
    } else {
        (vec![Detection::video_placeholder()], None)
    };

    // 4. Persist one immutable record; upload_time is assigned here, at
    //    the moment of persistence.
    let upload_time = format_upload_time(Utc::now());
    let results_json = serde_json::to_string(&detections)
        .map_err(|e| AppError::Internal(format!("Failed to encode detections: {}", e)))?;
    let upload_id = state
        .uploads
        .insert(user_id, filename, &upload_time, &results_json)
        .await?;

    tracing::info!(
        upload_id,
        detections = detections.len(),
        "Upload recorded"
    );

    // 5. Cleanup. Drop guards cover the error paths above.
    source.release();
    annotated.release();

    Ok(UploadResponse {
        upload_id,
        filename: filename.to_string(),
        detections,
        result_image,
    })
}
