use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::Detection;

/// Response body for a successful upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub upload_id: i64,
    pub filename: String,
    pub detections: Vec<Detection>,
    /// Base64-encoded PNG with bounding boxes drawn; absent for video
    /// uploads and when annotation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_image: Option<String>,
}

/// One row of the history listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub id: i64,
    pub filename: String,
    pub upload_time: String,
    pub detections: Vec<Detection>,
}

/// Paginated history response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub uploads: Vec<HistoryEntry>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
}

/// Timestamp format persisted in `uploads.upload_time`: ISO-8601 UTC with
/// microsecond precision and no offset suffix, so text ordering matches
/// chronological ordering.
pub fn format_upload_time(time: DateTime<Utc>) -> String {
    // to_rfc3339 would append +00:00, which breaks lexicographic comparison
    // against date-only filter bounds like "2026-08-08".
    time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// `ceil(total / per_page)`, the page count reported alongside every
/// history response.
pub fn total_pages(total: i64, per_page: u32) -> i64 {
    if total <= 0 {
        return 0;
    }
    let per_page = i64::from(per_page.max(1));
    (total + per_page - 1) / per_page
}
