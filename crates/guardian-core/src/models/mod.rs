//! Domain models
//!
//! Detections, upload records, and the response shapes served by the API.

mod analytics;
mod detection;
mod upload;

pub use analytics::AnalyticsResponse;
pub use detection::{Detection, VIDEO_PLACEHOLDER_LABEL};
pub use upload::{
    format_upload_time, total_pages, HistoryEntry, HistoryResponse, UploadResponse,
};
