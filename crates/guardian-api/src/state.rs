//! Application state shared across handlers.

use guardian_db::UploadRepository;
use guardian_detect::DetectionEngine;
use sqlx::PgPool;

use crate::services::upload::StagingArea;

/// Everything a request handler needs, built once at startup and shared
/// behind an `Arc`. The detection engine holds the loaded model; it is
/// read-only for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub uploads: UploadRepository,
    pub engine: DetectionEngine,
    pub staging: StagingArea,
    pub max_upload_size: usize,
}
