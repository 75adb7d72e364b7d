use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Label recorded for media the detector does not process (video uploads).
pub const VIDEO_PLACEHOLDER_LABEL: &str = "video_processing";

/// A single normalized detection.
///
/// `bbox` is `[x_min, y_min, x_max, y_max]` in source-image pixel
/// coordinates, with each axis ordered so min <= max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[schema(value_type = Vec<i64>)]
    pub bbox: [i64; 4],
}

impl Detection {
    /// Degraded-mode entry recorded for unsupported media instead of a
    /// detection pass. Explicitly not an error.
    pub fn video_placeholder() -> Self {
        Self {
            label: VIDEO_PLACEHOLDER_LABEL.to_string(),
            confidence: 0.0,
            bbox: [0, 0, 0, 0],
        }
    }
}
