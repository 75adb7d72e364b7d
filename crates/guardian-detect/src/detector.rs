use image::DynamicImage;

use crate::error::DetectError;

/// Raw model output before normalization.
///
/// `bbox` is `[x_min, y_min, x_max, y_max]` in source-image pixel space as
/// produced by the backend; ordering and bounds are not guaranteed here.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub score: f32,
    pub bbox: [f32; 4],
}

/// Model boundary for object detection.
///
/// Implementations hold the loaded model and must be safe to share across
/// request handlers (`Send + Sync`); `detect` is synchronous because
/// inference is CPU-bound and is dispatched onto a blocking worker by the
/// engine.
pub trait ObjectDetector: Send + Sync {
    /// Run inference on a decoded image and return raw detections in
    /// source-image pixel coordinates. An empty result is a valid outcome.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, DetectError>;

    /// Label table: class index -> human-readable label.
    fn labels(&self) -> &[String];
}
