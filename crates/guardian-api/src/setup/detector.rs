//! Detection model loading.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use guardian_core::Config;
use guardian_detect::{ObjectDetector, YoloDetector};

/// Load the ONNX model once at startup. The returned detector is shared
/// read-only for the process lifetime; there is no per-request reload.
pub fn setup_detector(config: &Config) -> Result<Arc<dyn ObjectDetector>> {
    let path = Path::new(config.model_path());
    tracing::info!(model = %path.display(), "Loading detection model...");

    let detector = YoloDetector::load(
        path,
        config.confidence_threshold(),
        config.iou_threshold(),
    )
    .with_context(|| format!("Failed to load detection model from {}", path.display()))?;

    tracing::info!(
        confidence_threshold = config.confidence_threshold(),
        iou_threshold = config.iou_threshold(),
        "Detection model loaded"
    );

    Ok(Arc::new(detector))
}
