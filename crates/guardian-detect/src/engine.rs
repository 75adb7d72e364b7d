//! Detection engine: decode, infer, normalize, annotate.

use std::sync::Arc;

use guardian_core::models::Detection;
use image::DynamicImage;

use crate::annotate;
use crate::detector::{ObjectDetector, RawDetection};
use crate::error::DetectError;

/// Result of one engine pass over an uploaded image.
#[derive(Debug)]
pub struct EngineOutput {
    pub detections: Vec<Detection>,
    /// PNG bytes with boxes drawn, when annotation was requested and
    /// succeeded.
    pub annotated_png: Option<Vec<u8>>,
}

/// Wraps the shared detector with decoding, normalization, and annotation.
///
/// The whole pass (decode included) runs on the blocking thread pool:
/// inference is CPU-bound and must not stall I/O-bound work on the async
/// runtime.
#[derive(Clone)]
pub struct DetectionEngine {
    detector: Arc<dyn ObjectDetector>,
}

impl DetectionEngine {
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        Self { detector }
    }

    /// Run detection over raw image bytes.
    ///
    /// Fails with [`DetectError::Decode`] when the payload is not a
    /// decodable image; zero detections is a successful result. Annotation
    /// failures are logged and degrade to `annotated_png: None`.
    pub async fn run(&self, data: Vec<u8>, annotate: bool) -> Result<EngineOutput, DetectError> {
        let detector = Arc::clone(&self.detector);
        tokio::task::spawn_blocking(move || run_sync(detector.as_ref(), &data, annotate))
            .await
            .map_err(|e| DetectError::Runtime(format!("inference task failed: {}", e)))?
    }
}

fn run_sync(
    detector: &dyn ObjectDetector,
    data: &[u8],
    annotate: bool,
) -> Result<EngineOutput, DetectError> {
    let image =
        image::load_from_memory(data).map_err(|e| DetectError::Decode(e.to_string()))?;

    let raw = detector.detect(&image)?;
    let detections = normalize(&raw, detector.labels(), image.width(), image.height());
    tracing::debug!(count = detections.len(), "Detection pass complete");

    let annotated_png = if annotate {
        match annotate::render(&image, &detections) {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::warn!(error = %e, "Annotation failed, returning response without result image");
                None
            }
        }
    } else {
        None
    };

    Ok(EngineOutput {
        detections,
        annotated_png,
    })
}

/// Normalize raw model output into stable audit records: resolve the class
/// index against the label table (`class_<id>` when out of range), clamp
/// the score into [0, 1], and coerce the box to ordered integer pixel
/// coordinates clamped to the image rectangle.
fn normalize(raw: &[RawDetection], labels: &[String], width: u32, height: u32) -> Vec<Detection> {
    raw.iter()
        .map(|det| {
            let label = labels
                .get(det.class_id)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", det.class_id));

            let (x1, x2) = ordered(det.bbox[0], det.bbox[2]);
            let (y1, y2) = ordered(det.bbox[1], det.bbox[3]);

            Detection {
                label,
                confidence: det.score.clamp(0.0, 1.0),
                bbox: [
                    clamp_coord(x1, width),
                    clamp_coord(y1, height),
                    clamp_coord(x2, width),
                    clamp_coord(y2, height),
                ],
            }
        })
        .collect()
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn clamp_coord(value: f32, max: u32) -> i64 {
    (value.round() as i64).clamp(0, i64::from(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    struct StubDetector {
        result: Vec<RawDetection>,
        labels: Vec<String>,
    }

    impl StubDetector {
        fn returning(result: Vec<RawDetection>) -> Self {
            Self {
                result,
                labels: vec!["helmet".to_string(), "vest".to_string()],
            }
        }
    }

    impl ObjectDetector for StubDetector {
        fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, DetectError> {
            Ok(self.result.clone())
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode");
        buf
    }

    #[tokio::test]
    async fn test_run_normalizes_detections() {
        let engine = DetectionEngine::new(Arc::new(StubDetector::returning(vec![
            RawDetection {
                class_id: 1,
                score: 0.75,
                bbox: [1.2, 2.7, 10.4, 12.0],
            },
        ])));

        let out = engine.run(png_bytes(64, 64), false).await.expect("run");
        assert_eq!(out.detections.len(), 1);
        assert_eq!(out.detections[0].label, "vest");
        assert_eq!(out.detections[0].bbox, [1, 3, 10, 12]);
        assert!(out.annotated_png.is_none());
    }

    #[tokio::test]
    async fn test_run_orders_and_clamps_bbox() {
        // Inverted axes and coordinates past the image edge.
        let engine = DetectionEngine::new(Arc::new(StubDetector::returning(vec![
            RawDetection {
                class_id: 0,
                score: 1.7,
                bbox: [50.0, 90.0, -3.0, 10.0],
            },
        ])));

        let out = engine.run(png_bytes(40, 40), false).await.expect("run");
        let det = &out.detections[0];
        assert_eq!(det.bbox, [0, 10, 40, 40]);
        assert!(det.bbox[0] <= det.bbox[2] && det.bbox[1] <= det.bbox[3]);
        assert_eq!(det.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_run_labels_unknown_class_by_id() {
        let engine = DetectionEngine::new(Arc::new(StubDetector::returning(vec![
            RawDetection {
                class_id: 42,
                score: 0.5,
                bbox: [0.0, 0.0, 5.0, 5.0],
            },
        ])));

        let out = engine.run(png_bytes(16, 16), false).await.expect("run");
        assert_eq!(out.detections[0].label, "class_42");
    }

    #[tokio::test]
    async fn test_run_rejects_undecodable_payload() {
        let engine = DetectionEngine::new(Arc::new(StubDetector::returning(vec![])));
        let err = engine
            .run(b"definitely not an image".to_vec(), true)
            .await
            .expect_err("should fail");
        assert!(matches!(err, DetectError::Decode(_)));
    }

    #[tokio::test]
    async fn test_run_zero_detections_is_success() {
        let engine = DetectionEngine::new(Arc::new(StubDetector::returning(vec![])));
        let out = engine.run(png_bytes(16, 16), false).await.expect("run");
        assert!(out.detections.is_empty());
    }

    #[tokio::test]
    async fn test_run_annotates_when_requested() {
        let engine = DetectionEngine::new(Arc::new(StubDetector::returning(vec![
            RawDetection {
                class_id: 0,
                score: 0.9,
                bbox: [2.0, 2.0, 12.0, 12.0],
            },
        ])));

        let out = engine.run(png_bytes(32, 32), true).await.expect("run");
        let png = out.annotated_png.expect("annotated image");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
