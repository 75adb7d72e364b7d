//! YOLOv8-family ONNX backend.
//!
//! Loads the model once, letterboxes the input to a square tensor, decodes
//! the `[1, 4 + num_classes, num_anchors]` output head, and applies
//! per-class non-maximum suppression. Coordinates returned to the engine
//! are in source-image pixel space.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use tract_onnx::prelude::*;

use crate::detector::{ObjectDetector, RawDetection};
use crate::error::DetectError;
use crate::labels::COCO_LABELS;

const INPUT_SIZE: u32 = 640;
const LETTERBOX_FILL: f32 = 114.0 / 255.0;

type OnnxModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub struct YoloDetector {
    model: OnnxModel,
    labels: Vec<String>,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl YoloDetector {
    /// Load and optimize the ONNX model. Called once at process start; the
    /// returned detector is shared behind an `Arc` for the process lifetime.
    pub fn load(
        path: &Path,
        confidence_threshold: f32,
        iou_threshold: f32,
    ) -> Result<Self, DetectError> {
        let size = INPUT_SIZE as i32;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| {
                m.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
                )
            })
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| DetectError::Model(format!("failed to load model {:?}: {}", path, e)))?;

        Ok(Self {
            model,
            labels: COCO_LABELS.iter().map(|s| s.to_string()).collect(),
            confidence_threshold,
            iou_threshold,
        })
    }

    /// Letterbox the image into a square normalized tensor. Returns the
    /// tensor plus the scale and padding needed to map boxes back.
    fn preprocess(&self, image: &DynamicImage) -> (Tensor, f32, f32, f32) {
        let (orig_w, orig_h) = (image.width(), image.height());
        let size = INPUT_SIZE;
        let scale = f32::min(size as f32 / orig_w as f32, size as f32 / orig_h as f32);
        let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, size);
        let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, size);
        let pad_x = (size - new_w) / 2;
        let pad_y = (size - new_h) / 2;

        let resized = image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();

        let mut input = tract_ndarray::Array4::<f32>::from_elem(
            (1, 3, size as usize, size as usize),
            LETTERBOX_FILL,
        );
        for (x, y, pixel) in resized.enumerate_pixels() {
            let row = (y + pad_y) as usize;
            let col = (x + pad_x) as usize;
            input[[0, 0, row, col]] = pixel.0[0] as f32 / 255.0;
            input[[0, 1, row, col]] = pixel.0[1] as f32 / 255.0;
            input[[0, 2, row, col]] = pixel.0[2] as f32 / 255.0;
        }

        (input.into(), scale, pad_x as f32, pad_y as f32)
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, DetectError> {
        let (input, scale, pad_x, pad_y) = self.preprocess(image);

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| DetectError::Model(e.to_string()))?;
        let output = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| DetectError::Model(e.to_string()))?;
        let output = output
            .into_dimensionality::<tract_ndarray::Ix3>()
            .map_err(|e| DetectError::Model(format!("unexpected output shape: {}", e)))?;

        let candidates = decode_output(
            output,
            self.confidence_threshold,
            scale,
            pad_x,
            pad_y,
        );
        Ok(non_max_suppression(candidates, self.iou_threshold))
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Decode a `[1, 4 + nc, n]` YOLOv8 output head: per anchor, take the best
/// class score, drop anything under the confidence threshold, and map the
/// cx/cy/w/h box from letterbox space back to source pixels.
fn decode_output(
    output: tract_ndarray::ArrayView3<f32>,
    confidence_threshold: f32,
    scale: f32,
    pad_x: f32,
    pad_y: f32,
) -> Vec<RawDetection> {
    let num_classes = output.shape()[1].saturating_sub(4);
    let num_anchors = output.shape()[2];
    let mut detections = Vec::new();

    for anchor in 0..num_anchors {
        let mut class_id = 0;
        let mut score = 0.0f32;
        for class in 0..num_classes {
            let s = output[[0, 4 + class, anchor]];
            if s > score {
                score = s;
                class_id = class;
            }
        }
        if score < confidence_threshold {
            continue;
        }

        let cx = output[[0, 0, anchor]];
        let cy = output[[0, 1, anchor]];
        let w = output[[0, 2, anchor]];
        let h = output[[0, 3, anchor]];

        detections.push(RawDetection {
            class_id,
            score,
            bbox: [
                (cx - w / 2.0 - pad_x) / scale,
                (cy - h / 2.0 - pad_y) / scale,
                (cx + w / 2.0 - pad_x) / scale,
                (cy + h / 2.0 - pad_y) / scale,
            ],
        });
    }

    detections
}

/// Greedy per-class NMS: keep the highest-scoring box, drop same-class
/// boxes that overlap it beyond the IoU threshold.
fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    'candidates: for det in detections {
        for existing in &kept {
            if existing.class_id == det.class_id && iou(&existing.bbox, &det.bbox) > iou_threshold {
                continue 'candidates;
            }
        }
        kept.push(det);
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix1 = a[0].max(b[0]);
    let iy1 = a[1].max(b[1]);
    let ix2 = a[2].min(b[2]);
    let iy2 = a[3].min(b[3]);

    let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_disjoint_boxes_is_zero() {
        assert_eq!(iou(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }

    #[test]
    fn test_iou_identical_boxes_is_one() {
        let b = [5.0, 5.0, 15.0, 25.0];
        assert!((iou(&b, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // 10x10 boxes sharing a 5x10 strip: 50 / (100 + 100 - 50)
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [5.0, 0.0, 15.0, 10.0];
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlapping_same_class() {
        let dets = vec![
            RawDetection {
                class_id: 0,
                score: 0.9,
                bbox: [0.0, 0.0, 10.0, 10.0],
            },
            RawDetection {
                class_id: 0,
                score: 0.7,
                bbox: [1.0, 1.0, 11.0, 11.0],
            },
        ];
        let kept = non_max_suppression(dets, 0.45);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_overlapping_different_classes() {
        let dets = vec![
            RawDetection {
                class_id: 0,
                score: 0.9,
                bbox: [0.0, 0.0, 10.0, 10.0],
            },
            RawDetection {
                class_id: 7,
                score: 0.7,
                bbox: [1.0, 1.0, 11.0, 11.0],
            },
        ];
        assert_eq!(non_max_suppression(dets, 0.45).len(), 2);
    }

    #[test]
    fn test_nms_keeps_distant_same_class() {
        let dets = vec![
            RawDetection {
                class_id: 0,
                score: 0.9,
                bbox: [0.0, 0.0, 10.0, 10.0],
            },
            RawDetection {
                class_id: 0,
                score: 0.8,
                bbox: [100.0, 100.0, 110.0, 110.0],
            },
        ];
        assert_eq!(non_max_suppression(dets, 0.45).len(), 2);
    }

    #[test]
    fn test_decode_output_thresholds_and_maps_back() {
        // One anchor above threshold, one below, nc = 2, identity letterbox.
        let mut data = tract_ndarray::Array3::<f32>::zeros((1, 6, 2));
        // anchor 0: center (50, 40), 20x10 box, class 1 at 0.8
        data[[0, 0, 0]] = 50.0;
        data[[0, 1, 0]] = 40.0;
        data[[0, 2, 0]] = 20.0;
        data[[0, 3, 0]] = 10.0;
        data[[0, 5, 0]] = 0.8;
        // anchor 1: class 0 at 0.1, below threshold
        data[[0, 4, 1]] = 0.1;

        let dets = decode_output(data.view(), 0.25, 1.0, 0.0, 0.0);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert_eq!(dets[0].bbox, [40.0, 35.0, 60.0, 45.0]);
    }

    #[test]
    fn test_decode_output_undoes_letterbox() {
        // scale 0.5, pad (10, 0): source box should be doubled and shifted.
        let mut data = tract_ndarray::Array3::<f32>::zeros((1, 5, 1));
        data[[0, 0, 0]] = 60.0; // cx
        data[[0, 1, 0]] = 30.0; // cy
        data[[0, 2, 0]] = 20.0; // w
        data[[0, 3, 0]] = 20.0; // h
        data[[0, 4, 0]] = 0.9;

        let dets = decode_output(data.view(), 0.25, 0.5, 10.0, 0.0);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox, [80.0, 40.0, 120.0, 80.0]);
    }
}
