//! Object detection for uploaded images.
//!
//! The [`ObjectDetector`] trait is the boundary to the model itself; the
//! shipped implementation ([`YoloDetector`]) runs a YOLOv8-family ONNX
//! model on the CPU via tract. [`DetectionEngine`] wraps a detector with
//! decoding, output normalization, and optional bounding-box annotation,
//! and dispatches the CPU-bound work onto the blocking thread pool so
//! inference never stalls the async runtime.
//!
//! The detector is loaded once at process start and shared read-only; it is
//! never reloaded per request.

mod annotate;
mod detector;
mod engine;
mod error;
mod labels;
mod yolo;

pub use detector::{ObjectDetector, RawDetection};
pub use engine::{DetectionEngine, EngineOutput};
pub use error::DetectError;
pub use labels::COCO_LABELS;
pub use yolo::YoloDetector;
