use guardian_core::AppError;

/// Errors from the detection engine and its model backend.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// The payload is not a decodable image. Distinct from "zero
    /// detections", which is a successful result.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The model rejected an otherwise decodable input, or inference
    /// itself failed.
    #[error("model inference failed: {0}")]
    Model(String),

    /// Drawing or re-encoding the annotated copy failed. Swallowed by the
    /// engine; never fails a request.
    #[error("failed to annotate image: {0}")]
    Annotation(String),

    /// The blocking inference task could not complete (panic or shutdown).
    #[error("inference task failed: {0}")]
    Runtime(String),
}

impl From<DetectError> for AppError {
    fn from(err: DetectError) -> Self {
        match err {
            DetectError::Decode(msg) | DetectError::Model(msg) => AppError::Detection(msg),
            DetectError::Annotation(msg) => AppError::Internal(msg),
            DetectError::Runtime(msg) => AppError::Internal(msg),
        }
    }
}
