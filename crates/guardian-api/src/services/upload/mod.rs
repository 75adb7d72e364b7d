//! Upload pipeline: staging, detection, persistence, response shaping.

mod service;
mod staging;

pub use service::process_upload;
pub use staging::{StagedAsset, StagingArea};
