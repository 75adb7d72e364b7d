//! Database repositories for the upload audit log.

mod upload_repository;

pub use upload_repository::{HistoryFilter, UploadRepository, UploadRow};
