//! Request-scoped transient assets.
//!
//! Every upload stages its payload (and, for images, the annotated copy)
//! under a unique name in a shared staging directory. Uniqueness is what
//! makes concurrent uploads safe without coordination. Release is
//! idempotent, and `Drop` performs the same best-effort removal, so a
//! staged file cannot outlive its request on any exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use guardian_core::AppError;
use uuid::Uuid;

/// Shared staging directory. Created once at bootstrap.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: Arc<PathBuf>,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    /// Write the payload under a fresh uuid name, preserving the original
    /// extension for downstream tools that dispatch on it. The file is
    /// fully written before the handle is returned.
    pub async fn stage(
        &self,
        data: &[u8],
        original_filename: &str,
    ) -> Result<StagedAsset, AppError> {
        let path = self.dir.join(unique_name(original_filename));
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;
        Ok(StagedAsset { path: Some(path) })
    }
}

fn unique_name(original_filename: &str) -> String {
    match Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Handle to one staged file.
///
/// The path is an explicit empty-able state: a handle that was never staged
/// (or already released) releases as a no-op rather than an error.
#[derive(Debug, Default)]
pub struct StagedAsset {
    path: Option<PathBuf>,
}

impl StagedAsset {
    /// A handle with nothing behind it; releasing it is a no-op.
    pub fn empty() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Remove the staged file. Idempotent: a second call, or a call on a
    /// handle that never staged anything, does nothing. A file already
    /// removed out from under us is not an error either.
    pub fn release(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged file");
                }
            }
        }
    }
}

impl Drop for StagedAsset {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staging() -> (TempDir, StagingArea) {
        let dir = TempDir::new().expect("tempdir");
        let area = StagingArea::new(dir.path());
        (dir, area)
    }

    #[tokio::test]
    async fn test_stage_writes_file_before_returning() {
        let (_dir, area) = staging();
        let asset = area.stage(b"payload", "photo.png").await.expect("stage");
        let path = asset.path().expect("path");
        assert_eq!(std::fs::read(path).expect("read"), b"payload");
    }

    #[tokio::test]
    async fn test_stage_preserves_extension_with_unique_stem() {
        let (_dir, area) = staging();
        let a = area.stage(b"a", "scene.JPG").await.expect("stage");
        let b = area.stage(b"b", "scene.JPG").await.expect("stage");
        let a_path = a.path().expect("path").to_path_buf();
        let b_path = b.path().expect("path").to_path_buf();
        assert_ne!(a_path, b_path);
        assert_eq!(a_path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }

    #[tokio::test]
    async fn test_stage_without_extension() {
        let (_dir, area) = staging();
        let asset = area.stage(b"a", "no-extension").await.expect("stage");
        assert!(asset.path().expect("path").extension().is_none());
    }

    #[tokio::test]
    async fn test_release_removes_file() {
        let (_dir, area) = staging();
        let mut asset = area.stage(b"x", "a.png").await.expect("stage");
        let path = asset.path().expect("path").to_path_buf();
        asset.release();
        assert!(!path.exists());
        assert!(asset.path().is_none());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (_dir, area) = staging();
        let mut asset = area.stage(b"x", "a.png").await.expect("stage");
        asset.release();
        asset.release();
    }

    #[tokio::test]
    async fn test_release_of_empty_handle_is_noop() {
        let mut asset = StagedAsset::empty();
        asset.release();
        assert!(asset.path().is_none());
    }

    #[tokio::test]
    async fn test_release_tolerates_already_removed_file() {
        let (_dir, area) = staging();
        let mut asset = area.stage(b"x", "a.png").await.expect("stage");
        std::fs::remove_file(asset.path().expect("path")).expect("external removal");
        asset.release();
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let (_dir, area) = staging();
        let path = {
            let asset = area.stage(b"x", "a.png").await.expect("stage");
            asset.path().expect("path").to_path_buf()
        };
        assert!(!path.exists());
    }
}
