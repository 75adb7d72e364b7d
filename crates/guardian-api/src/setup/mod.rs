//! Application setup and initialization
//!
//! All bootstrap logic lives here so main.rs stays a thin entry point.

pub mod database;
pub mod detector;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use guardian_core::Config;
use guardian_db::UploadRepository;
use guardian_detect::DetectionEngine;

use crate::auth::{AuthState, JwksVerifier};
use crate::services::upload::StagingArea;
use crate::state::AppState;

/// Initialize the entire application: telemetry, database, the detection
/// model (loaded exactly once), the staging directory, and the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_tracing();
    tracing::info!(environment = %config.environment(), "Configuration loaded");

    let pool = database::setup_database(&config).await?;

    let detector = detector::setup_detector(&config)?;
    let engine = DetectionEngine::new(detector);

    tokio::fs::create_dir_all(config.staging_dir())
        .await
        .with_context(|| format!("Failed to create staging directory {}", config.staging_dir()))?;
    let staging = StagingArea::new(config.staging_dir());

    let verifier = JwksVerifier::new(
        config.auth_jwks_url(),
        config.auth_issuer().map(str::to_string),
        config.auth_audience().map(str::to_string),
    );
    let auth_state = Arc::new(AuthState {
        verifier: Arc::new(verifier),
    });

    let state = Arc::new(AppState {
        pool: pool.clone(),
        uploads: UploadRepository::new(pool),
        engine,
        staging,
        max_upload_size: config.max_upload_size_bytes(),
    });

    let router = routes::setup_routes(&config, state.clone(), auth_state)?;

    Ok((state, router))
}
