//! Configuration module
//!
//! Environment-backed configuration read once at process start. Defaults
//! are chosen so a local developer setup (Postgres on localhost, model file
//! next to the binary, Vite frontend origins) works without a .env file.

use std::env;

use anyhow::{Context, Result};

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STAGING_DIR: &str = "temp_uploads";
const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    cors_origins: Vec<String>,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    staging_dir: String,
    model_path: String,
    confidence_threshold: f32,
    iou_threshold: f32,
    max_upload_size_bytes: usize,
    auth_jwks_url: String,
    auth_issuer: Option<String>,
    auth_audience: Option<String>,
    environment: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` and `AUTH_JWKS_URL` are required; everything else has
    /// a development default.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let auth_jwks_url =
            env::var("AUTH_JWKS_URL").context("AUTH_JWKS_URL environment variable is required")?;

        Ok(Self {
            server_port: parse_env("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,
            staging_dir: env::var("STAGING_DIR").unwrap_or_else(|_| DEFAULT_STAGING_DIR.into()),
            model_path: env::var("MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL_PATH.into()),
            confidence_threshold: parse_env(
                "MODEL_CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            )?,
            iou_threshold: parse_env("MODEL_IOU_THRESHOLD", DEFAULT_IOU_THRESHOLD)?,
            max_upload_size_bytes: parse_env(
                "MAX_UPLOAD_SIZE_BYTES",
                DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            )?,
            auth_jwks_url,
            auth_issuer: env::var("AUTH_ISSUER").ok(),
            auth_audience: env::var("AUTH_AUDIENCE").ok(),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        })
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn staging_dir(&self) -> &str {
        &self.staging_dir
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_bytes
    }

    pub fn auth_jwks_url(&self) -> &str {
        &self.auth_jwks_url
    }

    pub fn auth_issuer(&self) -> Option<&str> {
        self.auth_issuer.as_deref()
    }

    pub fn auth_audience(&self) -> Option<&str> {
        self.auth_audience.as_deref()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production") || self.environment.eq_ignore_ascii_case("prod")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
