//! Core types shared across the Guardian Eye workspace.
//!
//! This crate holds the unified error type, the environment-backed
//! configuration, and the domain models (detections, upload records,
//! response shapes) used by the database, detection, and API crates.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, LogLevel};
