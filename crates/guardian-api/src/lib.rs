//! Guardian Eye API server
//!
//! HTTP surface for the upload-detect-persist-query pipeline: bearer-token
//! authentication, multipart image upload with transient staging, the
//! detection engine invocation, the audit log insert, and the filtered,
//! paginated history read.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
