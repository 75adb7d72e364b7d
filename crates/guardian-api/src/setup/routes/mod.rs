//! Route configuration and setup.
//!
//! Public routes (liveness, health, OpenAPI) merge with the protected
//! routes (upload, history) behind the bearer-auth middleware.

mod health;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use guardian_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthState};
use crate::state::AppState;

// Multipart framing overhead on top of the payload itself.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
    auth_state: Arc<AuthState>,
) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    Ok(app_router(state, auth_state).layer(cors))
}

/// Router without the CORS layer; integration tests build on this directly.
pub fn app_router(state: Arc<AppState>, auth_state: Arc<AuthState>) -> Router {
    let body_limit = state.max_upload_size + BODY_LIMIT_SLACK;

    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/upload", post(crate::handlers::upload::upload))
        .route("/history", get(crate::handlers::history::history))
        .route("/analytics", get(crate::handlers::analytics::analytics))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Root test route - confirms the service is up.
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Guardian Eye backend is running!" }))
}

async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse())
            .collect::<Result<Vec<HeaderValue>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
    };
    Ok(cors)
}
