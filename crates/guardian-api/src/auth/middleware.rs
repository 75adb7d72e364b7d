use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use guardian_core::AppError;

use super::verifier::TokenVerifier;
use crate::error::HttpAppError;

/// Shared state for the bearer-auth middleware.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Verify the bearer credential and attach [`super::AuthContext`] to the
/// request. Runs before any handler work, so nothing is staged or queried
/// for an unauthenticated caller. All rejections share one generic 401.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(header_value) = header_value else {
        return HttpAppError(AppError::Unauthorized(
            "Missing authorization header".to_string(),
        ))
        .into_response();
    };

    let Some(token) = header_value.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match auth_state.verifier.verify(token).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
