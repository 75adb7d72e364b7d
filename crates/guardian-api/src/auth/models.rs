use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::error::ErrorResponse;

/// Authenticated caller, extracted from a verified bearer token and stored
/// in request extensions by the auth middleware. `user_id` is the identity
/// provider's subject identifier; every audit record is scoped to it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
}

/// Claims we read from a verified token. Expiry, issuer, and audience are
/// enforced by the verifier's `Validation`, not deserialized here.
#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: String,
}

// Implement FromRequestParts for AuthContext so handlers taking Multipart
// can still extract it (Extension cannot be combined with Multipart).
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Invalid or expired token".to_string(),
                        code: "unauthorized".to_string(),
                        details: None,
                    }),
                )
            })
    }
}
