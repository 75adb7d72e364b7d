//! Bearer-token authentication against the external identity provider.

pub mod middleware;
pub mod models;
pub mod verifier;

pub use middleware::{auth_middleware, AuthState};
pub use models::AuthContext;
pub use verifier::{JwksVerifier, TokenVerifier};
