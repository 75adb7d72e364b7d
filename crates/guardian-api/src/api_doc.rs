//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Guardian Eye API",
        description = "Upload images for safety-equipment detection and query the audit history."
    ),
    paths(
        crate::handlers::upload::upload,
        crate::handlers::history::history,
        crate::handlers::analytics::analytics,
    ),
    components(schemas(
        guardian_core::models::Detection,
        guardian_core::models::UploadResponse,
        guardian_core::models::HistoryEntry,
        guardian_core::models::HistoryResponse,
        guardian_core::models::AnalyticsResponse,
        crate::error::ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "uploads", description = "Upload and detection endpoints"),
        (name = "history", description = "Audit history queries")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
