use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use guardian_core::models::{total_pages, Detection, HistoryEntry, HistoryResponse};
use guardian_core::AppError;
use guardian_db::{HistoryFilter, UploadRow};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size, 1..=100
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Substring match on the original filename
    pub filename: Option<String>,
    /// Inclusive ISO-8601 lower bound on upload time
    pub start_date: Option<String>,
    /// Inclusive ISO-8601 upper bound on upload time
    pub end_date: Option<String>,
}

/// History handler
///
/// Filtered, paginated read of the caller's own audit log, newest first.
/// `total` counts every matching row before pagination; a page past the end
/// returns an empty list, not an error.
#[utoipa::path(
    get,
    path = "/history",
    tag = "history",
    params(HistoryParams),
    responses(
        (status = 200, description = "One page of upload history", body = HistoryResponse),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %ctx.user_id, operation = "history")
)]
pub async fn history(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, HttpAppError> {
    if params.page < 1 {
        return Err(AppError::InvalidInput("page must be >= 1".to_string()).into());
    }
    if params.per_page < 1 || params.per_page > MAX_PER_PAGE {
        return Err(AppError::InvalidInput(format!(
            "per_page must be between 1 and {}",
            MAX_PER_PAGE
        ))
        .into());
    }

    let filter = HistoryFilter {
        filename: params.filename,
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let (rows, total) = state
        .uploads
        .query_page(&ctx.user_id, &filter, params.page, params.per_page)
        .await?;

    Ok(Json(HistoryResponse {
        uploads: rows.into_iter().map(row_to_entry).collect(),
        total,
        page: params.page,
        per_page: params.per_page,
        total_pages: total_pages(total, params.per_page),
    }))
}

/// A row that fails to parse degrades to an empty detection list rather
/// than failing the whole page.
fn row_to_entry(row: UploadRow) -> HistoryEntry {
    let detections: Vec<Detection> =
        serde_json::from_str(&row.detection_results).unwrap_or_else(|e| {
            tracing::warn!(
                upload_id = row.id,
                error = %e,
                "Stored detection results are not valid JSON"
            );
            Vec::new()
        });

    HistoryEntry {
        id: row.id,
        filename: row.filename,
        upload_time: row.upload_time,
        detections,
    }
}
