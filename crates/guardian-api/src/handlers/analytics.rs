use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use guardian_core::models::{AnalyticsResponse, Detection};
use guardian_db::{HistoryFilter, UploadRow};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsParams {
    /// Inclusive ISO-8601 lower bound on upload time
    pub start_date: Option<String>,
    /// Inclusive ISO-8601 upper bound on upload time
    pub end_date: Option<String>,
}

/// Analytics handler
///
/// Aggregates the caller's detection history into per-label totals and
/// per-day trends, optionally restricted to a time range.
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "history",
    params(AnalyticsParams),
    responses(
        (status = 200, description = "Aggregated detection counts", body = AnalyticsResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %ctx.user_id, operation = "analytics")
)]
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsResponse>, HttpAppError> {
    let filter = HistoryFilter {
        filename: None,
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let rows = state.uploads.query_all(&ctx.user_id, &filter).await?;

    Ok(Json(aggregate(&rows)))
}

/// Fold upload rows into totals. A row with unparseable detection results
/// still counts as an upload; its labels are just skipped.
fn aggregate(rows: &[UploadRow]) -> AnalyticsResponse {
    let mut response = AnalyticsResponse {
        total_uploads: rows.len() as i64,
        ..Default::default()
    };

    for row in rows {
        let detections: Vec<Detection> = match serde_json::from_str(&row.detection_results) {
            Ok(detections) => detections,
            Err(e) => {
                tracing::warn!(
                    upload_id = row.id,
                    error = %e,
                    "Stored detection results are not valid JSON"
                );
                continue;
            }
        };

        // Day bucket: the YYYY-MM-DD prefix of the ISO-8601 upload time.
        let day = row.upload_time.get(..10).unwrap_or(&row.upload_time);
        for det in &detections {
            *response
                .label_counts
                .entry(det.label.clone())
                .or_insert(0) += 1;
            *response
                .daily_trends
                .entry(day.to_string())
                .or_default()
                .entry(det.label.clone())
                .or_insert(0) += 1;
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, upload_time: &str, detection_results: &str) -> UploadRow {
        UploadRow {
            id,
            user_id: "u1".into(),
            filename: "site.png".into(),
            upload_time: upload_time.into(),
            detection_results: detection_results.into(),
        }
    }

    #[test]
    fn test_aggregate_counts_labels_across_uploads() {
        let rows = vec![
            row(
                1,
                "2026-08-07T09:00:00.000000",
                r#"[{"label":"helmet","confidence":0.9,"bbox":[0,0,1,1]},
                    {"label":"person","confidence":0.8,"bbox":[0,0,2,2]}]"#,
            ),
            row(
                2,
                "2026-08-08T10:00:00.000000",
                r#"[{"label":"helmet","confidence":0.7,"bbox":[0,0,1,1]}]"#,
            ),
        ];

        let result = aggregate(&rows);
        assert_eq!(result.total_uploads, 2);
        assert_eq!(result.label_counts["helmet"], 2);
        assert_eq!(result.label_counts["person"], 1);
        assert_eq!(result.daily_trends["2026-08-07"]["person"], 1);
        assert_eq!(result.daily_trends["2026-08-08"]["helmet"], 1);
        assert!(result.daily_trends["2026-08-08"].get("person").is_none());
    }

    #[test]
    fn test_aggregate_counts_corrupt_rows_as_uploads_only() {
        let rows = vec![row(1, "2026-08-08T10:00:00.000000", "not json")];
        let result = aggregate(&rows);
        assert_eq!(result.total_uploads, 1);
        assert!(result.label_counts.is_empty());
        assert!(result.daily_trends.is_empty());
    }

    #[test]
    fn test_aggregate_empty_history() {
        let result = aggregate(&[]);
        assert_eq!(result.total_uploads, 0);
        assert!(result.label_counts.is_empty());
    }
}
