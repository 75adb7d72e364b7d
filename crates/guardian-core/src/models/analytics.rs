use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

/// Aggregated view of a user's detection history.
///
/// `label_counts` sums detections per label across the selected range;
/// `daily_trends` breaks the same counts down per day (keyed by the
/// `YYYY-MM-DD` prefix of the upload time).
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub total_uploads: i64,
    pub label_counts: BTreeMap<String, i64>,
    pub daily_trends: BTreeMap<String, BTreeMap<String, i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_analytics_serializes_as_objects() {
        let json = serde_json::to_value(AnalyticsResponse::default()).expect("serialize");
        assert_eq!(json["total_uploads"], 0);
        assert!(json["label_counts"].is_object());
        assert!(json["daily_trends"].is_object());
    }
}
