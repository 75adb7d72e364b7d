//! Upload audit log repository
//!
//! Append-mostly store of completed upload-and-detect operations. Inserts
//! happen exactly once per accepted upload; reads are always scoped to the
//! owning user and support optional conjunctive filters with pagination.
//!
//! Filter values are ALWAYS bound parameters. The WHERE clause is assembled
//! from fixed clause text with numbered placeholders tracked by a running
//! `param_index`; no user-supplied value ever reaches the query text.

use guardian_core::AppError;
use sqlx::PgPool;

/// Optional conjunctive filters for history queries.
///
/// `start_date` / `end_date` are ISO-8601 strings compared (inclusively)
/// against the stored `upload_time` text; `filename` is a literal substring
/// match.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub filename: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Raw row from the `uploads` table. `detection_results` stays JSON text
/// here; the API layer decides how to present it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UploadRow {
    pub id: i64,
    pub user_id: String,
    pub filename: String,
    pub upload_time: String,
    pub detection_results: String,
}

/// Repository for the `uploads` audit table.
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one upload record and return its store-assigned id.
    ///
    /// Single atomic statement; the returned id is visible to any query
    /// issued after this call completes.
    pub async fn insert(
        &self,
        user_id: &str,
        filename: &str,
        upload_time: &str,
        detection_results: &str,
    ) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO uploads (user_id, filename, upload_time, detection_results)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(filename)
        .bind(upload_time)
        .bind(detection_results)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Fetch one page of a user's history plus the total count of rows
    /// matching the same predicate (computed before pagination).
    ///
    /// Ordering is `upload_time DESC, id DESC`: newest first, deterministic
    /// under equal timestamps.
    pub async fn query_page(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<UploadRow>, i64), AppError> {
        let (where_clause, binds, param_index) = build_where(filter);

        let count_sql = format!("SELECT COUNT(*) FROM uploads WHERE {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(user_id);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let rows_sql = format!(
            r#"
            SELECT id, user_id, filename, upload_time, detection_results
            FROM uploads
            WHERE {}
            ORDER BY upload_time DESC, id DESC
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            param_index,
            param_index + 1
        );

        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
        let mut rows_query = sqlx::query_as::<_, UploadRow>(&rows_sql).bind(user_id);
        for value in &binds {
            rows_query = rows_query.bind(value);
        }
        let rows = rows_query
            .bind(i64::from(per_page))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Fetch every row matching the filter, oldest first. Used by the
    /// analytics aggregation, which consumes the whole range.
    pub async fn query_all(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<UploadRow>, AppError> {
        let (where_clause, binds, _) = build_where(filter);

        let sql = format!(
            r#"
            SELECT id, user_id, filename, upload_time, detection_results
            FROM uploads
            WHERE {}
            ORDER BY upload_time ASC, id ASC
            "#,
            where_clause
        );

        let mut query = sqlx::query_as::<_, UploadRow>(&sql).bind(user_id);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows)
    }
}

/// Assemble the WHERE clause for a history query.
///
/// Returns the clause text, the values to bind after `user_id` ($1), and
/// the next free parameter index.
fn build_where(filter: &HistoryFilter) -> (String, Vec<String>, u32) {
    let mut where_parts = vec!["user_id = $1".to_string()];
    let mut binds = Vec::new();
    let mut param_index = 2;

    if let Some(ref filename) = filter.filename {
        where_parts.push(format!(
            "filename ILIKE ${} ESCAPE '\\'",
            param_index
        ));
        binds.push(format!("%{}%", escape_like(filename)));
        param_index += 1;
    }

    if let Some(ref start) = filter.start_date {
        where_parts.push(format!("upload_time >= ${}", param_index));
        binds.push(start.clone());
        param_index += 1;
    }

    if let Some(ref end) = filter.end_date {
        where_parts.push(format!("upload_time <= ${}", param_index));
        binds.push(end.clone());
        param_index += 1;
    }

    (where_parts.join(" AND "), binds, param_index)
}

/// Escape LIKE wildcards so a filename filter matches literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters_is_owner_scope_only() {
        let (clause, binds, next) = build_where(&HistoryFilter::default());
        assert_eq!(clause, "user_id = $1");
        assert!(binds.is_empty());
        assert_eq!(next, 2);
    }

    #[test]
    fn test_all_filters_compose_conjunctively() {
        let filter = HistoryFilter {
            filename: Some("site".into()),
            start_date: Some("2026-01-01".into()),
            end_date: Some("2026-02-01".into()),
        };
        let (clause, binds, next) = build_where(&filter);
        assert_eq!(
            clause,
            "user_id = $1 AND filename ILIKE $2 ESCAPE '\\' AND upload_time >= $3 AND upload_time <= $4"
        );
        assert_eq!(binds, vec!["%site%", "2026-01-01", "2026-02-01"]);
        assert_eq!(next, 5);
    }

    #[test]
    fn test_placeholders_renumber_when_filters_are_skipped() {
        let filter = HistoryFilter {
            filename: None,
            start_date: None,
            end_date: Some("2026-02-01".into()),
        };
        let (clause, binds, next) = build_where(&filter);
        assert_eq!(clause, "user_id = $1 AND upload_time <= $2");
        assert_eq!(binds, vec!["2026-02-01"]);
        assert_eq!(next, 3);
    }

    #[test]
    fn test_filename_filter_is_bound_not_interpolated() {
        let filter = HistoryFilter {
            filename: Some("'; DROP TABLE uploads; --".into()),
            ..Default::default()
        };
        let (clause, binds, _) = build_where(&filter);
        assert!(!clause.contains("DROP"));
        assert_eq!(binds.len(), 1);
        assert!(binds[0].contains("DROP TABLE"));
    }

    #[test]
    fn test_like_wildcards_match_literally() {
        assert_eq!(escape_like("report_v1"), "report\\_v1");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain.png"), "plain.png");
    }
}
