// src/processor.rs
//! Tabular and metrics derivation from a normalized candidate listing body.

use serde::Serialize;
use serde_json::Value;

use crate::extract::text_field;
use crate::session::FilterSet;

/// Summary counters shown above the candidate table. `page` and
/// `num_per_page` fall back to the submitted filter values when the body
/// omits them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingMetrics {
    pub total: Option<i64>,
    pub count: Option<i64>,
    pub page: i64,
    pub num_per_page: i64,
}

/// One flattened row of the candidate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub stage_id: String,
    pub stage_name: String,
    pub opening_id: String,
    pub opening_name: String,
    pub source: String,
    pub cv_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedListing {
    pub metrics: ListingMetrics,
    pub rows: Vec<CandidateRow>,
}

/// Flatten a successful candidate-list body into metrics plus table rows.
/// A missing or non-array `candidates` field yields an empty table, not an
/// error.
pub fn process_candidate_listing(body: &Value, filters: &FilterSet) -> ProcessedListing {
    let metrics = ListingMetrics {
        total: body.get("total").and_then(Value::as_i64),
        count: body.get("count").and_then(Value::as_i64),
        page: body
            .get("page")
            .and_then(Value::as_i64)
            .unwrap_or(i64::from(filters.page)),
        num_per_page: body
            .get("num_per_page")
            .and_then(Value::as_i64)
            .unwrap_or(i64::from(filters.page_size)),
    };

    let rows = body
        .get("candidates")
        .and_then(Value::as_array)
        .map(|candidates| candidates.iter().map(candidate_row).collect())
        .unwrap_or_default();

    ProcessedListing { metrics, rows }
}

fn candidate_row(candidate: &Value) -> CandidateRow {
    CandidateRow {
        id: text_field(candidate, "id").unwrap_or_default(),
        full_name: text_field(candidate, "name").unwrap_or_default(),
        email: text_field(candidate, "email").unwrap_or_default(),
        phone: text_field(candidate, "phone").unwrap_or_default(),
        stage_id: text_field(candidate, "stage").unwrap_or_default(),
        stage_name: text_field(candidate, "stage_name").unwrap_or_default(),
        opening_id: text_field(candidate, "opening_id").unwrap_or_default(),
        opening_name: candidate
            .get("opening_export")
            .and_then(|opening| text_field(opening, "name"))
            .unwrap_or_default(),
        source: text_field(candidate, "source").unwrap_or_default(),
        cv_link: first_cv_link(candidate),
    }
}

/// The upstream stores CVs either as bare URL strings or as objects with a
/// `url` field; the table links the first one.
fn first_cv_link(candidate: &Value) -> Option<String> {
    let first = candidate.get("cvs").and_then(Value::as_array)?.first()?;
    match first {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Object(_) => text_field(first, "url"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::TransportMode;
    use serde_json::json;

    fn filters() -> FilterSet {
        FilterSet::sanitized("op-1", "st-2", 2, 25, TransportMode::Direct)
    }

    #[test]
    fn test_metrics_from_body_with_filter_fallbacks() {
        let body = json!({"total": 120, "count": 25, "candidates": []});
        let processed = process_candidate_listing(&body, &filters());
        assert_eq!(processed.metrics.total, Some(120));
        assert_eq!(processed.metrics.count, Some(25));
        assert_eq!(processed.metrics.page, 2);
        assert_eq!(processed.metrics.num_per_page, 25);
    }

    #[test]
    fn test_rows_flatten_candidate_fields() {
        let body = json!({
            "page": 1,
            "candidates": [{
                "id": 7,
                "name": "Linh Tran",
                "email": "linh@example.com",
                "phone": "0901",
                "stage": "s-3",
                "stage_name": "Interview",
                "opening_id": 12,
                "opening_export": {"name": "Backend Engineer"},
                "source": "referral",
                "cvs": ["https://files/cv-7.pdf"]
            }]
        });
        let processed = process_candidate_listing(&body, &filters());
        assert_eq!(processed.rows.len(), 1);

        let row = &processed.rows[0];
        assert_eq!(row.id, "7");
        assert_eq!(row.full_name, "Linh Tran");
        assert_eq!(row.stage_name, "Interview");
        assert_eq!(row.opening_id, "12");
        assert_eq!(row.opening_name, "Backend Engineer");
        assert_eq!(row.cv_link.as_deref(), Some("https://files/cv-7.pdf"));
    }

    #[test]
    fn test_cv_link_accepts_object_form() {
        let body = json!({"candidates": [{"id": 1, "cvs": [{"url": "https://files/cv.pdf"}]}]});
        let processed = process_candidate_listing(&body, &filters());
        assert_eq!(
            processed.rows[0].cv_link.as_deref(),
            Some("https://files/cv.pdf")
        );
    }

    #[test]
    fn test_missing_candidates_array_yields_empty_table() {
        let processed = process_candidate_listing(&json!({"total": 0}), &filters());
        assert!(processed.rows.is_empty());
        assert_eq!(processed.metrics.total, Some(0));
    }
}
