// src/session.rs
//! Session-scoped presentation cache: the last completed query, the current
//! candidate selection, and the replay path that lets an unrelated action
//! redraw the results list without a new network call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::transport::{ResponseEnvelope, TransportMode};

pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Operator-entered query filters. Immutable once submitted; a new set
/// replaces the prior one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub opening_id: String,
    pub stage_id: String,
    pub page: u32,
    pub page_size: u32,
    pub transport_mode: TransportMode,
}

impl FilterSet {
    /// Build a sanitized filter set from raw form input: ids trimmed, page
    /// coerced to at least 1, page size clamped into 1..=100.
    pub fn sanitized(
        opening_id: &str,
        stage_id: &str,
        page: i64,
        page_size: i64,
        transport_mode: TransportMode,
    ) -> Self {
        Self {
            opening_id: opening_id.trim().to_string(),
            stage_id: stage_id.trim().to_string(),
            page: page.clamp(1, i64::from(u32::MAX)) as u32,
            page_size: page_size.clamp(i64::from(MIN_PAGE_SIZE), i64::from(MAX_PAGE_SIZE)) as u32,
            transport_mode,
        }
    }

    /// Re-apply the sanitization rules to an already-built set.
    pub fn sanitize(self) -> Self {
        Self::sanitized(
            &self.opening_id,
            &self.stage_id,
            i64::from(self.page),
            i64::from(self.page_size),
            self.transport_mode,
        )
    }
}

/// The four fields of the last completed query. They live in one record so
/// replacement is atomic by construction: a reader can never observe a 200
/// status next to a body from a previous filter set.
#[derive(Debug, Clone)]
struct LastQuery {
    filters: FilterSet,
    status: u16,
    body: Option<Value>,
    raw_text: String,
}

/// Process of record for one operator session. Created empty at session
/// start; mutated only by the query orchestrator on submit and by the
/// selection actions; dropped at session end.
#[derive(Debug, Default)]
pub struct SessionCache {
    last: Option<LastQuery>,
    selected_candidate_id: Option<String>,
    detail_visible: bool,
    token_in_use: String,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_token(&mut self, token: &str) {
        self.token_in_use = token.to_string();
    }

    pub fn token_in_use(&self) -> &str {
        &self.token_in_use
    }

    /// Store a successful query: all four fields replaced together. The
    /// selection state is deliberately left alone.
    pub(crate) fn record_success(&mut self, filters: FilterSet, envelope: &ResponseEnvelope) {
        self.last = Some(LastQuery {
            filters,
            status: envelope.status_code,
            body: Some(envelope.body.clone()),
            raw_text: envelope.raw_text.clone(),
        });
    }

    /// Store a failed query: status and raw text kept for display, body
    /// cleared so a failed re-query cannot resurrect stale candidate rows.
    pub(crate) fn record_failure(&mut self, filters: FilterSet, status: u16, raw_text: String) {
        self.last = Some(LastQuery {
            filters,
            status,
            body: None,
            raw_text,
        });
    }

    /// Rebuild the last response without touching the network. `None` until
    /// a query has completed. A cleared body replays as an empty object so
    /// callers can test for emptiness before rendering rows. Read-only:
    /// consecutive calls yield identical envelopes.
    pub fn replay(&self) -> Option<ResponseEnvelope> {
        self.last.as_ref().map(|last| ResponseEnvelope {
            status_code: last.status,
            body: last
                .body
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
            raw_text: last.raw_text.clone(),
        })
    }

    pub fn last_filters(&self) -> Option<&FilterSet> {
        self.last.as_ref().map(|last| &last.filters)
    }

    /// Mark a candidate as selected and open the detail view. Both fields
    /// move together, which is what keeps `detail_visible == true` implying
    /// a selected id at every point in the session.
    pub fn select_candidate(&mut self, candidate_id: impl Into<String>) {
        self.selected_candidate_id = Some(candidate_id.into());
        self.detail_visible = true;
    }

    /// Dismiss the detail view and drop the selection.
    pub fn close_detail(&mut self) {
        self.detail_visible = false;
        self.selected_candidate_id = None;
    }

    pub fn selected_candidate_id(&self) -> Option<&str> {
        self.selected_candidate_id.as_deref()
    }

    pub fn detail_visible(&self) -> bool {
        self.detail_visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters() -> FilterSet {
        FilterSet::sanitized("op-1", "st-2", 1, 50, TransportMode::Direct)
    }

    #[test]
    fn test_sanitized_trims_and_clamps() {
        let filters = FilterSet::sanitized("  op-1 ", " st-2", 0, 250, TransportMode::Relay);
        assert_eq!(filters.opening_id, "op-1");
        assert_eq!(filters.stage_id, "st-2");
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, 100);

        let filters = FilterSet::sanitized("op", "", -3, 0, TransportMode::Direct);
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, 1);
    }

    #[test]
    fn test_replay_is_none_before_any_query() {
        let cache = SessionCache::new();
        assert!(cache.replay().is_none());
        assert!(cache.last_filters().is_none());
    }

    #[test]
    fn test_replay_matches_recorded_success_and_is_idempotent() {
        let mut cache = SessionCache::new();
        let envelope =
            ResponseEnvelope::from_text(200, r#"{"candidates":[{"id":"7"}]}"#.to_string());
        cache.record_success(filters(), &envelope);

        let first = cache.replay().unwrap();
        assert_eq!(first, envelope);

        let second = cache.replay().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_failure_clears_body_but_keeps_status_and_text() {
        let mut cache = SessionCache::new();
        let envelope = ResponseEnvelope::from_text(200, r#"{"candidates":[1]}"#.to_string());
        cache.record_success(filters(), &envelope);
        cache.record_failure(filters(), 403, "forbidden".to_string());

        let replayed = cache.replay().unwrap();
        assert_eq!(replayed.status_code, 403);
        assert_eq!(replayed.body, json!({}));
        assert!(replayed.body_is_empty());
        assert_eq!(replayed.raw_text, "forbidden");
    }

    #[test]
    fn test_selection_invariant_holds_through_select_and_close() {
        let mut cache = SessionCache::new();
        assert!(!cache.detail_visible());
        assert!(cache.selected_candidate_id().is_none());

        cache.select_candidate("42");
        assert!(cache.detail_visible());
        assert_eq!(cache.selected_candidate_id(), Some("42"));

        cache.close_detail();
        assert!(!cache.detail_visible());
        assert!(cache.selected_candidate_id().is_none());
    }

    #[test]
    fn test_submit_does_not_touch_selection() {
        let mut cache = SessionCache::new();
        cache.select_candidate("42");

        let envelope = ResponseEnvelope::from_text(200, r#"{"candidates":[]}"#.to_string());
        cache.record_success(filters(), &envelope);
        assert_eq!(cache.selected_candidate_id(), Some("42"));
        assert!(cache.detail_visible());

        cache.record_failure(filters(), 500, "boom".to_string());
        assert_eq!(cache.selected_candidate_id(), Some("42"));
        assert!(cache.detail_visible());
    }
}
