// src/query.rs
//! Query orchestration: validates operator input, dispatches through the
//! chosen transport, and keeps the session cache consistent.

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::transport::{CandidateTransport, ResponseEnvelope, TransportMode};
use crate::session::{FilterSet, SessionCache};

#[derive(Debug, Error)]
pub enum QueryError {
    /// No bearer token supplied. Surfaced as a blocking warning; no network
    /// call is made and the cache is untouched.
    #[error("access token is required before querying candidates")]
    MissingCredential,
    /// Network-level failure before any status code arrived. The cached
    /// query is left as it was.
    #[error("transport failure: {0}")]
    Transport(anyhow::Error),
}

/// Owns both transports and routes each submit through the one named by the
/// filter set.
pub struct QueryOrchestrator {
    direct: Box<dyn CandidateTransport>,
    relay: Box<dyn CandidateTransport>,
}

impl QueryOrchestrator {
    pub fn new(direct: Box<dyn CandidateTransport>, relay: Box<dyn CandidateTransport>) -> Self {
        Self { direct, relay }
    }

    pub fn transport(&self, mode: TransportMode) -> &dyn CandidateTransport {
        match mode {
            TransportMode::Direct => self.direct.as_ref(),
            TransportMode::Relay => self.relay.as_ref(),
        }
    }

    /// Submit a candidate query.
    ///
    /// On a 200 the cache takes the new filters, status, body and raw text
    /// together; on any other status the body is cleared so stale rows
    /// cannot survive a failed re-query. Either way the envelope is
    /// returned for the caller to branch on. The selection state is never
    /// touched here.
    pub async fn submit(
        &self,
        cache: &mut SessionCache,
        filters: FilterSet,
        token: &str,
    ) -> Result<ResponseEnvelope, QueryError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(QueryError::MissingCredential);
        }

        let filters = filters.sanitize();
        cache.set_token(token);

        info!(
            "Submitting candidate query: opening {} stage {} page {} ({} per page)",
            filters.opening_id, filters.stage_id, filters.page, filters.page_size
        );

        let envelope = self
            .transport(filters.transport_mode)
            .list_candidates(token, &filters)
            .await
            .map_err(QueryError::Transport)?;

        if envelope.is_success() {
            cache.record_success(filters, &envelope);
        } else {
            warn!(
                "Candidate query returned status {}: {}",
                envelope.status_code, envelope.raw_text
            );
            cache.record_failure(filters, envelope.status_code, envelope.raw_text.clone());
        }

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Fails the test if any network-shaped call happens at all.
    struct UnreachableTransport;

    #[async_trait]
    impl CandidateTransport for UnreachableTransport {
        async fn list_openings(&self, _: &str, _: u32, _: u32) -> Result<ResponseEnvelope> {
            unreachable!("no network call expected")
        }
        async fn list_candidates(&self, _: &str, _: &FilterSet) -> Result<ResponseEnvelope> {
            unreachable!("no network call expected")
        }
        async fn candidate_detail(&self, _: &str, _: &str) -> Result<ResponseEnvelope> {
            unreachable!("no network call expected")
        }
        async fn candidate_messages(&self, _: &str, _: &str) -> Result<ResponseEnvelope> {
            unreachable!("no network call expected")
        }
    }

    /// Returns one canned response for `list_candidates`.
    struct CannedTransport {
        status: u16,
        text: String,
    }

    #[async_trait]
    impl CandidateTransport for CannedTransport {
        async fn list_openings(&self, _: &str, _: u32, _: u32) -> Result<ResponseEnvelope> {
            Ok(ResponseEnvelope::from_text(self.status, self.text.clone()))
        }
        async fn list_candidates(&self, _: &str, _: &FilterSet) -> Result<ResponseEnvelope> {
            Ok(ResponseEnvelope::from_text(self.status, self.text.clone()))
        }
        async fn candidate_detail(&self, _: &str, _: &str) -> Result<ResponseEnvelope> {
            Ok(ResponseEnvelope::from_text(self.status, self.text.clone()))
        }
        async fn candidate_messages(&self, _: &str, _: &str) -> Result<ResponseEnvelope> {
            Ok(ResponseEnvelope::from_text(self.status, self.text.clone()))
        }
    }

    fn orchestrator_with(status: u16, text: &str) -> QueryOrchestrator {
        QueryOrchestrator::new(
            Box::new(CannedTransport {
                status,
                text: text.to_string(),
            }),
            Box::new(UnreachableTransport),
        )
    }

    fn filters() -> FilterSet {
        FilterSet::sanitized("op-1", "st-2", 1, 50, TransportMode::Direct)
    }

    #[tokio::test]
    async fn test_empty_token_makes_no_call_and_leaves_cache_unchanged() {
        let orchestrator = QueryOrchestrator::new(
            Box::new(UnreachableTransport),
            Box::new(UnreachableTransport),
        );
        let mut cache = SessionCache::new();

        let result = orchestrator.submit(&mut cache, filters(), "   ").await;
        assert!(matches!(result, Err(QueryError::MissingCredential)));
        assert!(cache.replay().is_none());
        assert_eq!(cache.token_in_use(), "");
    }

    #[tokio::test]
    async fn test_successful_submit_is_replayable_verbatim() {
        let orchestrator = orchestrator_with(200, r#"{"candidates":[{"id":"7"}],"total":1}"#);
        let mut cache = SessionCache::new();

        let envelope = orchestrator
            .submit(&mut cache, filters(), "tok")
            .await
            .unwrap();
        assert!(envelope.is_success());

        let replayed = cache.replay().unwrap();
        assert_eq!(replayed, envelope);
        assert_eq!(cache.token_in_use(), "tok");
        assert_eq!(cache.last_filters(), Some(&filters()));
    }

    #[tokio::test]
    async fn test_failed_submit_clears_body_and_keeps_selection() {
        let orchestrator = orchestrator_with(500, "upstream exploded");
        let mut cache = SessionCache::new();
        cache.select_candidate("42");

        let envelope = orchestrator
            .submit(&mut cache, filters(), "tok")
            .await
            .unwrap();
        assert_eq!(envelope.status_code, 500);

        let replayed = cache.replay().unwrap();
        assert_eq!(replayed.status_code, 500);
        assert!(replayed.body_is_empty());
        assert_eq!(replayed.raw_text, "upstream exploded");
        assert_eq!(cache.selected_candidate_id(), Some("42"));
        assert!(cache.detail_visible());
    }

    #[tokio::test]
    async fn test_submit_sanitizes_filters_before_dispatch() {
        let orchestrator = orchestrator_with(200, r#"{"candidates":[]}"#);
        let mut cache = SessionCache::new();

        let raw = FilterSet {
            opening_id: "  op-1 ".to_string(),
            stage_id: "st".to_string(),
            page: 0,
            page_size: 999,
            transport_mode: TransportMode::Direct,
        };
        orchestrator.submit(&mut cache, raw, "tok").await.unwrap();

        let stored = cache.last_filters().unwrap();
        assert_eq!(stored.opening_id, "op-1");
        assert_eq!(stored.page, 1);
        assert_eq!(stored.page_size, 100);
    }
}
