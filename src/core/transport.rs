// src/core/transport.rs
//! Uniform response envelope over the two transport paths (direct API call
//! vs. local relay), so callers never branch on how data arrived.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::session::FilterSet;

/// Which path a query travels: straight to the upstream API or through the
/// local relay service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Direct,
    Relay,
}

/// The `{status, body, rawText}` shape every transport produces. Owned by
/// the call site that produced it and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub body: Value,
    pub raw_text: String,
}

impl ResponseEnvelope {
    /// Wrap an upstream response verbatim. A body that fails to parse as
    /// JSON becomes an empty object while `raw_text` keeps the original
    /// text, so error pages still surface to the operator.
    pub fn from_text(status_code: u16, raw_text: String) -> Self {
        let body = serde_json::from_str(&raw_text).unwrap_or_else(|_| Value::Object(Map::new()));
        Self {
            status_code,
            body,
            raw_text,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// True when the body carries nothing renderable. Callers must check
    /// this before drawing candidate rows from a replayed envelope.
    pub fn body_is_empty(&self) -> bool {
        match &self.body {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// The upstream operations the dashboard needs. Two implementations exist,
/// one per [`TransportMode`]; a single attempt either succeeds or the
/// envelope carries the failure status. No retries.
#[async_trait]
pub trait CandidateTransport: Send + Sync {
    async fn list_openings(&self, token: &str, page: u32, per_page: u32)
        -> Result<ResponseEnvelope>;

    async fn list_candidates(&self, token: &str, filters: &FilterSet) -> Result<ResponseEnvelope>;

    async fn candidate_detail(&self, token: &str, candidate_id: &str) -> Result<ResponseEnvelope>;

    async fn candidate_messages(&self, token: &str, candidate_id: &str)
        -> Result<ResponseEnvelope>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_text_parses_json_body() {
        let envelope = ResponseEnvelope::from_text(200, r#"{"candidates":[{"id":1}]}"#.to_string());
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.body, json!({"candidates": [{"id": 1}]}));
        assert!(!envelope.body_is_empty());
    }

    #[test]
    fn test_from_text_keeps_raw_text_on_parse_failure() {
        let envelope = ResponseEnvelope::from_text(502, "<html>Bad Gateway</html>".to_string());
        assert_eq!(envelope.body, json!({}));
        assert_eq!(envelope.raw_text, "<html>Bad Gateway</html>");
        assert!(envelope.body_is_empty());
    }

    #[test]
    fn test_transport_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransportMode::Relay).unwrap(),
            r#""relay""#
        );
        assert_eq!(TransportMode::default(), TransportMode::Direct);
    }
}
