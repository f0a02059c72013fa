// src/core/relay_client.rs
//! Relay transport: forwards queries through a local relay service and
//! unwraps its outer envelope so callers see the upstream body directly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use crate::core::transport::{CandidateTransport, ResponseEnvelope};
use crate::session::FilterSet;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the local relay. Listing responses nest the real upstream
/// body inside a `raw` field; detail and message responses pass through
/// verbatim (the candidate resolver handles their `data` nesting).
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<(u16, String)> {
        let url = format!("{}{}", self.base_url, path);
        info!("Calling relay: {}", url);

        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to POST to relay at {}", url))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .context("Failed to read relay response text")?;

        Ok((status, text))
    }

    /// On relay success the envelope body is the nested `raw` field, so the
    /// caller never learns which transport ran. On relay failure the body
    /// stays empty and `raw_text` carries the relay's error text.
    fn unwrap_listing(status: u16, text: String) -> ResponseEnvelope {
        if status != 200 {
            return ResponseEnvelope {
                status_code: status,
                body: Value::Object(Map::new()),
                raw_text: text,
            };
        }

        let outer: Value = serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Map::new()));
        let body = outer
            .get("raw")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        ResponseEnvelope {
            status_code: status,
            body,
            raw_text: text,
        }
    }
}

#[async_trait]
impl CandidateTransport for RelayClient {
    async fn list_openings(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ResponseEnvelope> {
        let (status, text) = self
            .post_form(
                "/api/openings",
                &[
                    ("access_token", token.to_string()),
                    ("page", page.to_string()),
                    ("num_per_page", per_page.to_string()),
                ],
            )
            .await?;
        Ok(Self::unwrap_listing(status, text))
    }

    async fn list_candidates(&self, token: &str, filters: &FilterSet) -> Result<ResponseEnvelope> {
        let (status, text) = self
            .post_form(
                "/api/candidates",
                &[
                    ("access_token", token.to_string()),
                    ("opening_id", filters.opening_id.clone()),
                    ("page", filters.page.to_string()),
                    ("num_per_page", filters.page_size.to_string()),
                    ("stage", filters.stage_id.clone()),
                ],
            )
            .await?;
        Ok(Self::unwrap_listing(status, text))
    }

    async fn candidate_detail(&self, token: &str, candidate_id: &str) -> Result<ResponseEnvelope> {
        let (status, text) = self
            .post_form(
                &format!("/api/candidate/{}", candidate_id),
                &[("access_token", token.to_string())],
            )
            .await?;
        Ok(ResponseEnvelope::from_text(status, text))
    }

    async fn candidate_messages(
        &self,
        token: &str,
        candidate_id: &str,
    ) -> Result<ResponseEnvelope> {
        let (status, text) = self
            .post_form(
                &format!("/api/candidate/{}/messages", candidate_id),
                &[("access_token", token.to_string())],
            )
            .await?;
        Ok(ResponseEnvelope::from_text(status, text))
    }
}
