// src/core/api_client.rs
//! Direct transport: form-encoded client for the upstream hiring API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::core::transport::{CandidateTransport, ResponseEnvelope};
use crate::session::FilterSet;

const OPENING_LIST_ENDPOINT: &str = "/opening/list";
const CANDIDATE_LIST_ENDPOINT: &str = "/candidate/list";
const CANDIDATE_DETAIL_ENDPOINT: &str = "/candidate/get";
const CANDIDATE_MESSAGES_ENDPOINT: &str = "/candidate/messages";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the upstream public hiring API. Every operation is a
/// form-encoded POST carrying the bearer token as the `access_token` field.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// One attempt, wrapped verbatim. Non-200 statuses are data for the
    /// caller, not errors.
    async fn post_form(&self, endpoint: &str, form: &[(&str, String)]) -> Result<ResponseEnvelope> {
        let url = format!("{}{}", self.base_url, endpoint);
        info!("Calling upstream API: {}", url);

        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to POST to {}", url))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .context("Failed to read response text")?;

        Ok(ResponseEnvelope::from_text(status, text))
    }
}

#[async_trait]
impl CandidateTransport for ApiClient {
    async fn list_openings(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ResponseEnvelope> {
        self.post_form(
            OPENING_LIST_ENDPOINT,
            &[
                ("access_token", token.to_string()),
                ("page", page.to_string()),
                ("num_per_page", per_page.to_string()),
                ("order_by", "starred".to_string()),
            ],
        )
        .await
    }

    async fn list_candidates(&self, token: &str, filters: &FilterSet) -> Result<ResponseEnvelope> {
        self.post_form(
            CANDIDATE_LIST_ENDPOINT,
            &[
                ("access_token", token.to_string()),
                ("opening_id", filters.opening_id.clone()),
                ("page", filters.page.to_string()),
                ("num_per_page", filters.page_size.to_string()),
                ("stage", filters.stage_id.clone()),
            ],
        )
        .await
    }

    async fn candidate_detail(&self, token: &str, candidate_id: &str) -> Result<ResponseEnvelope> {
        self.post_form(
            CANDIDATE_DETAIL_ENDPOINT,
            &[
                ("access_token", token.to_string()),
                ("id", candidate_id.to_string()),
            ],
        )
        .await
    }

    async fn candidate_messages(
        &self,
        token: &str,
        candidate_id: &str,
    ) -> Result<ResponseEnvelope> {
        self.post_form(
            CANDIDATE_MESSAGES_ENDPOINT,
            &[
                ("access_token", token.to_string()),
                ("id", candidate_id.to_string()),
            ],
        )
        .await
    }
}
