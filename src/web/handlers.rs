// src/web/handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::core::config_manager::ConfigManager;
use crate::core::transport::{ResponseEnvelope, TransportMode};
use crate::extract::{extract_messages, resolve_candidate};
use crate::processor::process_candidate_listing;
use crate::query::{QueryError, QueryOrchestrator};
use crate::session::FilterSet;
use crate::web::types::{
    ActionResponse, CandidateListingResponse, CandidateQueryRequest, ConfigResponse,
    ConfigUpdateRequest, CsvResponse, OpeningsRequest, OpeningsResponse, SelectionResponse,
    StandardErrorResponse, TextResponse,
};
use crate::web::{SharedCache, SharedConfig};

pub async fn health_handler() -> Json<TextResponse> {
    Json(TextResponse::success(
        "Candidate explorer API is running".to_string(),
    ))
}

fn config_response(config: &ConfigManager) -> ConfigResponse {
    ConfigResponse {
        success: true,
        env_file: config.path().display().to_string(),
        env_file_exists: config.file_exists(),
        access_token: config.access_token().to_string(),
        opening_id: config.opening_id().to_string(),
        stage_id: config.stage_id().to_string(),
        num_per_page: config.default_page_size(),
    }
}

pub async fn get_config_handler(config: &State<SharedConfig>) -> Json<ConfigResponse> {
    let config = config.read().await;
    Json(config_response(&config))
}

pub async fn update_config_handler(
    request: Json<ConfigUpdateRequest>,
    config: &State<SharedConfig>,
) -> Result<Json<ConfigResponse>, Json<StandardErrorResponse>> {
    let mut updates = BTreeMap::new();
    if let Some(token) = &request.access_token {
        updates.insert("ACCESS_TOKEN".to_string(), token.trim().to_string());
    }
    if let Some(opening_id) = &request.opening_id {
        updates.insert("OPENING_ID".to_string(), opening_id.trim().to_string());
    }
    if let Some(stage_id) = &request.stage_id {
        updates.insert("STAGE_ID".to_string(), stage_id.trim().to_string());
    }
    if let Some(num_per_page) = request.num_per_page {
        updates.insert("NUM_PER_PAGE".to_string(), num_per_page.to_string());
    }

    let mut config = config.write().await;
    if let Err(e) = config.save(&updates) {
        error!("Failed to save config: {}", e);
        return Err(Json(StandardErrorResponse::new(
            "Failed to save configuration".to_string(),
            "CONFIG_WRITE_ERROR".to_string(),
            vec!["Check that the env file is writable".to_string()],
        )));
    }

    Ok(Json(config_response(&config)))
}

/// The token typed into the form wins; otherwise fall back to the stored one.
fn resolve_token(explicit: Option<&str>, config: &ConfigManager) -> String {
    let explicit = explicit.unwrap_or_default().trim();
    if explicit.is_empty() {
        config.access_token().trim().to_string()
    } else {
        explicit.to_string()
    }
}

fn missing_token_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Access token is required".to_string(),
        "MISSING_TOKEN".to_string(),
        vec![
            "Enter an access token in the form".to_string(),
            "Or save one through the config endpoint".to_string(),
        ],
    ))
}

pub async fn list_openings_handler(
    request: Json<OpeningsRequest>,
    config: &State<SharedConfig>,
    orchestrator: &State<QueryOrchestrator>,
) -> Result<Json<OpeningsResponse>, Json<StandardErrorResponse>> {
    let token = {
        let config = config.read().await;
        resolve_token(request.access_token.as_deref(), &config)
    };
    if token.is_empty() {
        return Err(missing_token_error());
    }

    let page = request.page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
    let per_page = request.num_per_page.unwrap_or(100).clamp(1, 100) as u32;

    // Opening/stage pickers always load through the direct path.
    let envelope = match orchestrator
        .transport(TransportMode::Direct)
        .list_openings(&token, page, per_page)
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Openings request failed: {}", e);
            return Err(Json(StandardErrorResponse::new(
                format!("Failed to reach the upstream API: {}", e),
                "TRANSPORT_ERROR".to_string(),
                vec!["Check your network connection and try again".to_string()],
            )));
        }
    };

    if !envelope.is_success() {
        return Err(Json(StandardErrorResponse::new(
            format!(
                "Openings request failed with status {}: {}",
                envelope.status_code, envelope.raw_text
            ),
            "TRANSPORT_ERROR".to_string(),
            vec!["Verify the access token is still valid".to_string()],
        )));
    }

    let openings = envelope
        .body
        .get("openings")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    info!("Loaded {} openings", openings.len());

    Ok(Json(OpeningsResponse {
        success: true,
        count: openings.len(),
        openings,
        raw: envelope.body,
    }))
}

/// Shape an envelope for the front-end. Rows are only derived from a 200
/// body; anything else surfaces the status code and raw text instead.
fn listing_response(envelope: &ResponseEnvelope, filters: &FilterSet) -> CandidateListingResponse {
    if envelope.is_success() {
        let processed = process_candidate_listing(&envelope.body, filters);
        CandidateListingResponse {
            success: true,
            status: envelope.status_code,
            filters: filters.clone(),
            metrics: Some(processed.metrics),
            candidates: processed.rows,
            raw: Some(envelope.body.clone()),
            error: None,
        }
    } else {
        CandidateListingResponse {
            success: false,
            status: envelope.status_code,
            filters: filters.clone(),
            metrics: None,
            candidates: Vec::new(),
            raw: None,
            error: Some(envelope.raw_text.clone()),
        }
    }
}

pub async fn query_candidates_handler(
    request: Json<CandidateQueryRequest>,
    config: &State<SharedConfig>,
    orchestrator: &State<QueryOrchestrator>,
    cache: &State<SharedCache>,
) -> Result<Json<CandidateListingResponse>, Json<StandardErrorResponse>> {
    let (token, default_stage, default_per_page) = {
        let config = config.read().await;
        (
            resolve_token(request.access_token.as_deref(), &config),
            config.stage_id().to_string(),
            config.default_page_size(),
        )
    };

    let stage_id = request.stage_id.clone().unwrap_or(default_stage);
    let filters = FilterSet::sanitized(
        &request.opening_id,
        &stage_id,
        request.page.unwrap_or(1),
        request.num_per_page.unwrap_or(i64::from(default_per_page)),
        request.transport.unwrap_or_default(),
    );
    let submitted = filters.clone();

    let mut cache = cache.write().await;
    match orchestrator.submit(&mut cache, filters, &token).await {
        Ok(envelope) => Ok(Json(listing_response(&envelope, &submitted))),
        Err(QueryError::MissingCredential) => Err(missing_token_error()),
        Err(QueryError::Transport(e)) => {
            error!("Candidate query transport failure: {}", e);
            Err(Json(StandardErrorResponse::new(
                format!("Transport failure: {}", e),
                "TRANSPORT_ERROR".to_string(),
                vec![
                    "Check your network connection".to_string(),
                    "When relay mode is on, verify the relay is running".to_string(),
                ],
            )))
        }
    }
}

pub async fn cached_candidates_handler(
    cache: &State<SharedCache>,
) -> Result<Json<CandidateListingResponse>, Json<StandardErrorResponse>> {
    let cache = cache.read().await;
    match (cache.replay(), cache.last_filters()) {
        (Some(envelope), Some(filters)) => Ok(Json(listing_response(&envelope, filters))),
        _ => Err(Json(StandardErrorResponse::new(
            "No candidate query has been submitted yet".to_string(),
            "NOT_FOUND".to_string(),
            vec!["Submit a candidate query first".to_string()],
        ))),
    }
}

pub async fn export_candidates_handler(
    cache: &State<SharedCache>,
) -> Result<CsvResponse, Json<StandardErrorResponse>> {
    let cache = cache.read().await;
    let (Some(envelope), Some(filters)) = (cache.replay(), cache.last_filters()) else {
        return Err(Json(StandardErrorResponse::new(
            "No candidate query has been submitted yet".to_string(),
            "NOT_FOUND".to_string(),
            vec!["Submit a candidate query first".to_string()],
        )));
    };

    if !envelope.is_success() {
        return Err(Json(StandardErrorResponse::new(
            "The last query failed; there is nothing to export".to_string(),
            "NOT_FOUND".to_string(),
            vec!["Resubmit the query and try again".to_string()],
        )));
    }

    let processed = process_candidate_listing(&envelope.body, filters);
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &processed.rows {
        if let Err(e) = writer.serialize(row) {
            error!("Failed to serialize candidate row: {}", e);
            return Err(Json(StandardErrorResponse::new(
                "Failed to build the CSV export".to_string(),
                "EXPORT_ERROR".to_string(),
                vec!["Try again or contact support".to_string()],
            )));
        }
    }

    match writer.into_inner() {
        Ok(data) => Ok(CsvResponse {
            data,
            filename: "candidates.csv".to_string(),
        }),
        Err(e) => {
            error!("Failed to finish CSV export: {}", e);
            Err(Json(StandardErrorResponse::new(
                "Failed to build the CSV export".to_string(),
                "EXPORT_ERROR".to_string(),
                vec!["Try again or contact support".to_string()],
            )))
        }
    }
}

pub async fn select_candidate_handler(
    candidate_id: String,
    cache: &State<SharedCache>,
) -> Json<ActionResponse> {
    let mut cache = cache.write().await;
    cache.select_candidate(candidate_id.clone());
    info!("Selected candidate {}", candidate_id);

    Json(ActionResponse::success(
        format!("Candidate {} selected", candidate_id),
        "selected".to_string(),
    ))
}

pub async fn close_selection_handler(cache: &State<SharedCache>) -> Json<ActionResponse> {
    let mut cache = cache.write().await;
    cache.close_detail();

    Json(ActionResponse::success(
        "Detail view closed".to_string(),
        "closed".to_string(),
    ))
}

/// Fetch detail and message history for the selected candidate through the
/// transport mode of the last query. Each section degrades to an error
/// string or an explicit empty state; the results list itself is redrawn
/// from the cache, not re-fetched.
pub async fn selection_handler(
    cache: &State<SharedCache>,
    orchestrator: &State<QueryOrchestrator>,
) -> Result<Json<SelectionResponse>, Json<StandardErrorResponse>> {
    let (candidate_id, token, mode) = {
        let cache = cache.read().await;
        let candidate_id = match (cache.detail_visible(), cache.selected_candidate_id()) {
            (true, Some(id)) => id.to_string(),
            _ => {
                return Err(Json(StandardErrorResponse::new(
                    "No candidate is selected".to_string(),
                    "NOT_FOUND".to_string(),
                    vec!["Select a candidate from the results list first".to_string()],
                )))
            }
        };
        let mode = cache
            .last_filters()
            .map(|filters| filters.transport_mode)
            .unwrap_or_default();
        (candidate_id, cache.token_in_use().to_string(), mode)
    };

    if token.is_empty() {
        return Err(missing_token_error());
    }

    let transport = orchestrator.transport(mode);

    let (candidate, candidate_error) = match transport.candidate_detail(&token, &candidate_id).await
    {
        Ok(envelope) if envelope.is_success() => (
            resolve_candidate(&envelope.body).map(|candidate| Value::Object(candidate.clone())),
            None,
        ),
        Ok(envelope) => (
            None,
            Some(format!(
                "Candidate detail request failed with status {}",
                envelope.status_code
            )),
        ),
        Err(e) => (None, Some(e.to_string())),
    };

    let (messages, message_meta, messages_error) =
        match transport.candidate_messages(&token, &candidate_id).await {
            Ok(envelope) if envelope.is_success() => {
                let extraction = extract_messages(&envelope.body);
                (extraction.records(), Value::Object(extraction.meta), None)
            }
            Ok(envelope) => (
                Vec::new(),
                Value::Object(Map::new()),
                Some(format!(
                    "Candidate messages request failed with status {}",
                    envelope.status_code
                )),
            ),
            Err(e) => (Vec::new(), Value::Object(Map::new()), Some(e.to_string())),
        };

    Ok(Json(SelectionResponse {
        success: true,
        candidate_id,
        candidate,
        candidate_error,
        messages,
        message_meta,
        messages_error,
    }))
}
