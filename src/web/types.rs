// src/web/types.rs
use rocket::http::ContentType;
use rocket::response::{self, Responder};
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};
use serde_json::Value;

use crate::core::transport::TransportMode;
use crate::extract::MessageRecord;
use crate::processor::{CandidateRow, ListingMetrics};
use crate::session::FilterSet;

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    pub success: bool,
    pub message: String,
}

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    pub action: String,
}

impl ActionResponse {
    pub fn success(message: String, action: String) -> Self {
        Self {
            success: true,
            message,
            action,
        }
    }
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ConfigUpdateRequest {
    pub access_token: Option<String>,
    pub opening_id: Option<String>,
    pub stage_id: Option<String>,
    pub num_per_page: Option<i64>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ConfigResponse {
    pub success: bool,
    pub env_file: String,
    pub env_file_exists: bool,
    pub access_token: String,
    pub opening_id: String,
    pub stage_id: String,
    pub num_per_page: u32,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct OpeningsRequest {
    pub access_token: Option<String>,
    pub page: Option<i64>,
    pub num_per_page: Option<i64>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct OpeningsResponse {
    pub success: bool,
    pub count: usize,
    pub openings: Vec<Value>,
    pub raw: Value,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CandidateQueryRequest {
    pub access_token: Option<String>,
    pub opening_id: String,
    pub stage_id: Option<String>,
    pub page: Option<i64>,
    pub num_per_page: Option<i64>,
    pub transport: Option<TransportMode>,
}

/// Listing result for both fresh submits and cache replays. On a non-200
/// the table stays empty and `error` carries the upstream's raw text, so
/// the front-end never renders stale rows against a failure status.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CandidateListingResponse {
    pub success: bool,
    pub status: u16,
    pub filters: FilterSet,
    pub metrics: Option<ListingMetrics>,
    pub candidates: Vec<CandidateRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SelectionResponse {
    pub success: bool,
    pub candidate_id: String,
    pub candidate: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_error: Option<String>,
    pub messages: Vec<MessageRecord>,
    pub message_meta: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_error: Option<String>,
}

pub struct CsvResponse {
    pub data: Vec<u8>,
    pub filename: String,
}

impl<'r> Responder<'r, 'static> for CsvResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::CSV)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}
