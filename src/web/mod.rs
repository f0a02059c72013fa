// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::{Context, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Request, Response, State};
use tokio::sync::RwLock;
use tracing::info;

use crate::core::{ApiClient, ConfigManager, RelayClient};
use crate::query::QueryOrchestrator;
use crate::session::SessionCache;

pub type SharedCache = RwLock<SessionCache>;
pub type SharedConfig = RwLock<ConfigManager>;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[get("/health")]
pub async fn health() -> Json<TextResponse> {
    handlers::health_handler().await
}

#[get("/config")]
pub async fn get_config(config: &State<SharedConfig>) -> Json<ConfigResponse> {
    handlers::get_config_handler(config).await
}

#[post("/config", data = "<request>")]
pub async fn update_config(
    request: Json<ConfigUpdateRequest>,
    config: &State<SharedConfig>,
) -> Result<Json<ConfigResponse>, Json<StandardErrorResponse>> {
    handlers::update_config_handler(request, config).await
}

#[post("/openings", data = "<request>")]
pub async fn list_openings(
    request: Json<OpeningsRequest>,
    config: &State<SharedConfig>,
    orchestrator: &State<QueryOrchestrator>,
) -> Result<Json<OpeningsResponse>, Json<StandardErrorResponse>> {
    handlers::list_openings_handler(request, config, orchestrator).await
}

#[post("/candidates", data = "<request>")]
pub async fn query_candidates(
    request: Json<CandidateQueryRequest>,
    config: &State<SharedConfig>,
    orchestrator: &State<QueryOrchestrator>,
    cache: &State<SharedCache>,
) -> Result<Json<CandidateListingResponse>, Json<StandardErrorResponse>> {
    handlers::query_candidates_handler(request, config, orchestrator, cache).await
}

#[get("/candidates")]
pub async fn cached_candidates(
    cache: &State<SharedCache>,
) -> Result<Json<CandidateListingResponse>, Json<StandardErrorResponse>> {
    handlers::cached_candidates_handler(cache).await
}

#[get("/candidates/export")]
pub async fn export_candidates(
    cache: &State<SharedCache>,
) -> Result<CsvResponse, Json<StandardErrorResponse>> {
    handlers::export_candidates_handler(cache).await
}

#[post("/candidates/<candidate_id>/select")]
pub async fn select_candidate(
    candidate_id: String,
    cache: &State<SharedCache>,
) -> Json<ActionResponse> {
    handlers::select_candidate_handler(candidate_id, cache).await
}

#[get("/selection")]
pub async fn selection_detail(
    cache: &State<SharedCache>,
    orchestrator: &State<QueryOrchestrator>,
) -> Result<Json<SelectionResponse>, Json<StandardErrorResponse>> {
    handlers::selection_handler(cache, orchestrator).await
}

#[post("/selection/close")]
pub async fn close_selection(cache: &State<SharedCache>) -> Json<ActionResponse> {
    handlers::close_selection_handler(cache).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

// Main server start function
pub async fn start_web_server(config: ConfigManager, port: u16) -> Result<()> {
    let orchestrator = QueryOrchestrator::new(
        Box::new(ApiClient::new(config.upstream_url())?),
        Box::new(RelayClient::new(config.relay_url())?),
    );

    info!("Starting candidate explorer API server");
    info!("Credential store: {}", config.path().display());

    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("address", "0.0.0.0"));

    let _rocket = rocket::custom(figment)
        .attach(Cors)
        .manage(RwLock::new(SessionCache::new()))
        .manage(RwLock::new(config))
        .manage(orchestrator)
        .register("/api", catchers![bad_request, internal_error])
        .mount(
            "/api",
            routes![
                health,
                get_config,
                update_config,
                list_openings,
                query_candidates,
                cached_candidates,
                export_candidates,
                select_candidate,
                selection_detail,
                close_selection,
                options,
            ],
        )
        .launch()
        .await
        .context("Rocket failed to launch")?;

    Ok(())
}
