pub mod core;
pub mod extract;
pub mod processor;
pub mod query;
pub mod session;
pub mod web;

pub use crate::core::{
    ApiClient, CandidateTransport, ConfigManager, RelayClient, ResponseEnvelope, TransportMode,
};
pub use crate::extract::{
    extract_messages, format_timestamp, parse_epoch, resolve_candidate, ExtractionResult,
    MessageRecord,
};
pub use crate::processor::{
    process_candidate_listing, CandidateRow, ListingMetrics, ProcessedListing,
};
pub use crate::query::{QueryError, QueryOrchestrator};
pub use crate::session::{FilterSet, SessionCache};
pub use crate::web::start_web_server;
