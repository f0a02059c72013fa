// src/extract.rs
//! Best-effort extraction of candidate and message data from payloads whose
//! internal shape has drifted across upstream API versions.

use serde::Serialize;
use serde_json::{Map, Value};

/// Historical names the upstream has used for the message list, highest
/// priority first. The order is load-bearing: downstream consumers rely on
/// it, so it is never re-derived or scored.
const MESSAGE_KEY_PRIORITY: [&str; 6] =
    ["messages", "data", "results", "items", "records", "threads"];

/// A located message list plus whatever sibling metadata surrounded it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    /// Raw message objects in source order, never re-sorted.
    pub messages: Vec<Value>,
    /// Top-level keys that were not identified as the message list.
    pub meta: Map<String, Value>,
}

impl ExtractionResult {
    /// Project every raw message into a [`MessageRecord`].
    pub fn records(&self) -> Vec<MessageRecord> {
        self.messages.iter().map(MessageRecord::project).collect()
    }
}

/// Locate the message list in `payload` without a fixed schema.
///
/// A top-level array is the message list itself. Otherwise the priority keys
/// are scanned for an array value first; failing that, object-valued
/// priority keys are recursed into one at a time, and the outer siblings win
/// over inner meta on key collision.
pub fn extract_messages(payload: &Value) -> ExtractionResult {
    if let Value::Array(items) = payload {
        return ExtractionResult {
            messages: items.clone(),
            meta: Map::new(),
        };
    }
    let Some(object) = payload.as_object() else {
        return ExtractionResult::default();
    };

    for key in MESSAGE_KEY_PRIORITY {
        if let Some(Value::Array(items)) = object.get(key) {
            return ExtractionResult {
                messages: items.clone(),
                meta: siblings_of(object, key),
            };
        }
    }

    for key in MESSAGE_KEY_PRIORITY {
        if let Some(inner @ Value::Object(_)) = object.get(key) {
            let nested = extract_messages(inner);
            if !nested.messages.is_empty() {
                let mut meta = siblings_of(object, key);
                for (inner_key, inner_value) in nested.meta {
                    meta.entry(inner_key).or_insert(inner_value);
                }
                return ExtractionResult {
                    messages: nested.messages,
                    meta,
                };
            }
        }
    }

    let meta = object
        .iter()
        .filter(|(key, _)| !MESSAGE_KEY_PRIORITY.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    ExtractionResult {
        messages: Vec::new(),
        meta,
    }
}

fn siblings_of(object: &Map<String, Value>, matched: &str) -> Map<String, Value> {
    object
        .iter()
        .filter(|(key, _)| key.as_str() != matched)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Locate the candidate object across the nesting variants the upstream has
/// shipped: top-level `candidate`, then `data.candidate`, then `data`
/// itself. First match wins; `None` means "not found" and callers render an
/// explicit empty state instead of partial data.
pub fn resolve_candidate(payload: &Value) -> Option<&Map<String, Value>> {
    if let Some(candidate) = payload.get("candidate").and_then(non_empty_object) {
        return Some(candidate);
    }
    if let Some(data) = payload.get("data").filter(|value| value.is_object()) {
        if let Some(candidate) = data.get("candidate").and_then(non_empty_object) {
            return Some(candidate);
        }
        return non_empty_object(data);
    }
    None
}

fn non_empty_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object().filter(|map| !map.is_empty())
}

/// A string-ish field: non-empty strings pass through, numbers are
/// stringified (the upstream mixes the two for ids).
pub(crate) fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

/// Parse an epoch-seconds value out of a number or numeric string. The
/// upstream's unset sentinels (`null`, `""`, `0`, `"0"`) and anything
/// non-positive or unparsable come back as `None`.
pub fn parse_epoch(value: &Value) -> Option<i64> {
    let seconds = match value {
        Value::Number(number) => number.as_i64()?,
        Value::String(text) => text.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (seconds > 0).then_some(seconds)
}

/// Render an epoch-seconds value for display. Bad input never errors, it
/// degrades to the placeholder dash.
pub fn format_timestamp(value: &Value) -> String {
    match parse_epoch(value).and_then(|seconds| chrono::DateTime::from_timestamp(seconds, 0)) {
        Some(moment) => moment.format("%d/%m/%Y %H:%M").to_string(),
        None => "-".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageAuthor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageAttachment {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingEvent {
    pub event: String,
    pub at: Option<i64>,
}

/// One candidate message, projected read-only from a raw payload entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub author: MessageAuthor,
    /// Epoch seconds; `None` means the upstream sent no usable timestamp.
    pub sent_at: Option<i64>,
    pub content: String,
    pub attachments: Vec<MessageAttachment>,
    pub tracking_events: Vec<TrackingEvent>,
}

impl MessageRecord {
    /// Field projection with the documented defaults: a missing author
    /// becomes `{name: "unknown", type: ""}`, content accepts the legacy
    /// `content`/`body` names with literal `\r\n` escapes normalized to
    /// real newlines, and a missing timestamp stays unset.
    pub fn project(raw: &Value) -> Self {
        let user = raw.get("user");
        let author = MessageAuthor {
            name: user
                .and_then(|user| {
                    text_field(user, "name")
                        .or_else(|| text_field(user, "username"))
                        .or_else(|| text_field(user, "email"))
                })
                .unwrap_or_else(|| "unknown".to_string()),
            kind: user
                .and_then(|user| text_field(user, "type"))
                .unwrap_or_default(),
        };

        let content = text_field(raw, "content")
            .or_else(|| text_field(raw, "body"))
            .unwrap_or_default()
            .replace("\\r\\n", "\n");

        let attachments = raw
            .get("attachments")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|attachment| MessageAttachment {
                        name: text_field(attachment, "name")
                            .or_else(|| text_field(attachment, "filename"))
                            .unwrap_or_else(|| "file".to_string()),
                        url: text_field(attachment, "url")
                            .or_else(|| text_field(attachment, "download_url")),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let tracking_events = raw
            .get("tracking_events")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|event| TrackingEvent {
                        event: text_field(event, "event").unwrap_or_else(|| "unknown".to_string()),
                        at: event.get("since").and_then(parse_epoch),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: text_field(raw, "id").unwrap_or_default(),
            thread_id: text_field(raw, "thread_id").unwrap_or_default(),
            subject: text_field(raw, "subject").unwrap_or_default(),
            author,
            sent_at: raw.get("since").and_then(parse_epoch),
            content,
            attachments,
            tracking_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_top_level_list() {
        let result = extract_messages(&json!([1, 2]));
        assert_eq!(result.messages, vec![json!(1), json!(2)]);
        assert!(result.meta.is_empty());
    }

    #[test]
    fn test_extract_messages_key_with_sibling_meta() {
        let result = extract_messages(&json!({"messages": [1, 2], "since": 5}));
        assert_eq!(result.messages, vec![json!(1), json!(2)]);
        assert_eq!(result.meta.get("since"), Some(&json!(5)));
        assert_eq!(result.meta.len(), 1);
    }

    #[test]
    fn test_extract_recurses_into_wrapper_object() {
        let result = extract_messages(&json!({"data": {"items": [{"id": 1}]}, "since": 5}));
        assert_eq!(result.messages, vec![json!({"id": 1})]);
        assert_eq!(result.meta.get("since"), Some(&json!(5)));
    }

    #[test]
    fn test_extract_outer_meta_wins_on_collision() {
        let payload = json!({
            "data": {"items": [{"id": 1}], "since": 99},
            "since": 5
        });
        let result = extract_messages(&payload);
        assert_eq!(result.meta.get("since"), Some(&json!(5)));
    }

    #[test]
    fn test_extract_no_match_keeps_unrecognized_keys() {
        let result = extract_messages(&json!({"foo": "bar"}));
        assert!(result.messages.is_empty());
        assert_eq!(result.meta.get("foo"), Some(&json!("bar")));
    }

    #[test]
    fn test_extract_priority_order_is_total() {
        // "messages" outranks "threads" regardless of list length.
        let payload = json!({"threads": [1, 2, 3], "messages": []});
        let result = extract_messages(&payload);
        assert!(result.messages.is_empty());
        assert_eq!(result.meta.get("threads"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_extract_non_object_payload() {
        assert_eq!(extract_messages(&json!("nope")), ExtractionResult::default());
        assert_eq!(extract_messages(&Value::Null), ExtractionResult::default());
    }

    #[test]
    fn test_resolve_candidate_variants() {
        let direct = json!({"candidate": {"id": "7"}});
        assert_eq!(
            resolve_candidate(&direct),
            json!({"id": "7"}).as_object()
        );

        let nested = json!({"data": {"candidate": {"id": "7"}}});
        assert_eq!(
            resolve_candidate(&nested),
            json!({"id": "7"}).as_object()
        );

        let bare = json!({"data": {"id": "7"}});
        assert_eq!(resolve_candidate(&bare), json!({"id": "7"}).as_object());

        assert!(resolve_candidate(&json!({})).is_none());
        assert!(resolve_candidate(&json!({"candidate": {}})).is_none());
        assert!(resolve_candidate(&json!({"data": {}})).is_none());
        assert!(resolve_candidate(&json!({"data": "text"})).is_none());
    }

    #[test]
    fn test_format_timestamp_placeholders() {
        assert_eq!(format_timestamp(&json!(0)), "-");
        assert_eq!(format_timestamp(&json!("0")), "-");
        assert_eq!(format_timestamp(&Value::Null), "-");
        assert_eq!(format_timestamp(&json!("")), "-");
        assert_eq!(format_timestamp(&json!("abc")), "-");
        assert_eq!(format_timestamp(&json!(-5)), "-");
    }

    #[test]
    fn test_format_timestamp_renders_valid_epoch() {
        let rendered = format_timestamp(&json!(1700000000));
        assert_ne!(rendered, "-");
        assert_eq!(rendered, "14/11/2023 22:13");
    }

    #[test]
    fn test_project_defaults_for_sparse_message() {
        let record = MessageRecord::project(&json!({}));
        assert_eq!(record.author.name, "unknown");
        assert_eq!(record.author.kind, "");
        assert_eq!(record.id, "");
        assert_eq!(record.sent_at, None);
        assert_eq!(record.content, "");
        assert!(record.attachments.is_empty());
        assert!(record.tracking_events.is_empty());
    }

    #[test]
    fn test_project_full_message() {
        let raw = json!({
            "id": 31,
            "thread_id": "t-9",
            "subject": "Interview invitation",
            "user": {"name": "Anna", "type": "recruiter"},
            "since": 1700000000,
            "body": "Hello,\\r\\nPlease confirm.",
            "attachments": [{"filename": "offer.pdf", "download_url": "https://x/offer.pdf"}],
            "tracking_events": [{"event": "opened", "since": 1700000100}]
        });
        let record = MessageRecord::project(&raw);
        assert_eq!(record.id, "31");
        assert_eq!(record.thread_id, "t-9");
        assert_eq!(record.author.name, "Anna");
        assert_eq!(record.author.kind, "recruiter");
        assert_eq!(record.sent_at, Some(1700000000));
        assert_eq!(record.content, "Hello,\nPlease confirm.");
        assert_eq!(record.attachments[0].name, "offer.pdf");
        assert_eq!(
            record.attachments[0].url.as_deref(),
            Some("https://x/offer.pdf")
        );
        assert_eq!(record.tracking_events[0].event, "opened");
        assert_eq!(record.tracking_events[0].at, Some(1700000100));
    }

    #[test]
    fn test_project_content_prefers_content_over_body() {
        let raw = json!({"content": "primary", "body": "legacy"});
        assert_eq!(MessageRecord::project(&raw).content, "primary");

        let raw = json!({"content": "", "body": "legacy"});
        assert_eq!(MessageRecord::project(&raw).content, "legacy");
    }
}
