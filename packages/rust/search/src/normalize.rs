//! Raw provider payload resolution.
//!
//! The provider seam returns arbitrary JSON. [`normalize`] resolves it into
//! a [`SearchPayload`] through one explicit step: structured objects pass
//! through, textual payloads get one JSON-parse attempt, and everything else
//! is a provider failure. Per-result extraction is lenient — a malformed
//! entry is skipped, not fatal.

use serde_json::{Map, Value};
use tracing::warn;

use webscout_shared::{Result, WebScoutError};

use crate::tavily::provider_status_message;

/// Default title for a result that carries none.
const DEFAULT_TITLE: &str = "Untitled";

/// Default content for a result that carries none.
const DEFAULT_CONTENT: &str = "No content available";

/// One raw search result, extracted leniently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// A resolved provider payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPayload {
    /// Inline short answer, when the provider produced one.
    pub answer: Option<String>,
    /// Extracted results, in provider order.
    pub results: Vec<RawResult>,
}

/// Resolve a raw provider payload into results.
///
/// Fails with a provider error:
/// - status 500 when the payload is not (and cannot be parsed into) a
///   structured mapping, with the raw payload attached,
/// - status 422 when the mapping carries an explicit `error` field,
/// - status 404 when the mapping has no results.
pub fn normalize(raw: Value) -> Result<SearchPayload> {
    let payload = into_mapping(raw)?;

    if payload.contains_key("error") {
        return Err(WebScoutError::provider(
            422,
            provider_status_message(422),
            Value::Object(payload),
        ));
    }

    let raw_results: Vec<Value> = payload
        .get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if raw_results.is_empty() {
        warn!("no results in provider payload");
        return Err(WebScoutError::provider(
            404,
            "No results found",
            Value::Object(payload),
        ));
    }

    let answer = payload
        .get("answer")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut results = Vec::with_capacity(raw_results.len());
    for (i, entry) in raw_results.iter().enumerate() {
        match entry.as_object() {
            Some(result) => results.push(RawResult {
                title: field_string(result, "title", DEFAULT_TITLE),
                url: field_string(result, "url", ""),
                content: field_string(result, "content", DEFAULT_CONTENT),
            }),
            None => {
                warn!(index = i, "skipping malformed search result");
            }
        }
    }

    Ok(SearchPayload { answer, results })
}

/// Coerce the raw payload into a JSON mapping, parsing textual payloads.
fn into_mapping(raw: Value) -> Result<Map<String, Value>> {
    match raw {
        Value::Object(map) => Ok(map),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(WebScoutError::provider(
                500,
                "Invalid response format from API",
                Value::String(text),
            )),
        },
        other => Err(WebScoutError::provider(
            500,
            "Invalid response format from API",
            other,
        )),
    }
}

/// String field with a default; non-string values keep their JSON text.
fn field_string(result: &Map<String, Value>, key: &str, default: &str) -> String {
    match result.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_status(err: WebScoutError) -> u16 {
        match err {
            WebScoutError::Provider { status, .. } => status,
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn structured_payload_extracts_results() {
        let payload = normalize(json!({
            "answer": "Rust is a systems language.",
            "results": [
                {"title": "The Rust Book", "url": "https://doc.rust-lang.org/book/", "content": "ownership"},
                {"title": "Tokio", "url": "https://tokio.rs", "content": "async runtime"},
            ]
        }))
        .unwrap();

        assert_eq!(payload.answer.as_deref(), Some("Rust is a systems language."));
        assert_eq!(payload.results.len(), 2);
        assert_eq!(payload.results[0].title, "The Rust Book");
    }

    #[test]
    fn textual_payload_gets_one_parse_attempt() {
        let text = r#"{"results": [{"title": "t", "url": "u", "content": "c"}]}"#;
        let payload = normalize(Value::String(text.into())).unwrap();
        assert_eq!(payload.results.len(), 1);
    }

    #[test]
    fn unparseable_text_is_status_500_with_raw_attached() {
        let err = normalize(Value::String("<html>oops</html>".into())).unwrap_err();
        match err {
            WebScoutError::Provider { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, Value::String("<html>oops</html>".into()));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn non_mapping_payload_is_status_500() {
        assert_eq!(provider_status(normalize(json!([1, 2, 3])).unwrap_err()), 500);
        assert_eq!(provider_status(normalize(json!(42)).unwrap_err()), 500);
    }

    #[test]
    fn explicit_error_field_is_status_422() {
        let err = normalize(json!({"error": "invalid api key"})).unwrap_err();
        match err {
            WebScoutError::Provider { status, body, .. } => {
                assert_eq!(status, 422);
                assert_eq!(body["error"], "invalid api key");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn missing_or_empty_results_is_status_404() {
        assert_eq!(
            provider_status(normalize(json!({"answer": "hm"})).unwrap_err()),
            404
        );
        assert_eq!(
            provider_status(normalize(json!({"results": []})).unwrap_err()),
            404
        );
    }

    #[test]
    fn malformed_result_is_skipped_not_fatal() {
        let payload = normalize(json!({
            "results": [
                {"title": "good", "url": "https://example.com", "content": "c"},
                "just a string",
                {"content": 7},
            ]
        }))
        .unwrap();

        assert_eq!(payload.results.len(), 2);
        assert_eq!(payload.results[0].title, "good");
        // Missing fields default, non-string values keep their JSON text
        assert_eq!(payload.results[1].title, DEFAULT_TITLE);
        assert_eq!(payload.results[1].url, "");
        assert_eq!(payload.results[1].content, "7");
    }
}
