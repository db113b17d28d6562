//! Observed request view.
//!
//! Flattens an incoming request into the three sources conditions are
//! evaluated against: query parameters, headers and the JSON body payload.

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Per-request data conditions are matched against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedRequest {
    /// Query parameters, the last value wins for repeated keys
    pub query: HashMap<String, String>,
    /// Headers keyed by lowercase name, the first value wins
    pub headers: HashMap<String, String>,
    /// JSON object body, empty when absent or not an object
    pub payload: Map<String, Value>,
}

impl ObservedRequest {
    /// Build the view from raw request parts.
    ///
    /// Never fails: a body that is not a JSON object, or is nested deeper
    /// than `max_payload_depth`, yields an empty payload.
    pub fn from_parts(
        query_string: Option<&str>,
        headers: &HeaderMap,
        body: &[u8],
        max_payload_depth: usize,
    ) -> Self {
        Self {
            query: parse_query_string(query_string.unwrap_or("")),
            headers: flatten_headers(headers),
            payload: parse_payload(body, max_payload_depth),
        }
    }
}

/// Parse a URL-encoded query string into key-value pairs.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Flatten a header map to single values keyed by lowercase name.
///
/// Values that are not valid UTF-8 are skipped.
pub fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        flat.entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| value.to_string());
    }
    flat
}

/// Parse a request body as a JSON object.
pub fn parse_payload(body: &[u8], max_depth: usize) -> Map<String, Value> {
    if body.is_empty() {
        return Map::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => {
            if map.values().all(|v| within_depth(v, max_depth.saturating_sub(1))) {
                map
            } else {
                tracing::debug!(max_depth, "Request body nested too deeply, ignoring payload");
                Map::new()
            }
        }
        Ok(_) => {
            tracing::debug!("Request body is not a JSON object, ignoring payload");
            Map::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Request body is not valid JSON, ignoring payload");
            Map::new()
        }
    }
}

/// Whether a value nests at most `remaining` further containers.
fn within_depth(value: &Value, remaining: usize) -> bool {
    match value {
        Value::Object(map) => {
            remaining > 0 && map.values().all(|v| within_depth(v, remaining - 1))
        }
        Value::Array(items) => {
            remaining > 0 && items.iter().all(|v| within_depth(v, remaining - 1))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_parse_query_string() {
        let params = parse_query_string("foo=bar&baz=qux");
        assert_eq!(params.get("foo"), Some(&"bar".to_string()));
        assert_eq!(params.get("baz"), Some(&"qux".to_string()));

        let params = parse_query_string("name=John%20Doe&city=New+York");
        assert_eq!(params.get("name"), Some(&"John Doe".to_string()));
        assert_eq!(params.get("city"), Some(&"New York".to_string()));
    }

    #[test]
    fn test_query_last_value_wins() {
        let params = parse_query_string("age=30&age=40");
        assert_eq!(params.get("age"), Some(&"40".to_string()));
    }

    #[test]
    fn test_query_flag_without_value() {
        let params = parse_query_string("verbose&x=1");
        assert_eq!(params.get("verbose"), Some(&String::new()));
        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn test_flatten_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("text/plain"));

        let flat = flatten_headers(&headers);
        assert_eq!(flat.get("x-api-key"), Some(&"secret".to_string()));
        assert_eq!(flat.get("accept"), Some(&"application/json".to_string()));
    }

    #[test]
    fn test_parse_payload_object() {
        let payload = parse_payload(br#"{"username": "nguyend", "data": {"age": 10}}"#, 64);
        assert_eq!(payload.get("username"), Some(&json!("nguyend")));
        assert_eq!(payload.get("data"), Some(&json!({"age": 10})));
    }

    #[test]
    fn test_parse_payload_recovers_from_bad_input() {
        assert!(parse_payload(b"", 64).is_empty());
        assert!(parse_payload(b"not json", 64).is_empty());
        assert!(parse_payload(b"[1, 2, 3]", 64).is_empty());
        assert!(parse_payload(b"\"text\"", 64).is_empty());
        assert!(parse_payload(br#"{"a": 1"#, 64).is_empty());
    }

    #[test]
    fn test_parse_payload_depth_limit() {
        let body = br#"{"a": {"b": {"c": 1}}}"#;
        assert!(!parse_payload(body, 3).is_empty());
        assert!(parse_payload(body, 2).is_empty());

        let body = br#"{"a": [[1]]}"#;
        assert!(!parse_payload(body, 3).is_empty());
        assert!(parse_payload(body, 2).is_empty());
    }

    #[test]
    fn test_from_parts() {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant", HeaderValue::from_static("acme"));

        let observed = ObservedRequest::from_parts(
            Some("page=2"),
            &headers,
            br#"{"name": "widget"}"#,
            64,
        );
        assert_eq!(observed.query.get("page"), Some(&"2".to_string()));
        assert_eq!(observed.headers.get("x-tenant"), Some(&"acme".to_string()));
        assert_eq!(observed.payload.get("name"), Some(&json!("widget")));

        let empty = ObservedRequest::from_parts(None, &HeaderMap::new(), b"", 64);
        assert_eq!(empty, ObservedRequest::default());
    }
}
