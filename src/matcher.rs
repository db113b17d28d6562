//! Condition matching and result selection.
//!
//! Conditions are evaluated against an [`ObservedRequest`]. Query and header
//! conditions are flat and compared on string forms; payload conditions are
//! matched structurally and recurse into nested mappings.

use crate::config::{Condition, MockResult, ResponseDefinition};
use crate::request::ObservedRequest;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;

/// Result of selecting a response for a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    /// Position of the selected result in the endpoint's list
    pub index: usize,
    /// The response to write
    pub response: &'a ResponseDefinition,
}

/// Pick the first result whose condition holds for the request.
///
/// Results are consulted in declaration order and a result without a
/// condition always matches. Returns `None` when nothing matches.
pub fn select<'a>(observed: &ObservedRequest, results: &'a [MockResult]) -> Option<MatchResult<'a>> {
    results
        .iter()
        .enumerate()
        .find(|(_, result)| evaluate(observed, result.when.as_ref()))
        .map(|(index, result)| MatchResult {
            index,
            response: &result.response,
        })
}

/// Evaluate a single condition. An absent condition is always true.
pub fn evaluate(observed: &ObservedRequest, condition: Option<&Condition>) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    condition
        .query
        .as_ref()
        .map_or(true, |query| match_flat(&observed.query, query))
        && condition
            .payload
            .as_ref()
            .map_or(true, |payload| match_payload(&observed.payload, payload))
        && condition
            .header
            .as_ref()
            .map_or(true, |header| match_headers(&observed.headers, header))
}

/// Match a flat condition against query-style parameters.
///
/// A parameter missing from `observed` reads as the empty string.
pub fn match_flat(observed: &HashMap<String, String>, condition: &Map<String, Value>) -> bool {
    flat_matches(condition, |key| observed.get(key).map(String::as_str))
}

/// Match a flat condition against headers keyed by lowercase name.
pub fn match_headers(headers: &HashMap<String, String>, condition: &Map<String, Value>) -> bool {
    flat_matches(condition, |key| {
        headers.get(&key.to_ascii_lowercase()).map(String::as_str)
    })
}

fn flat_matches<'o>(condition: &Map<String, Value>, lookup: impl Fn(&str) -> Option<&'o str>) -> bool {
    condition.iter().all(|(key, expected)| {
        let actual = lookup(key).unwrap_or("");
        let matched = flat_text(expected).is_some_and(|expected| expected == actual);
        if !matched {
            tracing::trace!(key = %key, expected = %expected, actual = %actual, "Flat condition mismatch");
        }
        matched
    })
}

/// Match a payload condition against a parsed request body.
///
/// Every condition key must be present in `observed`; nested mappings recurse.
pub fn match_payload(observed: &Map<String, Value>, condition: &Map<String, Value>) -> bool {
    condition.iter().all(|(key, expected)| match observed.get(key) {
        Some(actual) => {
            let matched = values_match(expected, actual);
            if !matched {
                tracing::trace!(key = %key, "Payload condition mismatch");
            }
            matched
        }
        None => {
            tracing::trace!(key = %key, "Payload field missing");
            false
        }
    })
}

/// Compare one condition value against one observed value.
///
/// Scalars compare by their canonical string form, so `10` matches both `10`
/// and `"10"` but not `10.0`.
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    match expected {
        Value::Number(n) => scalar_text(actual).is_some_and(|a| a == n.to_string()),
        Value::String(s) => scalar_text(actual).is_some_and(|a| a == s.as_str()),
        Value::Bool(b) => scalar_text(actual).is_some_and(|a| a == bool_text(*b)),
        Value::Null => actual.is_null(),
        Value::Object(nested) => actual
            .as_object()
            .is_some_and(|actual| match_payload(actual, nested)),
        Value::Array(items) => actual.as_array().is_some_and(|actual| {
            actual.len() == items.len()
                && items.iter().zip(actual).all(|(e, a)| values_match(e, a))
        }),
    }
}

/// String form of an observed scalar; `None` for null and structured values.
fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(bool_text(*b))),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// String form of a flat condition value; null reads as the empty string.
fn flat_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => Some(Cow::Borrowed("")),
        other => scalar_text(other),
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}
