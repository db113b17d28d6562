//! HTTP methods an endpoint can be bound to.

use axum::routing::MethodFilter;
use std::fmt;

/// Methods with a dedicated route; anything else becomes a catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    /// Unrecognized method, bound to every method on the path
    Other,
}

impl HttpMethod {
    /// Parse a configured method name (case-insensitive).
    pub fn parse(method: &str) -> Self {
        match method.trim().to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            _ => HttpMethod::Other,
        }
    }

    /// Router filter for this method, `None` for the catch-all.
    pub fn filter(self) -> Option<MethodFilter> {
        match self {
            HttpMethod::Get => Some(MethodFilter::GET),
            HttpMethod::Post => Some(MethodFilter::POST),
            HttpMethod::Put => Some(MethodFilter::PUT),
            HttpMethod::Delete => Some(MethodFilter::DELETE),
            HttpMethod::Patch => Some(MethodFilter::PATCH),
            HttpMethod::Other => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Other => "ANY",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_methods() {
        assert_eq!(HttpMethod::parse("GET"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::parse(" Put "), HttpMethod::Put);
        assert_eq!(HttpMethod::parse("DELETE"), HttpMethod::Delete);
        assert_eq!(HttpMethod::parse("patch"), HttpMethod::Patch);
    }

    #[test]
    fn test_parse_unknown_falls_back() {
        assert_eq!(HttpMethod::parse("OPTIONS"), HttpMethod::Other);
        assert_eq!(HttpMethod::parse(""), HttpMethod::Other);
        assert_eq!(HttpMethod::parse("ANY"), HttpMethod::Other);
        assert!(HttpMethod::Other.filter().is_none());
    }

    #[test]
    fn test_filter() {
        assert!(HttpMethod::Get.filter().is_some());
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }
}
