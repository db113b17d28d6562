//! Route path patterns.
//!
//! Configured paths use `:name` for one segment and a trailing `*name` for
//! the rest of the path. Handlers never read path parameters, so parameter
//! names are replaced by positional ones: `/users/:id` and `/users/:name`
//! share the shape `/users/{p2}` and land on the same route.

use crate::error::RouteError;

/// Translate a configured path into its normalized router pattern.
pub fn route_path(path: &str) -> Result<String, RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::MissingLeadingSlash);
    }

    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;

    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteError::EmptyParameterName { position: i });
                }
                Ok(format!("{{p{}}}", i))
            } else if segment.starts_with('*') {
                if i != last {
                    return Err(RouteError::CatchAllNotLast { position: i });
                }
                Ok(format!("{{*p{}}}", i))
            } else {
                Ok(segment.replace('{', "{{").replace('}', "}}"))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|segments| segments.join("/"))
}
