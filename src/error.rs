//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not fit the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An endpoint definition is unusable.
    #[error("endpoint {index} ({method} {path}): {reason}")]
    InvalidEndpoint {
        index: usize,
        method: String,
        path: String,
        reason: String,
    },
}

/// Reasons a configured path cannot be turned into a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("path must start with '/'")]
    MissingLeadingSlash,

    #[error("parameter at segment {position} has no name")]
    EmptyParameterName { position: usize },

    #[error("catch-all at segment {position} must be the last segment")]
    CatchAllNotLast { position: usize },
}
