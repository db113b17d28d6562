//! Configuration for the mock server.
//!
//! Defines the listen address, the endpoints and, for every endpoint, the
//! ordered list of candidate results with their gating conditions.

use crate::error::ConfigError;
use crate::method::HttpMethod;
use crate::route::route_path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Main configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockServerConfig {
    /// Listen address
    #[serde(default)]
    pub server: ServerSettings,

    /// Configured endpoints, registered in declaration order
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,

    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,
}

impl MockServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without validating it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            let invalid = |reason: String| ConfigError::InvalidEndpoint {
                index,
                method: endpoint.method.clone(),
                path: endpoint.path.clone(),
                reason,
            };

            let shape = route_path(&endpoint.path).map_err(|e| invalid(e.to_string()))?;

            for (i, result) in endpoint.results.iter().enumerate() {
                let code = result.response.return_code;
                if !(100..=599).contains(&code) {
                    return Err(invalid(format!("result {}: invalid returnCode {}", i, code)));
                }
            }

            let method = HttpMethod::parse(&endpoint.method);
            if !seen.insert((method, shape)) {
                return Err(invalid("duplicate method and path".to_string()));
            }
        }

        Ok(())
    }

    /// Socket address string the server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Listen address settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// A configured route with its ordered candidate results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Endpoint {
    /// Route path, `:name` and `*name` segments capture path parameters
    pub path: String,

    /// HTTP method; anything outside GET/POST/PUT/DELETE/PATCH matches every method
    #[serde(default)]
    pub method: String,

    /// Candidate results, first match wins
    #[serde(default)]
    pub results: Vec<MockResult>,
}

/// One candidate response plus the condition gating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockResult {
    /// Condition; `None` makes this the fallback result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,

    pub response: ResponseDefinition,
}

/// Declarative predicate over the observed request.
///
/// Each absent (or empty) mapping places no constraint on the request.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    /// URL query parameters, single level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,

    /// JSON body fields, may nest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,

    /// Request headers, single level, names are case-insensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Map<String, Value>>,
}

/// Response written when a result is selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ResponseDefinition {
    /// HTTP status code
    pub return_code: u16,

    /// Body, serialized verbatim as JSON
    #[serde(default)]
    pub return_object: Value,
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Log matched requests
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log unmatched requests
    #[serde(default = "default_true")]
    pub log_unmatched: bool,

    /// Request bodies nested deeper than this are treated as empty
    #[serde(default = "default_max_payload_depth")]
    pub max_payload_depth: usize,

    /// Request bodies larger than this are treated as empty
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
            max_payload_depth: default_max_payload_depth(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_payload_depth() -> usize {
    64
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Resolve a configuration path.
///
/// Absolute paths are returned unchanged. Relative paths are resolved against
/// the directory of the running executable, or the current directory when
/// that cannot be determined.
pub fn resolve_config_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();

    base.join(path)
}
