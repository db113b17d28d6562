//! Route dispatcher and HTTP server.
//!
//! Builds an immutable axum router with one handler per configured endpoint.
//! Each handler captures its endpoint's result list, builds the observed
//! request view and answers with the first matching response, or 404.

use crate::config::{Endpoint, GlobalSettings, MockServerConfig, ResponseDefinition};
use crate::matcher;
use crate::method::HttpMethod;
use crate::request::ObservedRequest;
use crate::route::route_path;
use axum::{
    body::Bytes,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json, Router,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Everything a handler needs, shared read-only across requests.
#[derive(Clone)]
struct EndpointState {
    endpoint: Arc<Endpoint>,
    settings: Arc<GlobalSettings>,
}

/// Mock HTTP server.
pub struct MockServer {
    config: MockServerConfig,
    router: Router,
}

impl MockServer {
    /// Create a new server with the given configuration.
    pub fn new(config: MockServerConfig) -> Self {
        let router = build_router(&config);

        info!(
            endpoints = config.endpoints.len(),
            results = config.endpoints.iter().map(|e| e.results.len()).sum::<usize>(),
            "Mock server initialized"
        );

        Self { config, router }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MockServerConfig {
        &self.config
    }

    /// The router serving the configured endpoints.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve requests on the listener until Ctrl-C is received.
    pub async fn run(self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        info!(address = %addr, "Mock server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Mock server stopped");
        Ok(())
    }
}

/// Build the route table for every configured endpoint.
///
/// Endpoints whose paths share a shape are merged into one method router; an
/// endpoint with an unrecognized method answers every method the path has no
/// explicit handler for. A repeated method and shape keeps the first
/// declaration, and an unroutable path is skipped.
pub fn build_router(config: &MockServerConfig) -> Router {
    let settings = Arc::new(config.settings.clone());
    let mut table: BTreeMap<String, (MethodRouter, HashSet<HttpMethod>)> = BTreeMap::new();

    for endpoint in &config.endpoints {
        let method = HttpMethod::parse(&endpoint.method);
        let path = match route_path(&endpoint.path) {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    method = %endpoint.method,
                    path = %endpoint.path,
                    error = %e,
                    "Unroutable endpoint ignored"
                );
                continue;
            }
        };

        let (mut routes, mut methods) = table
            .remove(&path)
            .unwrap_or_else(|| (MethodRouter::new(), HashSet::new()));

        if !methods.insert(method) {
            warn!(
                method = %endpoint.method,
                path = %endpoint.path,
                "Duplicate endpoint ignored"
            );
            table.insert(path, (routes, methods));
            continue;
        }

        let state = EndpointState {
            endpoint: Arc::new(endpoint.clone()),
            settings: settings.clone(),
        };
        let handler = move |request: Request| dispatch(state.clone(), request);

        routes = match method.filter() {
            Some(filter) => routes.on(filter, handler),
            None => routes.fallback(handler),
        };

        debug!(
            method = %endpoint.method,
            path = %endpoint.path,
            results = endpoint.results.len(),
            "Registered endpoint"
        );
        table.insert(path, (routes, methods));
    }

    table
        .into_iter()
        .fold(Router::new(), |router, (path, (routes, _))| router.route(&path, routes))
        .layer(TraceLayer::new_for_http())
}

/// Handle one request for an endpoint.
async fn dispatch(state: EndpointState, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.settings.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Failed to read request body, treating as empty");
            Bytes::new()
        }
    };

    let observed = ObservedRequest::from_parts(
        parts.uri.query(),
        &parts.headers,
        &body,
        state.settings.max_payload_depth,
    );

    match matcher::select(&observed, &state.endpoint.results) {
        Some(matched) => {
            if state.settings.log_matches {
                info!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    result = matched.index,
                    status = matched.response.return_code,
                    "Request matched result"
                );
            }
            respond(matched.response)
        }
        None => {
            if state.settings.log_unmatched {
                warn!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    "No matching result found"
                );
            }
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Write a configured response as status plus JSON body.
fn respond(response: &ResponseDefinition) -> Response {
    let status = StatusCode::from_u16(response.return_code).unwrap_or_else(|_| {
        warn!(code = response.return_code, "Invalid returnCode, answering 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });
    if !body_allowed(status) {
        return status.into_response();
    }
    (status, Json(response.return_object.clone())).into_response()
}

/// 1xx, 204 and 304 responses carry no body.
fn body_allowed(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_respond_status_and_body() {
        let response = respond(&ResponseDefinition {
            return_code: 201,
            return_object: json!({"id": 1}),
        });
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_respond_no_content_has_no_body() {
        let response = respond(&ResponseDefinition {
            return_code: 204,
            return_object: json!({"ignored": true}),
        });
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get("content-type").is_none());
        assert!(body_allowed(StatusCode::OK));
        assert!(!body_allowed(StatusCode::NOT_MODIFIED));
        assert!(!body_allowed(StatusCode::CONTINUE));
    }

    #[test]
    fn test_respond_invalid_code() {
        let response = respond(&ResponseDefinition {
            return_code: 42,
            return_object: json!(null),
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_build_router_tolerates_duplicates() {
        let yaml = r#"
endpoints:
  - path: /a
    method: GET
    results: []
  - path: /a
    method: GET
    results: []
  - path: /a
    method: FOO
    results: []
  - path: /a
    method: BAR
    results: []
"#;
        let config = MockServerConfig::from_yaml(yaml).unwrap();
        let server = MockServer::new(config);
        assert_eq!(server.config().endpoints.len(), 4);
    }

    #[test]
    fn test_build_router_skips_unroutable_paths() {
        let yaml = r#"
endpoints:
  - path: no-slash
    method: GET
    results: []
  - path: /files/*rest/meta
    method: GET
    results: []
  - path: "/users/:"
    method: GET
    results: []
  - path: /ok
    method: GET
    results: []
"#;
        let config = MockServerConfig::from_yaml(yaml).unwrap();
        assert!(config.validate().is_err());
        let server = MockServer::new(config);
        assert_eq!(server.config().endpoints.len(), 4);
    }

    #[test]
    fn test_build_router_merges_renamed_parameters() {
        let yaml = r#"
endpoints:
  - path: /users/:id
    method: GET
    results: []
  - path: /users/:name
    method: POST
    results: []
  - path: /users/:other
    method: POST
    results: []
"#;
        let config = MockServerConfig::from_yaml(yaml).unwrap();
        let server = MockServer::new(config);
        assert_eq!(server.config().endpoints.len(), 3);
    }
}
