//! HTTP surface
//!
//! Routes, response envelopes and the shared request state. Every failure
//! is turned into one of the JSON envelopes below; nothing reaches the
//! transport as an unhandled error.

use std::io;
use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::ProxyConfig;
use crate::error::{ApiError, FetchError};
use crate::extractors::{Record, RecordSource, TableExtractor, ViewMode};
use crate::fetch::Fetcher;

pub const SERVICE_NAME: &str = "HyperMon Proxy";

/// Everything a handler needs. Immutable after construction.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ProxyConfig>,
    fetcher: Fetcher,
    source: Arc<dyn RecordSource>,
}

impl AppState {
    /// State using the table extractor.
    pub fn new(config: ProxyConfig) -> Result<Self, FetchError> {
        Self::with_source(config, Arc::new(TableExtractor))
    }

    pub fn with_source(
        config: ProxyConfig,
        source: Arc<dyn RecordSource>,
    ) -> Result<Self, FetchError> {
        let fetcher = Fetcher::new(&config.user_agent, config.timeout())?;
        Ok(Self {
            config: Arc::new(config),
            fetcher,
            source,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

pub fn router(state: AppState) -> Router {
    let cors = state.config.cors();

    let router = Router::new()
        .route("/api/keyed-nodes", get(keyed_nodes))
        .route("/api/search-nodes", get(search_nodes))
        .route("/api/node-info/{id}", get(node_info))
        .route("/health", get(health))
        .route("/", get(interface))
        .route("/index.html", get(interface))
        .with_state(state);

    if cors {
        router.layer(middleware::map_response(allow_any_origin))
    } else {
        router
    }
}

/// Serve until the listener fails or `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct KeyedNodesResponse {
    pub success: bool,
    pub nodes: Vec<Record>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<Record>,
    pub count: usize,
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct NodeInfoResponse {
    pub success: bool,
    pub node: Record,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// An [`ApiError`] bound to the envelope of the route that produced it.
#[derive(Debug)]
pub struct RouteError {
    /// Key of the empty list that failure bodies carry, if any.
    list: Option<&'static str>,
    error: ApiError,
}

impl RouteError {
    fn listing(list: &'static str, error: impl Into<ApiError>) -> Self {
        Self {
            list: Some(list),
            error: error.into(),
        }
    }

    fn bare(error: impl Into<ApiError>) -> Self {
        Self {
            list: None,
            error: error.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.error {
            ApiError::MissingSearchTerm | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NodeNotFound => StatusCode::NOT_FOUND,
            ApiError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        let mut body = json!({
            "success": false,
            "error": self.error.to_string(),
        });
        if let Some(list) = self.list {
            body[list] = json!([]);
        }
        body
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.error, "Request failed");
        }

        (status, Json(self.body())).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn keyed_nodes(
    State(state): State<AppState>,
) -> Result<Json<KeyedNodesResponse>, RouteError> {
    let html = state
        .fetcher
        .fetch(&state.config.keyed_url, &[])
        .await
        .map_err(|e| RouteError::listing("nodes", e))?;

    let nodes = state.source.records(&html, ViewMode::Keyed);
    debug!(count = nodes.len(), "Extracted keyed nodes");

    Ok(Json(KeyedNodesResponse {
        success: true,
        count: nodes.len(),
        nodes,
    }))
}

/// First `q` of a raw query string; later duplicates are ignored.
fn search_param(raw: Option<&str>) -> Option<String> {
    form_urlencoded::parse(raw?.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
}

async fn search_nodes(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SearchResponse>, RouteError> {
    let search_term = search_param(query.as_deref())
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    if search_term.is_empty() {
        return Err(RouteError::listing("results", ApiError::MissingSearchTerm));
    }

    let html = state
        .fetcher
        .fetch(&state.config.search_url, &[("search", search_term.as_str())])
        .await
        .map_err(|e| RouteError::listing("results", e))?;

    let results = state.source.records(&html, ViewMode::Search);
    debug!(search_term = %search_term, count = results.len(), "Extracted search results");

    Ok(Json(SearchResponse {
        success: true,
        count: results.len(),
        results,
        search_term,
    }))
}

async fn node_info(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<NodeInfoResponse>, RouteError> {
    let Path(id) =
        id.map_err(|rejection| RouteError::bare(ApiError::InvalidInput(rejection.body_text())))?;

    let html = state
        .fetcher
        .fetch(&state.config.search_url, &[("search", id.as_str())])
        .await
        .map_err(RouteError::bare)?;

    let node = state
        .source
        .lookup(&html, &id, state.config.lookup_fallback())
        .ok_or_else(|| RouteError::bare(ApiError::NodeNotFound))?;

    Ok(Json(NodeInfoResponse {
        success: true,
        node,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

/// Serve the web interface, read fresh from disk on every request.
async fn interface(State(state): State<AppState>) -> Response {
    let path = &state.config.interface;
    match tokio::fs::read_to_string(path).await {
        Ok(html) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            html,
        )
            .into_response(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Web interface file is missing");
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Web interface not found",
                    "message": "hypermon.html is missing from the installation directory",
                })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read web interface");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Web interface unavailable",
                    "message": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
