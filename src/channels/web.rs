//! Web channel: HTTP ingestion plus health and graph endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::error::{ChannelError, ConfigError};
use crate::pipeline::graph::PipelineGraph;
use crate::pipeline::types::{Ingress, RawMessage, RawPayload, WebRequest};

/// Routes served alongside ingestion; the ingest path may not shadow them.
const RESERVED_PATHS: &[&str] = &["/health", "/graph"];

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_addr: String,
    /// Route accepting `POST {"text": ...}`.
    pub ingest_path: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            ingest_path: "/test".to_string(),
        }
    }
}

impl WebConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let bind_addr = lookup("RELAY_HTTP_ADDR")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.bind_addr);
        let ingest_path = lookup("RELAY_HTTP_PATH")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.ingest_path);

        if !ingest_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_HTTP_PATH".into(),
                message: format!("{ingest_path:?} must start with '/'"),
            });
        }
        if RESERVED_PATHS.contains(&ingest_path.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_HTTP_PATH".into(),
                message: format!("{ingest_path:?} is already served"),
            });
        }

        Ok(Self {
            bind_addr,
            ingest_path,
        })
    }
}

#[derive(Clone)]
struct WebState {
    ingress: Ingress,
    graph: Arc<PipelineGraph>,
}

/// Build the router: ingestion at `config.ingest_path`, `/health`, `/graph`.
pub fn routes(ingress: Ingress, graph: Arc<PipelineGraph>, config: &WebConfig) -> Router {
    let state = WebState { ingress, graph };

    Router::new()
        .route(&config.ingest_path, post(ingest))
        .route("/health", get(health))
        .route("/graph", get(describe_graph))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address.
pub async fn bind(config: &WebConfig) -> Result<TcpListener, ChannelError> {
    TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| ChannelError::StartupFailed {
            name: "web".into(),
            reason: format!("cannot bind {}: {e}", config.bind_addr),
        })
}

async fn ingest(State(state): State<WebState>, Json(body): Json<WebRequest>) -> impl IntoResponse {
    let message = RawMessage::new(RawPayload::Web(body));
    let id = message.id;

    match state.ingress.send(message).await {
        Ok(()) => {
            debug!(%id, "Accepted web message");
            (
                StatusCode::OK,
                Json(serde_json::json!({"status": "accepted", "id": id})),
            )
        }
        Err(_) => {
            let err = ChannelError::PipelineClosed { name: "web".into() };
            warn!(%id, "Rejecting web message: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"error": "Pipeline is not accepting messages"})),
            )
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn describe_graph(State(state): State<WebState>) -> impl IntoResponse {
    Json(state.graph.as_ref().clone())
}
