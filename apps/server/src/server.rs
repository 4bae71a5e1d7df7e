//! HTTP front-end for the research agent.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/research` | Run a research query, return the envelope |
//! | `GET`  | `/api/research/{id}` | Fetch a previously stored envelope |
//! | `GET`  | `/api/errors` | Error-ledger statistics report |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Every error response is the structured envelope from
//! [`webscout_shared::format_error`] — a raw failure never crosses this
//! boundary. All origins, methods, and headers are permitted to support
//! browser-based clients.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use webscout_agent::ResearchAgent;
use webscout_ledger::ErrorLedger;
use webscout_shared::{AppConfig, WebScoutError, format_error};
use webscout_storage::{RecordKind, ResultStore};

/// Response header carrying the id a successful envelope was stored under.
const RESEARCH_ID_HEADER: &str = "x-research-id";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    agent: Arc<ResearchAgent>,
    ledger: Arc<ErrorLedger>,
    store: Arc<dyn ResultStore>,
    default_depth: u8,
}

/// Start the HTTP server with the wired components.
pub(crate) async fn run(
    config: AppConfig,
    agent: Arc<ResearchAgent>,
    ledger: Arc<ErrorLedger>,
    store: Box<dyn ResultStore>,
) -> color_eyre::eyre::Result<()> {
    let state = AppState {
        agent,
        ledger,
        store: Arc::from(store),
        default_depth: config.research.default_depth,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/research", post(handle_research))
        .route("/api/research/{id}", get(handle_get_research))
        .route("/api/errors", get(handle_error_stats))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// POST /api/research
// ---------------------------------------------------------------------------

/// JSON body of a research request.
#[derive(Debug, Deserialize)]
struct ResearchBody {
    query: String,
    depth: Option<i64>,
}

async fn handle_research(
    State(state): State<AppState>,
    Json(body): Json<ResearchBody>,
) -> Response {
    let depth = body.depth.unwrap_or(i64::from(state.default_depth));

    match state.agent.search_and_analyze(&body.query, depth).await {
        Ok(envelope) => {
            let research_id = Uuid::now_v7().to_string();
            match serde_json::to_value(&envelope) {
                Ok(value) => {
                    if !state
                        .store
                        .save(RecordKind::Research, &research_id, &value)
                        .await
                    {
                        warn!(research_id, "failed to persist research result");
                    }
                }
                Err(e) => warn!(error = %e, "envelope not convertible for storage"),
            }

            let mut response = (StatusCode::OK, Json(envelope)).into_response();
            if let Ok(header) = HeaderValue::from_str(&research_id) {
                response.headers_mut().insert(RESEARCH_ID_HEADER, header);
            }
            response
        }
        Err(err) => error_response(&err),
    }
}

/// Map a classified error to its HTTP status and formatted envelope.
fn error_response(err: &WebScoutError) -> Response {
    let status = match err {
        WebScoutError::Validation { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(format_error(err))).into_response()
}

// ---------------------------------------------------------------------------
// GET /api/research/{id}
// ---------------------------------------------------------------------------

async fn handle_get_research(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.get(RecordKind::Research, &id).await {
        Some(value) => (StatusCode::OK, Json(value)).into_response(),
        None => not_found_body(),
    }
}

// ---------------------------------------------------------------------------
// GET /api/errors
// ---------------------------------------------------------------------------

async fn handle_error_stats(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.ledger.snapshot())).into_response()
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

async fn handle_not_found() -> Response {
    not_found_body()
}

fn not_found_body() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Not found"})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn validation_errors_map_to_400() {
        let mut fields = BTreeMap::new();
        fields.insert("query".to_string(), "too short".to_string());
        let response = error_response(&WebScoutError::validation(fields));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_map_to_500() {
        let provider = WebScoutError::provider(404, "No results found", serde_json::Value::Null);
        assert_eq!(
            error_response(&provider).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let unknown = WebScoutError::Unknown {
            type_name: "T".into(),
            detail: "boom".into(),
        };
        assert_eq!(
            error_response(&unknown).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn research_body_depth_is_optional() {
        let body: ResearchBody = serde_json::from_str(r#"{"query": "rust"}"#).unwrap();
        assert_eq!(body.depth, None);

        let body: ResearchBody = serde_json::from_str(r#"{"query": "rust", "depth": 4}"#).unwrap();
        assert_eq!(body.depth, Some(4));
    }
}
