//! ==============================================================================
//! service.rs - alert state service (http)
//! ==============================================================================
//!
//! purpose:
//!     owns the environmental state and exposes it over http.
//!
//! endpoints:
//!     - POST /simulate   merge a partial reading, recompute level, return state
//!     - GET  /alert      current {level, language, last_updated}
//!
//! concurrency:
//!     state lives behind arc<rwlock<>>:
//!     - updates hold the write lock for merge + recompute + timestamp
//!     - reads hold the read lock just long enough to clone a snapshot
//!     so a reader never sees a half-merged update.
//!
//! relationships:
//!     - uses: domain.rs (EnvironmentalState, StateUpdate, AlertSnapshot)
//!     - polled by: listener.rs (GET /alert)
//!
//! ==============================================================================

use crate::domain::{AlertSnapshot, EnvironmentalState, StateUpdate};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub type SharedState = Arc<RwLock<EnvironmentalState>>;

pub fn shared_state() -> SharedState {
    Arc::new(RwLock::new(EnvironmentalState::default()))
}

/// errors surfaced to http callers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// body was not json, not an object, or a field had the wrong type
    #[error("malformed update: {0}")]
    MalformedUpdate(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MalformedUpdate(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(serde_json::json!({"status": "error", "message": self.to_string()}));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedUpdate(rejection.body_text())
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/simulate", post(simulate_handler))
        .route("/alert", get(alert_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// bind and serve until `shutdown` resolves
pub async fn run_server<F>(bind: &str, state: SharedState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!("alert service listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// POST /simulate
/// rejected bodies leave the state untouched
async fn simulate_handler(
    State(state): State<SharedState>,
    payload: Result<Json<StateUpdate>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(update) = payload.map_err(|e| {
        tracing::warn!("rejected /simulate body: {}", e.body_text());
        ApiError::from(e)
    })?;

    let updated = {
        let mut guard = state.write().await;
        guard.apply(update, chrono::Utc::now());
        guard.clone()
    };

    tracing::info!(
        level = %updated.alert_level,
        language = %updated.language,
        heat_index = updated.heat_index,
        wind = updated.wind,
        rain = updated.rain,
        "state updated"
    );

    Ok(Json(serde_json::json!({"status": "updated", "state": updated})))
}

/// GET /alert
async fn alert_handler(State(state): State<SharedState>) -> Json<AlertSnapshot> {
    Json(state.read().await.snapshot())
}
