use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use vigil_common::types::MetricSample;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/count", get(count))
        .route("/history/{key}", get(history))
        .route("/v1/push", post(push))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> &'static str {
    crate::VERSION
}

async fn count(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "series": state.history.series_count(),
        "events": state.last_events.len(),
    }))
}

async fn history(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let Some(window) = state.history.get(&key) else {
        return Err(StatusCode::NOT_FOUND);
    };
    let entries = window.read().entries();
    Ok(Json(json!({ "key": key, "history": entries })))
}

/// Ingestion endpoint. The acknowledgement is independent of judge
/// outcomes; a sample that fires ten rules and one that fires none both
/// count as received.
async fn push(State(state): State<AppState>, Json(samples): Json<Vec<MetricSample>>) -> Json<Value> {
    let now = Utc::now().timestamp();
    let received = samples.len();
    for sample in &samples {
        state.engine.judge(sample, now).await;
    }
    tracing::debug!(count = received, "samples judged");
    Json(json!({ "success": true, "received": received }))
}
