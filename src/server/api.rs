//! HTTP API for submitting and inspecting builds

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::page;
use super::SharedState;
use crate::build::{Build, BuildId, BuildSummary, Repository};
use crate::error::BuildyError;
use crate::history::{self, HistoryEntry};

// ── Response payload types ────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: BuildId,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<BuildyError> for ApiError {
    fn from(err: BuildyError) -> Self {
        error!("Request failed: {}", err);
        ApiError::Internal(err.to_string())
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/build", get(list_builds).post(create_build))
        .route("/build/{id}", get(get_build))
        .route("/build/{id}/log", get(get_build_log))
        .route("/build/{id}/cancel", post(cancel_build))
        .route("/history", get(list_history))
        .route("/history/{id}/log", get(get_history_log))
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Parse a build id from the path. Anything that is not a UUID is unknown.
fn parse_id(raw: &str) -> Result<BuildId, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("Build {} not found", raw)))
}

fn lookup(state: &SharedState, raw: &str) -> Result<Arc<Build>, ApiError> {
    let id = parse_id(raw)?;
    state
        .cache
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Build {} not found", id)))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn index(State(state): State<SharedState>) -> Html<String> {
    Html(page::render_index(&state.cache.ranked()))
}

async fn health_check() -> &'static str {
    "ok"
}

async fn create_build(
    State(state): State<SharedState>,
    Json(repository): Json<Repository>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let build = Build::start(&state.builds_dir, repository, &state.pipeline).await?;
    let id = build.id();

    state
        .audit
        .log(
            "build.created",
            &serde_json::json!({"id": id, "repository": build.repository()}),
        )
        .await;

    for (evicted, old) in state.cache.put(id, build) {
        old.flush_note().await;
        state
            .audit
            .log("build.evicted", &serde_json::json!({"id": evicted}))
            .await;
    }

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn list_builds(State(state): State<SharedState>) -> Json<Vec<BuildSummary>> {
    Json(
        state
            .cache
            .ranked()
            .iter()
            .map(|(build, status)| build.summary_with(*status))
            .collect(),
    )
}

async fn get_build(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BuildSummary>, ApiError> {
    Ok(Json(lookup(&state, &id)?.summary()))
}

async fn get_build_log(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    Ok(lookup(&state, &id)?.log().await?)
}

async fn cancel_build(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BuildSummary>, ApiError> {
    let build = lookup(&state, &id)?;

    if build.cancel().await {
        info!("Build {} cancelled on request", build.id());
        state
            .audit
            .log("build.cancelled", &serde_json::json!({"id": build.id()}))
            .await;
    }

    Ok(Json(build.summary()))
}

async fn list_history(
    State(state): State<SharedState>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let entries = history::discover(&state.builds_dir, &state.cache.keys()).await?;
    Ok(Json(entries))
}

async fn get_history_log(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&id)?;
    history::read_log(&state.builds_dir, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Build {} not found", id)))
}

// ── Tests ─────────────────────────────────────────────────────────────
