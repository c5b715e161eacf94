//! API routes for the task service

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tasks_cache::CachedRecords;
use tracing::debug;

use crate::tasks::{MemoryTaskStore, TaskFields, TaskQuery};

use super::response::{page_response, record_response, with_cache_source, ApiError};

/// Application state
pub struct AppState {
    pub tasks: CachedRecords<MemoryTaskStore>,
}

pub type SharedState = Arc<AppState>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache_enabled: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_enabled: state.tasks.config().enabled,
    })
}

/// `GET /tasks`
pub async fn list_tasks(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };

    let cached = state.tasks.list(&uri.to_string(), &query).await;
    debug!("GET {} served from {}", uri, cached.source);
    with_cache_source(page_response(cached.outcome), cached.source)
}

/// `GET /tasks/:id`
pub async fn read_task(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    let cached = state.tasks.read(&id).await;
    with_cache_source(record_response(cached.outcome, StatusCode::OK), cached.source)
}

/// `POST /tasks`
pub async fn create_task(
    State(state): State<SharedState>,
    body: Result<Json<TaskFields>, JsonRejection>,
) -> Response {
    let Json(fields) = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };

    record_response(state.tasks.create(fields).await, StatusCode::CREATED)
}

/// `PUT /tasks/:id`
pub async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<TaskFields>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let Json(fields) = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };

    record_response(state.tasks.update(&id, fields).await, StatusCode::OK)
}

/// `DELETE /tasks/:id`
pub async fn delete_task(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    record_response(state.tasks.delete(&id).await, StatusCode::OK)
}

/// Fallback for unknown routes
pub async fn not_found() -> Response {
    ApiError::not_found().into_response()
}

// Ids that cannot name a record are reported as missing records.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found())
}
