//! HTTP surface consumed by the dashboard views.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::error;

use crate::model::{CompletionState, RoadmapDocument};
use crate::progress;
use crate::session::{render_document, SAVE_MESSAGE};
use crate::store::{RemoteFileStore, StoreError};

/// Field carrying the version token alongside the document on the wire.
const SHA_FIELD: &str = "_sha";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteFileStore>,
    pub tasks_path: String,
    pub state_path: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tasks", get(get_tasks).put(put_tasks))
        .route("/state", get(get_state))
        .route("/progress", get(get_progress))
        .route("/healthz", get(healthz))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Read failures surface as 500 with the store's message; a conflict on the
/// write path is the caller's stale token, reported as 409.
fn store_error_response(e: &StoreError, conditional_write: bool) -> Response {
    let status = match e {
        StoreError::VersionConflict { .. } if conditional_write => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %e, "store call failed");
    }
    error_response(status, e.to_string())
}

async fn get_tasks(State(state): State<AppState>) -> Response {
    let file = match state.store.read(&state.tasks_path).await {
        Ok(file) => file,
        Err(e) => return store_error_response(&e, false),
    };
    let doc: RoadmapDocument = match serde_json::from_str(&file.content) {
        Ok(doc) => doc,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("stored roadmap is not valid JSON: {e}"),
            )
        }
    };
    let mut payload = match serde_json::to_value(&doc) {
        Ok(Value::Object(map)) => map,
        _ => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "roadmap serialization failed"),
    };
    payload.insert(SHA_FIELD.to_string(), Value::String(file.version));
    Json(Value::Object(payload)).into_response()
}

async fn put_tasks(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let Value::Object(mut map) = body else {
        return error_response(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };
    let Some(Value::String(sha)) = map.remove(SHA_FIELD) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing _sha field");
    };
    let doc: RoadmapDocument = match serde_json::from_value(Value::Object(map)) {
        Ok(doc) => doc,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid roadmap body: {e}"))
        }
    };
    let content = match render_document(&doc) {
        Ok(content) => content,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    match state
        .store
        .write(&state.tasks_path, &content, &sha, SAVE_MESSAGE)
        .await
    {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => store_error_response(&e, true),
    }
}

async fn get_state(State(state): State<AppState>) -> Response {
    let file = match state.store.read(&state.state_path).await {
        Ok(file) => file,
        Err(e) => return store_error_response(&e, false),
    };
    match serde_json::from_str::<CompletionState>(&file.content) {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("stored state is not valid JSON: {e}"),
        ),
    }
}

/// Server-side aggregation of what the dashboard landing page renders:
/// current week, per-week summaries, and the overall counts.
async fn get_progress(State(state): State<AppState>) -> Response {
    let tasks_file = match state.store.read(&state.tasks_path).await {
        Ok(file) => file,
        Err(e) => return store_error_response(&e, false),
    };
    let state_file = match state.store.read(&state.state_path).await {
        Ok(file) => file,
        Err(e) => return store_error_response(&e, false),
    };
    let doc: RoadmapDocument = match serde_json::from_str(&tasks_file.content) {
        Ok(doc) => doc,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("stored roadmap is not valid JSON: {e}"),
            )
        }
    };
    let completion: CompletionState = match serde_json::from_str(&state_file.content) {
        Ok(doc) => doc,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("stored state is not valid JSON: {e}"),
            )
        }
    };

    let today = chrono::Utc::now().date_naive();
    let week = progress::current_week(completion.start_date, today);
    let total_weeks = progress::total_weeks(&doc).unwrap_or(0);
    let weeks: Vec<_> = (1..=total_weeks)
        .map(|w| progress::week_summary(&doc, &completion, w))
        .collect();
    let overall = progress::overall_progress(&doc, &completion);

    Json(json!({
        "week": week,
        "totalWeeks": total_weeks,
        "overall": overall,
        "weeks": weeks,
    }))
    .into_response()
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}
