use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    Extension,
};
use serde_json::json;

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/v1/tasks - validate and create a task
pub async fn collection_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let body = body.map_err(|e| ApiError::from(e).with_auth(&auth))?;
    match state.tasks.create(&auth, &body).await {
        Ok(task_id) => Ok(ApiResponse::created(
            auth,
            json!({ "message": "Task created successfully", "task_id": task_id }),
        )),
        Err(e) => Err(e.with_auth(&auth)),
    }
}

/// GET /api/v1/tasks - tasks visible to the caller's groups
pub async fn collection_get(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult {
    match state.tasks.list(&auth).await {
        Ok(tasks) => Ok(ApiResponse::success(auth, json!({ "tasks": tasks }))),
        Err(e) => Err(e.with_auth(&auth)),
    }
}

/// GET /api/v1/tasks/:task_id - single task by id
pub async fn record_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    task_id: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let Path(task_id) = task_id.map_err(|e| ApiError::from(e).with_auth(&auth))?;
    match state.tasks.get(&task_id).await {
        Ok(task) => Ok(ApiResponse::success(auth, json!({ "task": task }))),
        Err(e) => Err(e.with_auth(&auth)),
    }
}

/// PUT /api/v1/tasks/:task_id - partial update
pub async fn record_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    task_id: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let Path(task_id) = task_id.map_err(|e| ApiError::from(e).with_auth(&auth))?;
    let body = body.map_err(|e| ApiError::from(e).with_auth(&auth))?;
    match state.tasks.modify(&auth, &task_id, &body).await {
        Ok(()) => Ok(ApiResponse::success(
            auth,
            json!({ "message": "Task updated successfully", "task_id": task_id }),
        )),
        Err(e) => Err(e.with_auth(&auth)),
    }
}
