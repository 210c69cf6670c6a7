use axum::{extract::State, Extension};
use serde_json::json;

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/v1/users - the configured allow-list, not derived from the
/// credential or membership records
pub async fn get(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult {
    Ok(ApiResponse::success(auth, json!({ "users": state.allowed_users.as_ref() })))
}
