use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Extension,
};
use serde_json::json;

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/v1/categories
pub async fn get(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult {
    match state.categories.get().await {
        Ok(categories) => Ok(ApiResponse::success(auth, json!({ "categories": categories }))),
        Err(e) => Err(e.with_auth(&auth)),
    }
}

/// PUT /api/v1/categories - replace the whole list
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let body = body.map_err(|e| ApiError::from(e).with_auth(&auth))?;
    match state.categories.replace(&auth, &body).await {
        Ok(outcome) => Ok(ApiResponse::success(
            auth,
            json!({
                "message": "Categories updated successfully.",
                "matched_count": outcome.matched_count,
                "modified_count": outcome.modified_count,
                "upserted_id": outcome.upserted_id,
            }),
        )),
        Err(e) => Err(e.with_auth(&auth)),
    }
}
