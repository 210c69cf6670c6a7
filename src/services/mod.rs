//! Request orchestration: auth context -> body parsing -> validation -> store.

pub mod category_service;
pub mod task_service;

use serde_json::{Map, Value};

use crate::error::ApiError;

pub use category_service::CategoryService;
pub use task_service::TaskService;

/// Parse a request body that must be a non-empty JSON object
pub fn parse_object_body(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        Ok(_) => Err(ApiError::malformed_body()),
        Err(e) => {
            tracing::debug!("Rejected request body: {}", e);
            Err(ApiError::malformed_body())
        }
    }
}
