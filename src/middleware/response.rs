use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Map, Value};

use crate::auth::AuthContext;
use crate::error::ApiFailure;

/// Successful API response; the body always echoes the caller's auth context
#[derive(Debug)]
pub struct ApiResponse {
    pub auth: AuthContext,
    pub data: Map<String, Value>,
    pub status_code: Option<StatusCode>,
}

impl ApiResponse {
    /// Create a successful API response with default 200 status
    pub fn success(auth: AuthContext, data: Value) -> Self {
        Self {
            auth,
            data: into_map(data),
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(auth: AuthContext, data: Value) -> Self {
        Self {
            status_code: Some(StatusCode::CREATED),
            ..Self::success(auth, data)
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);
        let body = envelope(&self.auth, "success", self.data);
        (status, Json(body)).into_response()
    }
}

/// Merge `{userid, groups, status}` with a payload. Payload keys win on conflict
/// except for the auth fields and status, which are always the resolved ones.
pub fn envelope(auth: &AuthContext, status: &str, payload: Map<String, Value>) -> Value {
    let mut body = payload;
    body.insert("userid".to_string(), json!(auth.userid));
    body.insert("groups".to_string(), json!(auth.groups));
    body.insert("status".to_string(), json!(status));
    Value::Object(body)
}

fn into_map(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}

// Convenience type alias
pub type ApiResult = Result<ApiResponse, ApiFailure>;
