use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{AuthContext, AuthDirectory};

/// Resolves the caller's identity and groups and injects the resulting
/// [`AuthContext`] into the request. Never rejects: callers without a
/// recognized token proceed as guest.
pub async fn resolve_auth_middleware(
    State(directory): State<Arc<AuthDirectory>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(&headers);
    let auth = AuthContext::resolve(&directory, token.as_deref());

    tracing::debug!("Resolved caller {} in groups {:?}", auth.userid, auth.groups);

    request.extensions_mut().insert(auth);
    next.run(request).await
}

/// Token from an `Authorization: Bearer <token>` header. Missing headers,
/// other schemes and unreadable values yield `None`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    // Last whitespace-separated part, so "Bearer  abc" still yields "abc"
    token.split(' ').last().map(str::to_string)
}
