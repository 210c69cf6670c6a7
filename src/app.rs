use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthDirectory;
use crate::config::AppConfig;
use crate::database::Stores;
use crate::handlers;
use crate::middleware::resolve_auth_middleware;
use crate::services::{CategoryService, TaskService};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<AuthDirectory>,
    pub stores: Stores,
    pub tasks: TaskService,
    pub categories: CategoryService,
    pub allowed_users: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(directory: AuthDirectory, stores: Stores, config: &AppConfig) -> Self {
        let directory = Arc::new(directory);
        Self {
            tasks: TaskService::new(stores.tasks.clone(), directory.clone()),
            categories: CategoryService::new(stores.categories.clone()),
            allowed_users: Arc::new(config.api.allowed_users.clone()),
            directory,
            stores,
        }
    }
}

/// Full application router: public routes plus the versioned API
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let app = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Versioned API, auth context resolved for every request
        .nest(
            &config.api.prefix,
            api_routes(state.directory.clone(), config.api.max_request_size_bytes),
        )
        .with_state(state);

    let app = if config.security.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    if config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

/// The body limit is enforced by the handlers' body extractors, after the
/// auth context is resolved
fn api_routes(directory: Arc<AuthDirectory>, max_body_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::users_get))
        .route("/tasks", get(handlers::tasks_list).post(handlers::tasks_create))
        .route("/tasks/:task_id", get(handlers::task_get).put(handlers::task_put))
        .route(
            "/categories",
            get(handlers::categories_get).put(handlers::categories_put),
        )
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(directory, resolve_auth_middleware))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use crate::testing::sample_directory;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        app_with(AppConfig::development())
    }

    fn app_with(mut config: AppConfig) -> Router {
        config.store.backend = StoreBackend::Memory;
        let stores = Stores::from_config(&config).unwrap();
        router(AppState::new(sample_directory(), stores, &config), &config)
    }

    async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_and_health_are_public() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to tmtrack API v1");

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn responses_echo_the_resolved_caller() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/v1/users", Some("token_dana"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userid"], "dana");
        assert_eq!(body["groups"], json!(["Group A", "Group B"]));
        assert_eq!(body["status"], "success");
        assert_eq!(body["users"], json!(["dana", "michelle"]));

        let (_, body) = send(&app, Method::GET, "/api/v1/users", Some("bogus"), None).await;
        assert_eq!(body["userid"], "guest");
        assert_eq!(body["groups"], json!(["Guests"]));
    }

    #[tokio::test]
    async fn task_lifecycle_over_http() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/tasks",
            Some("token_michelle"),
            Some(json!({
                "userid": "michelle",
                "date": "2023-01-01",
                "task_name": "Write report",
                "category": "Work",
                "expected_hours": 1.5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Task created successfully");
        let task_id = body["task_id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/tasks/{}", task_id);
        let (status, body) = send(&app, Method::PUT, &uri, None, Some(json!({ "actual_hours": 2.0 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task updated successfully");
        assert_eq!(body["userid"], "guest");

        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["actual_hours"], 2.0);

        let (status, body) = send(&app, Method::GET, "/api/v1/tasks/unknown", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Task not found");
    }

    #[tokio::test]
    async fn malformed_bodies_are_rejected_with_auth_context() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/tasks")
            .header(header::AUTHORIZATION, "Bearer token_dana")
            .body(Body::from("not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Request must be JSON");
        assert_eq!(body["userid"], "dana");
    }

    #[tokio::test]
    async fn oversized_bodies_are_413_with_auth_context() {
        let mut config = AppConfig::development();
        config.api.max_request_size_bytes = 64;
        let app = app_with(config);

        let long_note = "x".repeat(256);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/tasks",
            Some("token_dana"),
            Some(json!({ "userid": "dana", "note": long_note })),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Request body is too large");
        assert_eq!(body["userid"], "dana");
        assert_eq!(body["groups"], json!(["Group A", "Group B"]));

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/categories",
            None,
            Some(json!({ "categories": [long_note] })),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["userid"], "guest");
    }

    #[tokio::test]
    async fn undecodable_task_ids_are_400_with_auth_context() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/v1/tasks/%FF", Some("token_michelle"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["userid"], "michelle");
        assert_eq!(body["groups"], json!(["Group A"]));

        let (status, body) = send(&app, Method::PUT, "/api/v1/tasks/%FF", None, Some(json!({ "description": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["userid"], "guest");
    }

    #[tokio::test]
    async fn categories_round_trip() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/v1/categories", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"], json!([]));

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/categories",
            None,
            Some(json!({ "categories": ["Work", "Study"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Categories updated successfully.");

        let (_, body) = send(&app, Method::GET, "/api/v1/categories", None, None).await;
        assert_eq!(body["categories"], json!(["Work", "Study"]));
    }
}
