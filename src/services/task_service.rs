use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::auth::{AuthContext, AuthDirectory};
use crate::database::TaskStore;
use crate::error::ApiError;
use crate::services::parse_object_body;
use crate::task::document::{stamp_new, stamp_update, strip_server_fields};
use crate::task::{check_extension_fields, validate, TaskDocument, ValidationMode};

/// Create, modify, fetch and list task records on behalf of a caller
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    directory: Arc<AuthDirectory>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, directory: Arc<AuthDirectory>) -> Self {
        Self { store, directory }
    }

    /// Validate and persist a new task; returns its freshly assigned `task_id`
    pub async fn create(&self, auth: &AuthContext, body: &[u8]) -> Result<String, ApiError> {
        let mut document = parse_object_body(body)?;
        strip_server_fields(&mut document);

        let errors = validate(&document, ValidationMode::Create);
        if !errors.is_empty() {
            return Err(ApiError::validation_error("Validation failed", Some(errors)));
        }

        let task_id = stamp_new(&mut document, Utc::now());
        check_extension_fields(&document)?;

        self.store
            .insert(document)
            .await
            .map_err(|e| ApiError::persistence("Failed to create task", e))?;

        info!("Task {} created by {}", task_id, auth.userid);
        Ok(task_id)
    }

    /// Merge the supplied fields into the task identified by `task_id`.
    /// A `task_id` in the body is ignored; the path decides which record changes.
    pub async fn modify(&self, auth: &AuthContext, task_id: &str, body: &[u8]) -> Result<(), ApiError> {
        let mut fields = parse_object_body(body)?;
        strip_server_fields(&mut fields);

        let errors = validate(&fields, ValidationMode::Modify);
        if !errors.is_empty() {
            return Err(ApiError::validation_error("Validation failed", Some(errors)));
        }

        stamp_update(&mut fields, Utc::now());
        check_extension_fields(&fields)?;

        let matched = self
            .store
            .update_fields(task_id, fields)
            .await
            .map_err(|e| ApiError::persistence("Failed to update task", e))?;

        if matched == 0 {
            return Err(ApiError::not_found(format!(
                "Task with task_id '{}' not found.",
                task_id
            )));
        }

        info!("Task {} updated by {}", task_id, auth.userid);
        Ok(())
    }

    /// Fetch a single task. Not filtered by the caller's visibility.
    pub async fn get(&self, task_id: &str) -> Result<TaskDocument, ApiError> {
        self.store
            .find_one(task_id)
            .await
            .map_err(|e| ApiError::persistence("Failed to retrieve task", e))?
            .ok_or_else(|| ApiError::not_found("Task not found"))
    }

    /// Every task owned by a member of one of the caller's groups, or by the caller
    pub async fn list(&self, auth: &AuthContext) -> Result<Vec<TaskDocument>, ApiError> {
        let owners = auth.visible_owners(&self.directory);
        self.store
            .find_many(Some(&owners))
            .await
            .map_err(|e| ApiError::persistence("Failed to retrieve tasks", e))
    }
}
