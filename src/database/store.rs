use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::task::TaskDocument;

/// Errors surfaced by the persistence collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Operation(String),

    #[error("Stored document is malformed: {0}")]
    Serialization(String),
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => StoreError::Connection(msg),
            DatabaseError::InvalidIdentifier(name) => {
                StoreError::Config(format!("invalid table name '{}'", name))
            }
            DatabaseError::Sqlx(e) => StoreError::Operation(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Operation(err.to_string())
    }
}

/// The singleton categories document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesDocument {
    pub categories: Vec<String>,
}

/// Result of replacing the categories singleton
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

/// Task resource
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new record, returning the generated storage id
    async fn insert(&self, record: TaskDocument) -> Result<String, StoreError>;

    /// Merge `fields` into the record with `task_id`; returns the matched count
    async fn update_fields(&self, task_id: &str, fields: TaskDocument) -> Result<u64, StoreError>;

    async fn find_one(&self, task_id: &str) -> Result<Option<TaskDocument>, StoreError>;

    /// Records whose `userid` is in `owners`, or every record when `None`
    async fn find_many(&self, owners: Option<&BTreeSet<String>>) -> Result<Vec<TaskDocument>, StoreError>;

    /// Establish (or reuse) the connection and verify the store answers
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Categories resource
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn find_singleton(&self) -> Result<Option<CategoriesDocument>, StoreError>;

    /// Replace the singleton, inserting it when absent
    async fn replace_singleton(&self, document: CategoriesDocument) -> Result<ReplaceOutcome, StoreError>;
}

/// Logical resources managed by the administration tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Categories,
    Tasks,
}

impl Resource {
    pub const ALL: [Resource; 2] = [Resource::Categories, Resource::Tasks];

    /// Key used for the resource in backup files
    pub fn backup_key(self) -> &'static str {
        match self {
            Resource::Categories => "categories",
            Resource::Tasks => "daily_tasks",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backup_key())
    }
}

/// Bulk management surface used by backup and restore. Not reachable from the HTTP API.
#[async_trait]
pub trait StoreMaintenance: Send + Sync {
    /// Every document of a resource, with its storage id as a string `_id`
    async fn export(&self, resource: Resource) -> Result<Vec<TaskDocument>, StoreError>;

    /// Delete every document of a resource; returns the deleted count
    async fn clear(&self, resource: Resource) -> Result<u64, StoreError>;

    /// Insert documents as-is; any incoming `_id` is discarded
    async fn import(&self, resource: Resource, documents: Vec<TaskDocument>) -> Result<u64, StoreError>;
}
