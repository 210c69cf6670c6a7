use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;
use crate::database::store::{
    CategoriesDocument, CategoryStore, ReplaceOutcome, Resource, StoreError, StoreMaintenance, TaskStore,
};
use crate::task::{schema::TASK_ID, TaskDocument, STORAGE_ID};

/// PostgreSQL-backed document store.
///
/// Each resource is a table of JSONB documents keyed by a generated `id`:
/// `(id BIGSERIAL PRIMARY KEY, document JSONB NOT NULL)`.
pub struct PgStore {
    db: DatabaseManager,
    tasks_table: String,
    categories_table: String,
}

impl PgStore {
    pub fn new(
        url: &str,
        tasks_table: &str,
        categories_table: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let tasks_table = DatabaseManager::quote_identifier(tasks_table)?;
        let categories_table = DatabaseManager::quote_identifier(categories_table)?;

        let bootstrap = [&tasks_table, &categories_table]
            .iter()
            .map(|table| {
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, document JSONB NOT NULL)",
                    table
                )
            })
            .collect();

        let db = DatabaseManager::new(url, max_connections, connect_timeout).with_bootstrap(bootstrap);

        Ok(Self {
            db,
            tasks_table,
            categories_table,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        Self::new(
            &config.database.url,
            &config.store.tasks_table,
            &config.store.categories_table,
            config.database.max_connections,
            Duration::from_secs(config.database.connection_timeout),
        )
    }

    async fn pool(&self) -> Result<&PgPool, StoreError> {
        Ok(self.db.pool().await?)
    }

    fn table(&self, resource: Resource) -> &str {
        match resource {
            Resource::Categories => &self.categories_table,
            Resource::Tasks => &self.tasks_table,
        }
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Turn an `(id, document)` row into a document exposing `_id` as a string
fn row_to_document(row: &PgRow) -> Result<TaskDocument, StoreError> {
    let id: i64 = row.try_get("id")?;
    let Json(document): Json<Value> = row.try_get("document")?;
    match document {
        Value::Object(mut map) => {
            map.insert(STORAGE_ID.to_string(), Value::String(id.to_string()));
            Ok(map)
        }
        other => Err(StoreError::Serialization(format!(
            "row {} holds a non-object document: {}",
            id, other
        ))),
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert(&self, record: TaskDocument) -> Result<String, StoreError> {
        let pool = self.pool().await?;
        let sql = format!("INSERT INTO {} (document) VALUES ($1) RETURNING id", self.tasks_table);

        let id: i64 = sqlx::query_scalar(&sql)
            .bind(Json(Value::Object(record)))
            .fetch_one(pool)
            .await
            .map_err(|e| {
                error!("Task insert failed: {}", e);
                StoreError::from(e)
            })?;

        Ok(id.to_string())
    }

    async fn update_fields(&self, task_id: &str, fields: TaskDocument) -> Result<u64, StoreError> {
        let pool = self.pool().await?;
        let sql = format!(
            "UPDATE {} SET document = document || $2 WHERE document->>'{}' = $1",
            self.tasks_table, TASK_ID
        );

        let result = sqlx::query(&sql)
            .bind(task_id)
            .bind(Json(Value::Object(fields)))
            .execute(pool)
            .await
            .map_err(|e| {
                error!("Task update failed for {}: {}", task_id, e);
                StoreError::from(e)
            })?;

        Ok(result.rows_affected())
    }

    async fn find_one(&self, task_id: &str) -> Result<Option<TaskDocument>, StoreError> {
        let pool = self.pool().await?;
        let sql = format!(
            "SELECT id, document FROM {} WHERE document->>'{}' = $1 ORDER BY id LIMIT 1",
            self.tasks_table, TASK_ID
        );

        let row = sqlx::query(&sql).bind(task_id).fetch_optional(pool).await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn find_many(&self, owners: Option<&BTreeSet<String>>) -> Result<Vec<TaskDocument>, StoreError> {
        let pool = self.pool().await?;

        let rows = match owners {
            Some(owners) => {
                let sql = format!(
                    "SELECT id, document FROM {} WHERE document->>'userid' = ANY($1) ORDER BY id",
                    self.tasks_table
                );
                let owners: Vec<String> = owners.iter().cloned().collect();
                sqlx::query(&sql).bind(owners).fetch_all(pool).await?
            }
            None => {
                let sql = format!("SELECT id, document FROM {} ORDER BY id", self.tasks_table);
                sqlx::query(&sql).fetch_all(pool).await?
            }
        };

        debug!("Fetched {} task rows", rows.len());
        rows.iter().map(row_to_document).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(self.db.health_check().await?)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn find_singleton(&self) -> Result<Option<CategoriesDocument>, StoreError> {
        let pool = self.pool().await?;
        let sql = format!("SELECT document FROM {} ORDER BY id LIMIT 1", self.categories_table);

        let document: Option<Json<Value>> = sqlx::query_scalar(&sql).fetch_optional(pool).await?;
        document
            .map(|Json(value)| {
                serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }

    async fn replace_singleton(&self, document: CategoriesDocument) -> Result<ReplaceOutcome, StoreError> {
        let pool = self.pool().await?;
        let replacement =
            serde_json::to_value(&document).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut tx = pool.begin().await?;

        // Serialize concurrent replacements so the table never holds two singletons
        sqlx::query(&format!(
            "LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE",
            self.categories_table
        ))
        .execute(&mut *tx)
        .await?;

        let existing = sqlx::query(&format!(
            "SELECT id, document FROM {} ORDER BY id LIMIT 1",
            self.categories_table
        ))
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match existing {
            Some(row) => {
                let id: i64 = row.try_get("id")?;
                let Json(current): Json<Value> = row.try_get("document")?;
                let modified = current != replacement;
                if modified {
                    sqlx::query(&format!(
                        "UPDATE {} SET document = $1 WHERE id = $2",
                        self.categories_table
                    ))
                    .bind(Json(replacement.clone()))
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                }
                ReplaceOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_id: None,
                }
            }
            None => {
                let id: i64 = sqlx::query_scalar(&format!(
                    "INSERT INTO {} (document) VALUES ($1) RETURNING id",
                    self.categories_table
                ))
                .bind(Json(replacement.clone()))
                .fetch_one(&mut *tx)
                .await?;
                ReplaceOutcome {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: Some(id.to_string()),
                }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

#[async_trait]
impl StoreMaintenance for PgStore {
    async fn export(&self, resource: Resource) -> Result<Vec<TaskDocument>, StoreError> {
        let pool = self.pool().await?;
        let sql = format!("SELECT id, document FROM {} ORDER BY id", self.table(resource));
        let rows = sqlx::query(&sql).fetch_all(pool).await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn clear(&self, resource: Resource) -> Result<u64, StoreError> {
        let pool = self.pool().await?;
        let sql = format!("DELETE FROM {}", self.table(resource));
        let result = sqlx::query(&sql).execute(pool).await?;
        Ok(result.rows_affected())
    }

    async fn import(&self, resource: Resource, documents: Vec<TaskDocument>) -> Result<u64, StoreError> {
        let pool = self.pool().await?;
        let sql = format!("INSERT INTO {} (document) VALUES ($1)", self.table(resource));

        let mut tx = pool.begin().await?;
        let mut inserted = 0;
        for mut document in documents {
            document.remove(STORAGE_ID);
            sqlx::query(&sql)
                .bind(Json(Value::Object(document)))
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }
        tx.commit().await?;

        Ok(inserted)
    }
}
