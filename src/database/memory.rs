use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::database::store::{
    CategoriesDocument, CategoryStore, ReplaceOutcome, Resource, StoreError, StoreMaintenance, TaskStore,
};
use crate::task::{schema::TASK_ID, TaskDocument, STORAGE_ID};

#[derive(Debug, Clone)]
struct StoredDocument {
    id: u64,
    document: TaskDocument,
}

impl StoredDocument {
    fn exported(&self) -> TaskDocument {
        let mut document = self.document.clone();
        document.insert(STORAGE_ID.to_string(), Value::String(self.id.to_string()));
        document
    }
}

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    resources: HashMap<Resource, Vec<StoredDocument>>,
}

impl Tables {
    fn push(&mut self, resource: Resource, mut document: TaskDocument) -> u64 {
        document.remove(STORAGE_ID);
        self.next_id += 1;
        let id = self.next_id;
        self.resources
            .entry(resource)
            .or_default()
            .push(StoredDocument { id, document });
        id
    }

    fn rows(&self, resource: Resource) -> &[StoredDocument] {
        self.resources.get(&resource).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// In-process store for local runs and tests. Same semantics as the
/// PostgreSQL store, without durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn task_id_of(document: &TaskDocument) -> Option<&str> {
    document.get(TASK_ID).and_then(Value::as_str)
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, record: TaskDocument) -> Result<String, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.push(Resource::Tasks, record).to_string())
    }

    async fn update_fields(&self, task_id: &str, fields: TaskDocument) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.resources.entry(Resource::Tasks).or_default();

        match rows.iter_mut().find(|row| task_id_of(&row.document) == Some(task_id)) {
            Some(row) => {
                row.document.extend(fields);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_one(&self, task_id: &str) -> Result<Option<TaskDocument>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rows(Resource::Tasks)
            .iter()
            .find(|row| task_id_of(&row.document) == Some(task_id))
            .map(StoredDocument::exported))
    }

    async fn find_many(&self, owners: Option<&BTreeSet<String>>) -> Result<Vec<TaskDocument>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rows(Resource::Tasks)
            .iter()
            .filter(|row| match owners {
                Some(owners) => row
                    .document
                    .get("userid")
                    .and_then(Value::as_str)
                    .map(|userid| owners.contains(userid))
                    .unwrap_or(false),
                None => true,
            })
            .map(StoredDocument::exported)
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn find_singleton(&self) -> Result<Option<CategoriesDocument>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .rows(Resource::Categories)
            .first()
            .map(|row| {
                serde_json::from_value(Value::Object(row.document.clone()))
                    .map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }

    async fn replace_singleton(&self, document: CategoriesDocument) -> Result<ReplaceOutcome, StoreError> {
        let replacement = match serde_json::to_value(&document) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(StoreError::Serialization("categories must be an object".into())),
            Err(e) => return Err(StoreError::Serialization(e.to_string())),
        };

        let mut tables = self.tables.write().await;
        let rows = tables.resources.entry(Resource::Categories).or_default();

        if let Some(row) = rows.first_mut() {
            let modified = row.document != replacement;
            row.document = replacement;
            return Ok(ReplaceOutcome {
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
            });
        }

        let id = tables.push(Resource::Categories, replacement);
        Ok(ReplaceOutcome {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id.to_string()),
        })
    }
}

#[async_trait]
impl StoreMaintenance for MemoryStore {
    async fn export(&self, resource: Resource) -> Result<Vec<TaskDocument>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.rows(resource).iter().map(StoredDocument::exported).collect())
    }

    async fn clear(&self, resource: Resource) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let removed = tables.resources.remove(&resource).map(|rows| rows.len()).unwrap_or(0);
        Ok(removed as u64)
    }

    async fn import(&self, resource: Resource, documents: Vec<TaskDocument>) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0;
        for document in documents {
            tables.push(resource, document);
            inserted += 1;
        }
        Ok(inserted)
    }
}
