use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::auth::AuthContext;
use crate::database::{CategoriesDocument, CategoryStore, ReplaceOutcome};
use crate::error::ApiError;
use crate::services::parse_object_body;

const CATEGORIES_KEY: &str = "categories";

/// Read and replace the singleton category list
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self { store }
    }

    /// Current list, empty when nothing has been stored yet
    pub async fn get(&self) -> Result<Vec<String>, ApiError> {
        let document = self
            .store
            .find_singleton()
            .await
            .map_err(|e| ApiError::persistence("Failed to retrieve categories", e))?;
        Ok(document.unwrap_or_default().categories)
    }

    /// Replace the whole list with the body's `categories` array
    pub async fn replace(&self, auth: &AuthContext, body: &[u8]) -> Result<ReplaceOutcome, ApiError> {
        let document = parse_categories(body)?;
        let count = document.categories.len();

        let outcome = self
            .store
            .replace_singleton(document)
            .await
            .map_err(|e| ApiError::persistence("Failed to update categories", e))?;

        info!("Categories replaced by {} ({} entries)", auth.userid, count);
        Ok(outcome)
    }
}

fn parse_categories(body: &[u8]) -> Result<CategoriesDocument, ApiError> {
    let mut object = parse_object_body(body)?;

    let value = object
        .remove(CATEGORIES_KEY)
        .ok_or_else(|| ApiError::validation_error("Request body must contain a 'categories' key.", None))?;
    if !object.is_empty() {
        return Err(ApiError::validation_error(
            "Request body must contain only the 'categories' key.",
            None,
        ));
    }

    let Value::Array(items) = value else {
        return Err(ApiError::validation_error("The 'categories' value must be a list.", None));
    };

    let categories = items
        .into_iter()
        .map(|item| match item {
            Value::String(name) => Ok(name),
            _ => Err(ApiError::validation_error(
                "All items in the 'categories' list must be strings.",
                None,
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CategoriesDocument { categories })
}
