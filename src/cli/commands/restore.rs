use anyhow::{anyhow, Context};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::cli::utils::{confirm, open_store, output_step, output_success};
use crate::cli::OutputFormat;
use crate::database::{Resource, StoreMaintenance, TaskStore};
use crate::task::TaskDocument;

pub async fn handle(
    database_url: &str,
    input_file: &Path,
    yes: bool,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    if !yes {
        let names: Vec<_> = Resource::ALL.iter().map(|r| r.backup_key()).collect();
        let prompt = format!(
            "This will destructively restore into the configured database.\n\
             All data in the '{}' resources will be DELETED.\n\
             Are you sure you want to continue? (yes/no): ",
            names.join(", ")
        );
        if !confirm(&prompt, &mut std::io::stdin().lock())? {
            return output_success(&output_format, "Restore operation cancelled by user.", None);
        }
    }

    // Read and parse the file before touching the store
    let backup = read_backup(input_file)?;
    output_step(&output_format, "Successfully read backup file.");

    let store = open_store(database_url)?;
    store.ping().await.context("restore aborted")?;

    let restored = apply(&store, &backup, &output_format).await;
    store.close().await;

    output_success(
        &output_format,
        "Database restore process completed.",
        Some(json!({ "restored": restored })),
    )
}

pub fn read_backup(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("could not read backup file '{}'", path.display()))?;
    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(anyhow!("backup file '{}' is not a JSON object", path.display())),
        Err(e) => Err(anyhow!("could not parse backup file '{}': {}", path.display(), e)),
    }
}

/// Clear and reload every resource present in `backup`. Returns the inserted
/// count per resource; missing or failing resources are reported and skipped.
pub async fn apply<S>(store: &S, backup: &Map<String, Value>, output_format: &OutputFormat) -> Map<String, Value>
where
    S: StoreMaintenance + ?Sized,
{
    let mut restored = Map::new();

    for resource in Resource::ALL {
        let Some(entry) = backup.get(resource.backup_key()) else {
            output_step(
                output_format,
                &format!("- WARNING: '{}' not found in backup file. Skipping.", resource),
            );
            continue;
        };

        output_step(output_format, &format!("- Processing '{}'...", resource));
        match restore_resource(store, resource, entry, output_format).await {
            Ok(inserted) => {
                restored.insert(resource.backup_key().to_string(), json!(inserted));
            }
            Err(e) => {
                tracing::error!("Restore of '{}' failed: {}", resource, e);
                output_step(
                    output_format,
                    &format!("  > ERROR: Restore of '{}' failed. Skipping. Reason: {}", resource, e),
                );
            }
        }
    }

    restored
}

async fn restore_resource<S>(
    store: &S,
    resource: Resource,
    entry: &Value,
    output_format: &OutputFormat,
) -> anyhow::Result<u64>
where
    S: StoreMaintenance + ?Sized,
{
    let documents = documents_of(entry)?;

    let cleared = store.clear(resource).await?;
    output_step(output_format, &format!("  > {} documents cleared.", cleared));

    if documents.is_empty() {
        output_step(output_format, "  > No documents to insert.");
        return Ok(0);
    }

    let inserted = store.import(resource, documents).await?;
    output_step(output_format, &format!("  > Inserted {} documents.", inserted));
    Ok(inserted)
}

fn documents_of(entry: &Value) -> anyhow::Result<Vec<TaskDocument>> {
    let items = entry.as_array().ok_or_else(|| anyhow!("expected a list of documents"))?;
    items
        .iter()
        .map(|item| {
            item.as_object()
                .cloned()
                .ok_or_else(|| anyhow!("every document must be a JSON object"))
        })
        .collect()
}
