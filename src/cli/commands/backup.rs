use anyhow::Context;
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::cli::utils::{open_store, output_step, output_success};
use crate::cli::OutputFormat;
use crate::database::manager::redact_url;
use crate::database::{Resource, StoreMaintenance, TaskStore};

pub async fn handle(database_url: &str, output_file: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    output_step(
        &output_format,
        &format!("Starting backup from {}", redact_url(database_url)),
    );

    let store = open_store(database_url)?;
    store.ping().await.context("backup aborted")?;

    let snapshot = collect(&store, &output_format).await;
    store.close().await;

    let counts: Map<String, Value> = snapshot
        .iter()
        .map(|(key, docs)| (key.clone(), json!(docs.as_array().map(Vec::len).unwrap_or(0))))
        .collect();

    write_backup(output_file, &snapshot)?;

    output_success(
        &output_format,
        &format!("Wrote backup to '{}'", output_file.display()),
        Some(json!({ "file": output_file.display().to_string(), "documents": counts })),
    )
}

/// Export every resource into one object keyed by resource name. A resource
/// that fails to export is reported and left out.
pub async fn collect<S>(store: &S, output_format: &OutputFormat) -> Map<String, Value>
where
    S: StoreMaintenance + ?Sized,
{
    let mut snapshot = Map::new();

    for resource in Resource::ALL {
        output_step(output_format, &format!("- Backing up '{}'...", resource));
        match store.export(resource).await {
            Ok(documents) => {
                output_step(output_format, &format!("  > Found {} documents.", documents.len()));
                let documents = documents.into_iter().map(Value::Object).collect();
                snapshot.insert(resource.backup_key().to_string(), Value::Array(documents));
            }
            Err(e) => {
                tracing::error!("Could not export '{}': {}", resource, e);
                output_step(
                    output_format,
                    &format!("  > ERROR: Could not export '{}'. Skipping. Reason: {}", resource, e),
                );
            }
        }
    }

    snapshot
}

fn write_backup(path: &Path, snapshot: &Map<String, Value>) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, contents).with_context(|| format!("could not write backup file '{}'", path.display()))
}
