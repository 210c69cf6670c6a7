use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::cli::utils::{output_step, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Append a suffix to every auth_token in the credential file")]
    Append {
        #[arg(help = "String appended to each token")]
        suffix: String,

        #[arg(long, default_value = "user_authentication.json", help = "Credential file to rewrite")]
        file: PathBuf,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Append { suffix, file } => {
            let skipped = append_suffix(&file, &suffix)?;
            for userid in &skipped {
                output_step(
                    &output_format,
                    &format!("Warning: 'auth_token' not found or not a string for user {}.", userid),
                );
            }

            output_success(
                &output_format,
                &format!("Successfully updated auth_token in {}.", file.display()),
                Some(json!({ "file": file.display().to_string(), "skipped": skipped })),
            )
        }
    }
}

/// Rewrite the credential file with `suffix` appended to each string token.
/// Returns the userids of entries that were left untouched.
pub fn append_suffix(path: &Path, suffix: &str) -> anyhow::Result<Vec<String>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("{} not found", path.display()))?;
    let mut data: Value = serde_json::from_str(&contents)
        .with_context(|| format!("could not decode JSON from {}", path.display()))?;

    let entries = data
        .as_array_mut()
        .ok_or_else(|| anyhow!("{} is not a list of users", path.display()))?;

    let mut skipped = Vec::new();
    for entry in entries.iter_mut() {
        match entry.get_mut("auth_token") {
            Some(Value::String(token)) => token.push_str(suffix),
            _ => skipped.push(
                entry
                    .get("userid")
                    .and_then(Value::as_str)
                    .unwrap_or("(unknown)")
                    .to_string(),
            ),
        }
    }

    std::fs::write(path, serde_json::to_string_pretty(&data)?)
        .with_context(|| format!("could not write {}", path.display()))?;
    Ok(skipped)
}
