use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::PgStore;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Value::Object(body)) = (data, &mut response) {
                body.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Progress and warnings; suppressed in JSON mode so stdout stays parseable
pub fn output_step(output_format: &OutputFormat, message: &str) {
    if let OutputFormat::Text = output_format {
        println!("  {}", message);
    }
}

/// JSON body for a failed command
pub fn error_response(message: &str, error_code: Option<&str>) -> Value {
    let mut response = json!({
        "success": false,
        "error": message
    });

    if let Some(code) = error_code {
        response["error_code"] = json!(code);
    }
    response
}

/// Output an error message in the appropriate format; JSON goes to stdout
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&error_response(message, error_code))?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Ask on stdout and read one line from `input`; only a literal `yes` confirms
pub fn confirm(prompt: &str, input: &mut impl BufRead) -> anyhow::Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

/// PostgreSQL store for an explicit connection URL, using the configured table names
pub fn open_store(database_url: &str) -> anyhow::Result<PgStore> {
    let cfg = config();
    let store = PgStore::new(
        database_url,
        &cfg.store.tasks_table,
        &cfg.store.categories_table,
        2,
        Duration::from_secs(cfg.database.connection_timeout),
    )?;
    Ok(store)
}
