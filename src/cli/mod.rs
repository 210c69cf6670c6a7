pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tmtrack")]
#[command(about = "tmtrack administration - backup, restore and credential maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Dump categories and daily_tasks to a JSON file")]
    Backup {
        #[arg(help = "PostgreSQL connection URL (e.g. postgres://localhost:5432/tmtrack_db)")]
        database_url: String,

        #[arg(default_value = "tmtrack_backup.json", help = "Output backup file")]
        output_file: PathBuf,
    },

    #[command(about = "Destructively restore categories and daily_tasks from a backup file")]
    Restore {
        #[arg(help = "PostgreSQL connection URL to restore into")]
        database_url: String,

        #[arg(default_value = "tmtrack_backup.json", help = "Input backup file")]
        input_file: PathBuf,

        #[arg(long, help = "Skip the interactive confirmation")]
        yes: bool,
    },

    #[command(about = "Credential file maintenance")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Backup {
            database_url,
            output_file,
        } => commands::backup::handle(&database_url, &output_file, output_format).await,
        Commands::Restore {
            database_url,
            input_file,
            yes,
        } => commands::restore::handle(&database_url, &input_file, yes, output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, output_format),
    }
}
