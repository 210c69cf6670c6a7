use clap::Parser;
use tmtrack_api::cli::utils::output_error;
use tmtrack_api::cli::{Cli, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = tmtrack_api::cli::run(cli).await {
        let verbose = matches!(std::env::var("CLI_VERBOSE").as_deref(), Ok("true") | Ok("1"));
        let message = if verbose { format!("{e:?}") } else { format!("{e:#}") };
        output_error(&output_format, &message, None)?;
        std::process::exit(1);
    }

    Ok(())
}
