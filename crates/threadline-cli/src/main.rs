//! Threadline CLI - open report threads and fetch attachments from a terminal

mod cli;
mod commands;
mod error;
mod settings;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::settings::{load_client_config, resolve_config_path};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive: tracing_subscriber::filter::Directive = "threadline=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Open {
            report_id,
            timeout_secs,
            json,
        } => {
            let config = load_client_config(&resolve_config_path(cli.config)?)?;
            commands::open::run(&config, &report_id, timeout_secs, json).await?;
        }
        Commands::Comment {
            report_id,
            text,
            timeout_secs,
        } => {
            let config = load_client_config(&resolve_config_path(cli.config)?)?;
            commands::comment::run(&config, &report_id, &text, timeout_secs).await?;
        }
        Commands::Download { url, name, dir } => {
            let config = load_client_config(&resolve_config_path(cli.config)?)?;
            commands::download::run(&config, &url, name, dir).await?;
        }
        Commands::Config { command } => {
            commands::config::run(&command, &resolve_config_path(cli.config)?)?;
        }
        Commands::Completions { shell, output } => {
            commands::completions::run(shell, output.as_deref())?;
        }
    }

    Ok(())
}
