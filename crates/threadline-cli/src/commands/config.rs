use std::path::Path;

use threadline_core::config::ClientConfig;

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::settings::load_client_config;

const REDACTED: &str = "[REDACTED]";

pub fn run(command: &ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = load_client_config(config_path)?;
            println!("{}", render_redacted(&config)?);
        }
        ConfigCommands::Path => println!("{}", config_path.display()),
    }
    Ok(())
}

/// Pretty JSON of `config` with the auth token masked.
pub fn render_redacted(config: &ClientConfig) -> Result<String, CliError> {
    let mut shown = config.clone();
    if shown.auth_token.is_some() {
        shown.auth_token = Some(REDACTED.to_string());
    }
    Ok(serde_json::to_string_pretty(&shown)?)
}
