//! Client config resolution for the CLI.

use std::env;
use std::path::{Path, PathBuf};

use threadline_core::config::ClientConfig;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_PATH_ENV: &str = "THREADLINE_CONFIG";

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("threadline").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

/// `--config` wins, then `THREADLINE_CONFIG`, then the platform config dir.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_path {
        return Ok(path);
    }
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    default_config_path()
}

/// Load the config file (if present) and apply environment overrides.
pub fn load_client_config(path: &Path) -> Result<ClientConfig, CliError> {
    load_client_config_with(path, |key| env::var(key).ok())
}

pub fn load_client_config_with<F>(path: &Path, lookup: F) -> Result<ClientConfig, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = if path.exists() {
        ClientConfig::load(path)?
    } else {
        tracing::debug!("No config file at {}; using defaults", path.display());
        ClientConfig::default()
    };
    config.with_overrides(lookup).map_err(|error| {
        CliError::Config(format!(
            "{error}. Create {} or set THREADLINE_API_BASE_URL",
            path.display()
        ))
    })
}

/// Download directory: explicit flag, config value, the user's download dir,
/// then the working directory.
pub fn resolve_download_dir(cli_dir: Option<PathBuf>, config: &ClientConfig) -> PathBuf {
    cli_dir
        .or_else(|| config.download_dir.clone())
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
