use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use threadline_core::attachment::{AttachmentAnchor, ContextMenuContext};
use threadline_core::config::ClientConfig;
use threadline_core::download::DownloadCoordinator;
use threadline_core::services::HttpFileDownloader;
use threadline_core::Store;

use super::common::{file_name_from_url, normalize_attachment_url};
use crate::error::CliError;
use crate::settings::resolve_download_dir;

pub async fn run(
    config: &ClientConfig,
    url: &str,
    name: Option<String>,
    dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let url = normalize_attachment_url(url)?;
    let display_name = name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| file_name_from_url(&url), str::to_string);
    let download_dir = resolve_download_dir(dir, config);

    let downloader = HttpFileDownloader::new(
        &download_dir,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let coordinator = DownloadCoordinator::new(
        Store::new(config.store_capacity),
        Arc::new(downloader),
    );
    let anchor = AttachmentAnchor::new(
        coordinator,
        &url,
        display_name.clone(),
        config.auth_token.as_deref(),
        ContextMenuContext::default(),
    );
    tracing::debug!(identity = ?anchor.identity(), "Starting attachment download");

    let handle = anchor.on_press().ok_or(CliError::DownloadInProgress)?;
    handle.await??;

    println!("Saved {display_name} to {}", download_dir.display());
    Ok(())
}
