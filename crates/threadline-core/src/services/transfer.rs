//! HTTP file downloads into a local directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use super::FileDownloader;
use crate::error::{Error, Result};
use crate::util::compact_text;

const FALLBACK_FILE_NAME: &str = "attachment";

/// Saves downloaded files into `download_dir`, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct HttpFileDownloader {
    download_dir: PathBuf,
    client: reqwest::Client,
}

impl HttpFileDownloader {
    pub fn new(download_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            download_dir: download_dir.into(),
            client,
        })
    }

    /// Directory downloaded files are written to.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    async fn fetch_to_disk(&self, url: &str, display_name: &str) -> Result<PathBuf> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Download failed with HTTP {status}: {}",
                compact_text(&body)
            )));
        }

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = unique_path(&self.download_dir, &sanitize_file_name(display_name));
        let mut file = tokio::fs::File::create(&path).await?;

        let written = async {
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<(), Error>(())
        }
        .await;

        if let Err(error) = written {
            drop(file);
            if let Err(remove_error) = tokio::fs::remove_file(&path).await {
                tracing::warn!(
                    "Failed to remove partial download {}: {remove_error}",
                    path.display()
                );
            }
            return Err(error);
        }
        Ok(path)
    }
}

impl FileDownloader for HttpFileDownloader {
    async fn download(&self, url: &str, display_name: &str) -> Result<()> {
        let path = self.fetch_to_disk(url, display_name).await?;
        tracing::info!("Saved {display_name} to {}", path.display());
        Ok(())
    }
}

/// Reduce a display name to a safe single path component.
pub(crate) fn sanitize_file_name(display_name: &str) -> String {
    let cleaned: String = display_name
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// First of `name`, `stem (1).ext`, `stem (2).ext`, … that does not exist yet.
pub(crate) fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (name, None),
    };
    (1..)
        .map(|index| match extension {
            Some(extension) => dir.join(format!("{stem} ({index}).{extension}")),
            None => dir.join(format!("{stem} ({index})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
