//! Client configuration.
//!
//! Provides the `ClientConfig` struct shared by the CLI and embedding apps to
//! locate the backend, authorize requests, and size the local store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_STORE_CAPACITY: usize = 512;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment override for the API base URL.
pub const ENV_API_BASE_URL: &str = "THREADLINE_API_BASE_URL";
/// Environment override for the auth token.
pub const ENV_AUTH_TOKEN: &str = "THREADLINE_AUTH_TOKEN";

/// Runtime client configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            auth_token: None,
            download_dir: None,
            store_capacity: DEFAULT_STORE_CAPACITY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("download_dir", &self.download_dir)
            .field("store_capacity", &self.store_capacity)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Parse and validate configuration from a JSON payload.
    pub fn parse(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid config JSON: {error}")))?;
        config.validated()
    }

    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let payload = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("failed to read {}: {error}", path.display()))
        })?;
        Self::parse(&payload)
    }

    /// Apply environment-style overrides, then validate again.
    ///
    /// `lookup` is injected so overrides can be tested without touching the
    /// process environment.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = normalize_text_option(lookup(ENV_API_BASE_URL)) {
            self.api_base_url = url;
        }
        if let Some(token) = normalize_text_option(lookup(ENV_AUTH_TOKEN)) {
            self.auth_token = Some(token);
        }
        self.validated()
    }

    /// Normalize fields and reject unusable values.
    pub fn validated(mut self) -> Result<Self> {
        let base_url = normalize_text_option(Some(self.api_base_url))
            .ok_or_else(|| Error::Config("api_base_url is required".to_string()))?;
        if !is_http_url(&base_url) {
            return Err(Error::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
        self.api_base_url = base_url.trim_end_matches('/').to_string();
        self.auth_token = normalize_text_option(self.auth_token);

        if self.store_capacity == 0 {
            return Err(Error::Config(
                "store_capacity must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

const fn default_store_capacity() -> usize {
    DEFAULT_STORE_CAPACITY
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
