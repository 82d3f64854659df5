//! Per-attachment download coordination.
//!
//! Each attachment identity owns one `download_<id>` record in the store. A
//! transfer starts only when that record is idle, and the record returns to idle
//! exactly once after the transfer resolves, whether it succeeded or not. Any
//! number of views may observe the flag.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::identity::{extract_resource_id, ResourceId};
use crate::services::FileDownloader;
use crate::store::keys::collection;
use crate::store::{Store, StoreKey};

/// Stored progress record for one attachment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadState {
    pub is_downloading: bool,
}

fn download_key(identity: &ResourceId) -> StoreKey {
    StoreKey::member(collection::DOWNLOAD, identity.as_str())
}

/// Start-if-idle / settle pair around a [`FileDownloader`].
pub struct DownloadCoordinator<D> {
    store: Store,
    downloader: Arc<D>,
}

impl<D> Clone for DownloadCoordinator<D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            downloader: Arc::clone(&self.downloader),
        }
    }
}

impl<D> std::fmt::Debug for DownloadCoordinator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadCoordinator")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<D: FileDownloader + 'static> DownloadCoordinator<D> {
    pub fn new(store: Store, downloader: Arc<D>) -> Self {
        Self { store, downloader }
    }

    /// The store holding the progress flags.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Whether a transfer for `identity` is in flight. Unkeyed resources never are.
    pub fn is_downloading(&self, identity: Option<&ResourceId>) -> bool {
        let Some(identity) = identity else {
            return false;
        };
        match self.store.get::<DownloadState>(&download_key(identity)) {
            Ok(state) => state.unwrap_or_default().is_downloading,
            Err(error) => {
                tracing::warn!(%identity, "Unreadable download state: {error}");
                false
            }
        }
    }

    /// Claim the flag for `identity`. Returns `false` when a transfer is already
    /// running. An unkeyed resource is always allowed and touches no flag.
    pub fn start_if_idle(&self, identity: Option<&ResourceId>) -> bool {
        let Some(identity) = identity else {
            return true;
        };
        self.store.try_update(&download_key(identity), |current| {
            if is_active(current) {
                None
            } else {
                serde_json::to_value(DownloadState {
                    is_downloading: true,
                })
                .ok()
            }
        })
    }

    /// Return the flag for `identity` to idle.
    pub fn on_settled(&self, identity: Option<&ResourceId>) {
        let Some(identity) = identity else {
            return;
        };
        if let Err(error) = self.store.merge(
            &download_key(identity),
            DownloadState {
                is_downloading: false,
            },
        ) {
            tracing::warn!(%identity, "Failed to reset download state: {error}");
        }
    }

    /// Start a transfer of `source_url` unless one for the same attachment is
    /// already running. Returns the task handle when a transfer was spawned; it
    /// resolves to the transfer outcome after the flag has been reset.
    pub fn download(
        &self,
        source_url: &str,
        display_name: &str,
    ) -> Option<JoinHandle<Result<()>>> {
        let identity = extract_resource_id(source_url);
        if !self.start_if_idle(identity.as_ref()) {
            tracing::debug!(
                identity = identity.as_ref().map(ResourceId::as_str),
                "Download already in progress; ignoring press"
            );
            return None;
        }

        let guard = SettleGuard {
            coordinator: self.clone(),
            identity,
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available; download not started");
            return None;
        };

        let downloader = Arc::clone(&self.downloader);
        let url = source_url.to_string();
        let name = display_name.to_string();
        tracing::info!(url = %url, name = %name, "Starting download");
        Some(runtime.spawn(async move {
            let guard = guard;
            let result = downloader.download(&url, &name).await;
            match &result {
                Ok(()) => tracing::info!(name = %name, "Download finished"),
                Err(error) => tracing::warn!(name = %name, "Download failed: {error}"),
            }
            drop(guard);
            result
        }))
    }
}

fn is_active(current: Option<&Value>) -> bool {
    current
        .and_then(|value| value.get("isDownloading"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Settles the flag when dropped, so a panicking or aborted transfer still
/// releases it.
struct SettleGuard<D: FileDownloader + 'static> {
    coordinator: DownloadCoordinator<D>,
    identity: Option<ResourceId>,
}

impl<D: FileDownloader + 'static> Drop for SettleGuard<D> {
    fn drop(&mut self) {
        self.coordinator.on_settled(self.identity.as_ref());
    }
}
