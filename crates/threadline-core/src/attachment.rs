//! Interactive anchor for chat attachments.
//!
//! A press downloads the file through the [`DownloadCoordinator`]; a long press
//! opens the report context menu for the message that carries the attachment.

use tokio::task::JoinHandle;

use crate::download::DownloadCoordinator;
use crate::error::Result;
use crate::identity::{extract_resource_id, ResourceId};
use crate::services::FileDownloader;
use crate::util::add_encrypted_auth_token_to_url;

/// Message context the anchor is rendered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextMenuContext {
    pub report_id: String,
    pub report_action_id: Option<String>,
}

/// Opens the per-message context menu.
pub trait ContextMenu {
    fn show_for_report(&self, report_id: &str, report_action_id: Option<&str>);
}

/// What the presentation layer needs to draw the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentView {
    pub source_url: String,
    pub file_name: String,
    pub should_show_download_icon: bool,
    pub should_show_loading_spinner_icon: bool,
}

pub struct AttachmentAnchor<D> {
    coordinator: DownloadCoordinator<D>,
    identity: Option<ResourceId>,
    source_url_with_auth: String,
    display_name: String,
    context: ContextMenuContext,
}

impl<D> std::fmt::Debug for AttachmentAnchor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentAnchor")
            .field("identity", &self.identity)
            .field("display_name", &self.display_name)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<D: FileDownloader + 'static> AttachmentAnchor<D> {
    pub fn new(
        coordinator: DownloadCoordinator<D>,
        source: &str,
        display_name: impl Into<String>,
        auth_token: Option<&str>,
        context: ContextMenuContext,
    ) -> Self {
        Self {
            coordinator,
            identity: extract_resource_id(source),
            source_url_with_auth: add_encrypted_auth_token_to_url(source, auth_token),
            display_name: display_name.into(),
            context,
        }
    }

    pub fn identity(&self) -> Option<&ResourceId> {
        self.identity.as_ref()
    }

    pub fn is_downloading(&self) -> bool {
        self.coordinator.is_downloading(self.identity.as_ref())
    }

    pub fn view(&self) -> AttachmentView {
        AttachmentView {
            source_url: self.source_url_with_auth.clone(),
            file_name: self.display_name.clone(),
            should_show_download_icon: true,
            should_show_loading_spinner_icon: self.is_downloading(),
        }
    }

    /// Start downloading unless this attachment is already downloading.
    pub fn on_press(&self) -> Option<JoinHandle<Result<()>>> {
        if self.is_downloading() {
            tracing::debug!(identity = ?self.identity, "Ignoring press while downloading");
            return None;
        }
        self.coordinator
            .download(&self.source_url_with_auth, &self.display_name)
    }

    /// Open the context menu. Never starts or cancels a transfer.
    pub fn on_long_press(&self, menu: &dyn ContextMenu) {
        menu.show_for_report(
            &self.context.report_id,
            self.context.report_action_id.as_deref(),
        );
    }
}
