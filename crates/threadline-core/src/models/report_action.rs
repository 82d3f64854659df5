//! Report action (message history) model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::report::{Errors, PendingAction};

/// IOU `originalMessage.type` for a newly requested amount.
pub const IOU_TYPE_CREATE: &str = "create";
/// IOU `originalMessage.type` for a settlement.
pub const IOU_TYPE_PAY: &str = "pay";

/// Kind of report action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionName {
    #[default]
    #[serde(rename = "ADDCOMMENT")]
    AddComment,
    #[serde(rename = "CREATED")]
    Created,
    #[serde(rename = "IOU")]
    Iou,
    #[serde(rename = "CLOSED")]
    Closed,
    #[serde(other)]
    Other,
}

/// Action-specific payload. Only the IOU fields the screen inspects are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginalMessage {
    #[serde(rename = "type")]
    pub iou_type: Option<String>,
    #[serde(rename = "IOUTransactionID")]
    pub iou_transaction_id: Option<String>,
    #[serde(rename = "IOUDetails")]
    pub iou_details: Option<serde_json::Value>,
}

/// One entry of a report's message history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportAction {
    #[serde(rename = "reportActionID")]
    pub report_action_id: String,
    pub action_name: ActionName,
    pub created: DateTime<Utc>,
    pub message: String,
    #[serde(rename = "actorAccountID")]
    pub actor_account_id: Option<u64>,
    pub pending_action: Option<PendingAction>,
    pub is_deleted: bool,
    pub original_message: Option<OriginalMessage>,
    pub errors: Errors,
}

impl ReportAction {
    /// Build a comment created locally before the server confirms it.
    pub fn optimistic_comment(text: impl Into<String>, actor_account_id: Option<u64>) -> Self {
        Self {
            report_action_id: Uuid::now_v7().to_string(),
            action_name: ActionName::AddComment,
            created: Utc::now(),
            message: text.into(),
            actor_account_id,
            pending_action: Some(PendingAction::Add),
            ..Self::default()
        }
    }

    /// Whether the action belongs in the rendered history.
    ///
    /// Deleted actions stay visible while their deletion is still pending so
    /// the user sees the offline state.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        if self.action_name == ActionName::Other {
            return false;
        }
        !self.is_deleted || self.pending_action == Some(PendingAction::Delete)
    }

    /// Whether this parent action makes its child report a single-transaction view.
    #[must_use]
    pub fn is_transaction_thread(&self) -> bool {
        if self.action_name != ActionName::Iou {
            return false;
        }
        let Some(message) = &self.original_message else {
            return false;
        };
        match message.iou_type.as_deref() {
            Some(IOU_TYPE_CREATE) => true,
            Some(IOU_TYPE_PAY) => message.iou_details.is_some(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_pending_delete(&self) -> bool {
        self.pending_action == Some(PendingAction::Delete)
    }
}

/// History as stored: actions keyed by action ID.
pub type ReportActions = BTreeMap<String, ReportAction>;

/// Order history for display: newest first, the `CREATED` marker always last,
/// ties broken by action ID so the order is stable.
#[must_use]
pub fn sorted_for_display(actions: ReportActions) -> Vec<ReportAction> {
    let mut visible: Vec<ReportAction> = actions
        .into_values()
        .filter(ReportAction::is_visible)
        .collect();
    visible.sort_by(|left, right| {
        let left_created = left.action_name == ActionName::Created;
        let right_created = right.action_name == ActionName::Created;
        left_created
            .cmp(&right_created)
            .then_with(|| right.created.cmp(&left.created))
            .then_with(|| right.report_action_id.cmp(&left.report_action_id))
    });
    visible
}
