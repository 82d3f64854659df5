//! Report (conversation) model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Account ID of the Concierge assistant.
pub const CONCIERGE_ACCOUNT_ID: u64 = 8_392_101;

/// `stateNum` of a submitted (closed for writing) report.
pub const STATE_NUM_SUBMITTED: u8 = 1;
/// `statusNum` of a closed report.
pub const STATUS_NUM_CLOSED: u8 = 2;

/// Operations whose pending state and errors surface on the report screen.
pub const CREATION_FIELDS: [&str; 2] = ["addWorkspaceRoom", "createChat"];

/// `errorFields` entry written when fetching the report fails.
pub const OPEN_REPORT_FIELD: &str = "openReport";

/// Error messages keyed by the time they were recorded.
pub type Errors = BTreeMap<String, String>;

/// Offline write waiting for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingAction {
    Add,
    Update,
    Delete,
}

/// Kind of chat room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatType {
    PolicyAdmins,
    PolicyAnnounce,
    DomainAll,
    PolicyRoom,
    PolicyExpenseChat,
    #[serde(other)]
    Other,
}

/// Kind of report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Chat,
    Expense,
    Iou,
    Task,
    #[serde(other)]
    Other,
}

/// Who may post in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteCapability {
    All,
    Admins,
}

/// A conversation as cached in the store.
///
/// An empty `report_id` means the report is not present locally; a partially
/// loaded record (for example only the loading flag) deserializes that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    #[serde(rename = "reportID")]
    pub report_id: String,
    pub report_name: Option<String>,
    #[serde(rename = "policyID")]
    pub policy_id: Option<String>,
    pub chat_type: Option<ChatType>,
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    pub state_num: Option<u8>,
    pub status_num: Option<u8>,
    pub write_capability: Option<WriteCapability>,
    #[serde(rename = "parentReportID")]
    pub parent_report_id: Option<String>,
    #[serde(rename = "parentReportActionID")]
    pub parent_report_action_id: Option<String>,
    #[serde(rename = "participantAccountIDs")]
    pub participant_account_ids: Vec<u64>,
    pub is_optimistic_report: bool,
    pub is_loading_report_actions: bool,
    pub pending_fields: BTreeMap<String, PendingAction>,
    pub error_fields: BTreeMap<String, Errors>,
}

impl Report {
    /// Whether the report is stored locally.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.report_id.is_empty()
    }

    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.state_num == Some(STATE_NUM_SUBMITTED) && self.status_num == Some(STATUS_NUM_CLOSED)
    }

    #[must_use]
    pub fn is_money_request_report(&self) -> bool {
        matches!(self.report_type, Some(ReportType::Iou | ReportType::Expense))
    }

    #[must_use]
    pub fn is_task_report(&self) -> bool {
        self.report_type == Some(ReportType::Task)
    }

    /// Admins, announce, and domain rooms created automatically for a workspace.
    #[must_use]
    pub fn is_default_room(&self) -> bool {
        matches!(
            self.chat_type,
            Some(ChatType::PolicyAdmins | ChatType::PolicyAnnounce | ChatType::DomainAll)
        )
    }

    #[must_use]
    pub fn is_user_created_policy_room(&self) -> bool {
        self.chat_type == Some(ChatType::PolicyRoom)
    }

    #[must_use]
    pub fn is_thread(&self) -> bool {
        self.parent_report_id.is_some() && self.parent_report_action_id.is_some()
    }

    #[must_use]
    pub fn is_concierge_chat(&self) -> bool {
        self.participant_account_ids == [CONCIERGE_ACCOUNT_ID]
    }

    /// Pending action of the operation that created the report, if any.
    #[must_use]
    pub fn creation_pending_action(&self) -> Option<PendingAction> {
        CREATION_FIELDS
            .iter()
            .find_map(|field| self.pending_fields.get(*field).copied())
    }

    /// Errors of the operation that created the report, if any.
    #[must_use]
    pub fn creation_errors(&self) -> Option<&Errors> {
        CREATION_FIELDS
            .iter()
            .find_map(|field| self.error_fields.get(*field))
            .filter(|errors| !errors.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn partial_record_deserializes_as_absent() {
        let report: Report = serde_json::from_value(json!({"isLoadingReportActions": true})).unwrap();
        assert!(!report.exists());
        assert!(report.is_loading_report_actions);
    }

    #[test]
    fn deserializes_server_shape() {
        let report: Report = serde_json::from_value(json!({
            "reportID": "42",
            "policyID": "P1",
            "chatType": "policyAnnounce",
            "type": "chat",
            "participantAccountIDs": [1, 2],
            "pendingFields": {"createChat": "add"},
            "errorFields": {"createChat": {"1700000000000": "Failed"}},
            "unknownField": 1
        }))
        .unwrap();

        assert_eq!(report.report_id, "42");
        assert!(report.is_default_room());
        assert_eq!(report.creation_pending_action(), Some(PendingAction::Add));
        assert_eq!(
            report.creation_errors().and_then(|errors| errors.values().next()).map(String::as_str),
            Some("Failed")
        );
    }

    #[test]
    fn unknown_enum_values_are_tolerated() {
        let report: Report =
            serde_json::from_value(json!({"reportID": "1", "chatType": "somethingNew"})).unwrap();
        assert_eq!(report.chat_type, Some(ChatType::Other));
    }

    #[test]
    fn add_workspace_room_takes_precedence() {
        let report = Report {
            report_id: "1".to_string(),
            pending_fields: BTreeMap::from([
                ("createChat".to_string(), PendingAction::Add),
                ("addWorkspaceRoom".to_string(), PendingAction::Update),
            ]),
            ..Report::default()
        };
        assert_eq!(report.creation_pending_action(), Some(PendingAction::Update));
    }

    #[test]
    fn archived_requires_closed_submitted() {
        let mut report = Report {
            report_id: "1".to_string(),
            state_num: Some(STATE_NUM_SUBMITTED),
            ..Report::default()
        };
        assert!(!report.is_archived());
        report.status_num = Some(STATUS_NUM_CLOSED);
        assert!(report.is_archived());
    }

    #[test]
    fn concierge_chat_has_single_participant() {
        let mut report = Report {
            report_id: "1".to_string(),
            participant_account_ids: vec![CONCIERGE_ACCOUNT_ID],
            ..Report::default()
        };
        assert!(report.is_concierge_chat());
        report.participant_account_ids.push(5);
        assert!(!report.is_concierge_chat());
    }
}
