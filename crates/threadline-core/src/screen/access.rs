//! Access, composer, and header rules for a cached report.

use crate::models::{betas, ChatType, Errors, Policies, Report, ReportAction, WriteCapability};
use crate::store::keys::collection;

use super::ScreenFocus;

/// Whether the user may see `report` at all. A denied report renders the
/// not-found view.
///
/// `parent_action` is the action that spawned the report when it is a thread.
pub fn can_access_report(
    report: &Report,
    policies: &Policies,
    enabled_betas: &[String],
    parent_action: Option<&ReportAction>,
) -> bool {
    if report.is_thread() && parent_action.is_some_and(ReportAction::is_pending_delete) {
        return false;
    }
    if !can_see_default_room(report, policies, enabled_betas) {
        return false;
    }
    if report.is_user_created_policy_room()
        && !betas::is_enabled(enabled_betas, betas::POLICY_ROOMS)
    {
        return false;
    }
    true
}

fn can_see_default_room(report: &Report, policies: &Policies, enabled_betas: &[String]) -> bool {
    if !report.is_default_room() || report.is_archived() {
        return true;
    }
    if let Some(policy_id) = report.policy_id.as_deref() {
        if !policies.contains_key(&format!("{}{policy_id}", collection::POLICY)) {
            return false;
        }
    }
    betas::is_enabled(enabled_betas, betas::DEFAULT_ROOMS)
}

/// Whether the composer must be hidden: archived reports, reports whose
/// creation failed, and announce rooms restricted to admins.
pub fn should_hide_composer(report: &Report, errors: Option<&Errors>) -> bool {
    if report.is_archived() {
        return true;
    }
    if errors.is_some_and(|errors| !errors.is_empty()) {
        return true;
    }
    report.chat_type == Some(ChatType::PolicyAnnounce)
        && report.write_capability == Some(WriteCapability::Admins)
}

/// The report is on screen: the app is visible, the screen is focused, and
/// the sidebar does not cover it on a narrow layout.
pub fn is_report_fully_visible(app_visible: bool, focus: ScreenFocus) -> bool {
    app_visible && focus.is_focused && !(focus.is_small_screen_width && focus.is_sidebar_open)
}

/// Header variant above the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Chat,
    /// Money request report, or a thread on a single transaction.
    MoneyRequest { is_single_transaction_view: bool },
}

pub fn header_kind(report: &Report, parent_action: Option<&ReportAction>) -> HeaderKind {
    let is_single_transaction_view = parent_action.is_some_and(ReportAction::is_transaction_thread);
    if report.is_money_request_report() || is_single_transaction_view {
        HeaderKind::MoneyRequest {
            is_single_transaction_view,
        }
    } else {
        HeaderKind::Chat
    }
}
