use std::io::{self, IsTerminal, Read};

use chrono::Utc;
use serde::Serialize;
use threadline_core::models::ReportAction;
use threadline_core::screen::{Content, Footer, Readiness, ScreenView};
use threadline_core::util::is_http_url;

use crate::error::CliError;

const FALLBACK_FILE_NAME: &str = "attachment";

#[derive(Debug, Serialize)]
pub struct MessageItem {
    pub id: String,
    pub created_at: i64,
    pub relative_time: String,
    pub actor_account_id: Option<u64>,
    pub message: String,
    pub pending: bool,
}

#[derive(Debug, Serialize)]
pub struct ScreenSummary {
    pub report_id: String,
    pub readiness: &'static str,
    pub access_denied: bool,
    pub is_loading_initial_history: bool,
    pub can_compose: bool,
    pub errors: Vec<String>,
    pub messages: Vec<MessageItem>,
}

pub const fn readiness_label(readiness: Readiness) -> &'static str {
    match readiness {
        Readiness::NotReady => "not-ready",
        Readiness::Transitioning => "transitioning",
        Readiness::Ready => "ready",
    }
}

pub fn message_to_item(action: &ReportAction, now_ms: i64) -> MessageItem {
    let created_at = action.created.timestamp_millis();
    MessageItem {
        id: action.report_action_id.clone(),
        created_at,
        relative_time: format_relative_time(created_at, now_ms),
        actor_account_id: action.actor_account_id,
        message: action.message.clone(),
        pending: action.pending_action.is_some(),
    }
}

pub fn summarize_view(report_id: &str, view: &ScreenView) -> ScreenSummary {
    let now_ms = Utc::now().timestamp_millis();
    let messages = match &view.content {
        Content::Messages(actions) => actions
            .iter()
            .map(|action| message_to_item(action, now_ms))
            .collect(),
        Content::NotFound | Content::Skeleton { .. } => Vec::new(),
    };
    ScreenSummary {
        report_id: report_id.to_string(),
        readiness: readiness_label(view.readiness),
        access_denied: view.access_denied,
        is_loading_initial_history: view.is_loading_initial_history,
        can_compose: matches!(
            view.footer,
            Footer::Full {
                show_composer: true,
                ..
            }
        ),
        errors: view
            .errors
            .iter()
            .chain(&view.fetch_errors)
            .flat_map(|errors| errors.values().cloned())
            .collect(),
        messages,
    }
}

pub fn format_summary_lines(summary: &ScreenSummary) -> Vec<String> {
    if summary.access_denied {
        return vec![format!(
            "Report {} was not found or you do not have access to it.",
            summary.report_id
        )];
    }

    let mut lines = vec![format!("Report {} [{}]", summary.report_id, summary.readiness)];
    lines.extend(summary.errors.iter().map(|error| format!("  ! {error}")));
    if summary.is_loading_initial_history {
        lines.push("  (history still loading)".to_string());
    } else if summary.messages.is_empty() {
        lines.push("  (no messages)".to_string());
    }
    // Newest first on screen; read oldest first in a terminal.
    for item in summary.messages.iter().rev() {
        let pending = if item.pending { " (pending)" } else { "" };
        let actor = item
            .actor_account_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        lines.push(format!(
            "  {:>8}  {actor}: {}{pending}",
            item.relative_time, item.message
        ));
    }
    if !summary.can_compose {
        lines.push("  (composer unavailable)".to_string());
    }
    lines
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_report_id(report_id: &str) -> Result<String, CliError> {
    let trimmed = report_id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyReportId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Comment text from arguments, falling back to piped stdin.
pub fn resolve_comment_text(parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&parts.join(" ")) {
        return Ok(text);
    }
    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }
    Err(CliError::EmptyComment)
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn normalize_attachment_url(url: &str) -> Result<String, CliError> {
    let trimmed = url.trim();
    if is_http_url(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(CliError::InvalidUrl(trimmed.to_string()))
    }
}

/// Last non-empty path segment of `url`, without query or fragment.
pub fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path
        .split_once("://")
        .map_or(path, |(_, rest)| rest.split_once('/').map_or("", |(_, path)| path));
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map_or_else(|| FALLBACK_FILE_NAME.to_string(), str::to_string)
}
