use std::time::Duration;

use threadline_core::config::ClientConfig;
use threadline_core::models::{PendingAction, ReportActions};
use threadline_core::services::{ApiClient, ReportService};
use threadline_core::store::keys::collection;
use threadline_core::store::StoreKey;
use threadline_core::Store;
use tokio::sync::broadcast::error::RecvError;

use super::common::{normalize_report_id, resolve_comment_text};
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Pending,
    Confirmed,
    Rejected(String),
}

/// State of the optimistic comments in `actions`. Any error wins.
pub fn comment_outcome(actions: &ReportActions) -> CommentOutcome {
    let pending_adds = actions
        .values()
        .filter(|action| action.pending_action == Some(PendingAction::Add));
    let mut outcome = CommentOutcome::Confirmed;
    for action in pending_adds {
        if let Some(error) = action.errors.values().next_back() {
            return CommentOutcome::Rejected(error.clone());
        }
        outcome = CommentOutcome::Pending;
    }
    outcome
}

fn read_outcome(store: &Store, key: &StoreKey) -> Result<CommentOutcome, CliError> {
    let actions: ReportActions = store.get(key)?.unwrap_or_default();
    Ok(comment_outcome(&actions))
}

pub async fn run(
    config: &ClientConfig,
    report_id: &str,
    text: &[String],
    timeout_secs: u64,
) -> Result<(), CliError> {
    let report_id = normalize_report_id(report_id)?;
    let text = resolve_comment_text(text)?;

    let store = Store::new(config.store_capacity);
    let key = StoreKey::member(collection::REPORT_ACTIONS, report_id.clone());
    let mut changes = store.changes();
    ApiClient::new(config, store.clone())?.add_comment(&report_id, &text);

    let deadline = tokio::time::sleep(Duration::from_secs(timeout_secs));
    tokio::pin!(deadline);

    loop {
        match read_outcome(&store, &key)? {
            CommentOutcome::Confirmed => break,
            CommentOutcome::Rejected(message) => return Err(CliError::CommentRejected(message)),
            CommentOutcome::Pending => {}
        }
        tokio::select! {
            () = &mut deadline => return Err(CliError::Timeout(timeout_secs)),
            change = changes.recv() => match change {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }

    println!("Posted comment to report {report_id}");
    Ok(())
}
