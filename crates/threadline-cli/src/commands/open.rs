use std::sync::Arc;
use std::time::Duration;

use threadline_core::config::ClientConfig;
use threadline_core::layout::LayoutHints;
use threadline_core::screen::{Readiness, ReportScreen, ScreenContext, ScreenView};
use threadline_core::services::ApiClient;
use threadline_core::store::keys::IS_SIDEBAR_LOADED;
use threadline_core::store::StoreKey;
use threadline_core::visibility::Visibility;
use threadline_core::{RouteParams, Store};
use tokio::sync::broadcast::error::RecvError;

use super::common::{format_summary_lines, normalize_report_id, summarize_view};
use crate::error::CliError;

/// Whether the screen has nothing more to wait for.
pub fn is_settled(view: &ScreenView) -> bool {
    if view.access_denied || view.fetch_errors.is_some() {
        return true;
    }
    view.readiness == Readiness::Ready && !view.is_loading_initial_history
}

pub async fn run(
    config: &ClientConfig,
    report_id: &str,
    timeout_secs: u64,
    json: bool,
) -> Result<(), CliError> {
    let report_id = normalize_report_id(report_id)?;

    let store = Store::new(config.store_capacity);
    // No sidebar in a terminal session.
    store.set(&StoreKey::single(IS_SIDEBAR_LOADED), true)?;
    let reports = Arc::new(ApiClient::new(config, store.clone())?);
    let context = ScreenContext {
        store: store.clone(),
        reports,
        visibility: Visibility::default(),
        layout: LayoutHints::new(),
    };

    let mut changes = store.changes();
    let mut screen = ReportScreen::new(context, RouteParams::new(report_id.clone()));
    screen.mount();
    let mut view = screen.render();

    let deadline = tokio::time::sleep(Duration::from_secs(timeout_secs));
    tokio::pin!(deadline);
    let mut timed_out = false;

    while !is_settled(&view) {
        tokio::select! {
            () = &mut deadline => {
                timed_out = true;
                break;
            }
            change = changes.recv() => match change {
                Ok(change) => {
                    if !screen.handle_store_change(&change) {
                        continue;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Store change feed lagged; resyncing");
                    screen.sync();
                }
                Err(RecvError::Closed) => break,
            },
        }
        view = screen.render();
    }

    let summary = summarize_view(&report_id, &view);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(&summary) {
            println!("{line}");
        }
    }
    screen.unmount();

    if timed_out {
        return Err(CliError::Timeout(timeout_secs));
    }
    Ok(())
}
