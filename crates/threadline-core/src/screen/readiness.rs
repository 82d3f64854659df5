//! Readiness and fetch decisions for the report screen.
//!
//! Everything here is a pure function of the current inputs; nothing is stored
//! between renders.

use crate::models::{Report, ReportAction};

/// Whether the screen can show the report's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Inputs missing or still loading.
    NotReady,
    /// A report is cached, but it belongs to a previous route.
    Transitioning,
    Ready,
}

/// Process-level inputs that gate rendering independently of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prerequisites {
    pub sidebar_loaded: bool,
    pub personal_details_loaded: bool,
    pub first_render: bool,
}

/// Whether the screen is still behind its loading gate, regardless of the report.
pub fn is_loading(route_id: &str, prerequisites: Prerequisites) -> bool {
    route_id.is_empty()
        || !prerequisites.sidebar_loaded
        || !prerequisites.personal_details_loaded
        || prerequisites.first_render
}

/// Derive readiness from the route and the cached report.
///
/// `report` is whatever the report binding currently delivers, which may still
/// be the report of the previous route.
///
/// # Examples
///
/// ```
/// use threadline_core::models::Report;
/// use threadline_core::screen::{compute_readiness, Prerequisites, Readiness};
///
/// let loaded = Prerequisites {
///     sidebar_loaded: true,
///     personal_details_loaded: true,
///     first_render: false,
/// };
/// let stale = Report { report_id: "A".to_string(), ..Report::default() };
///
/// assert_eq!(compute_readiness("", Some(&stale), loaded), Readiness::NotReady);
/// assert_eq!(compute_readiness("B", Some(&stale), loaded), Readiness::Transitioning);
/// assert_eq!(compute_readiness("A", Some(&stale), loaded), Readiness::Ready);
/// ```
pub fn compute_readiness(
    route_id: &str,
    report: Option<&Report>,
    prerequisites: Prerequisites,
) -> Readiness {
    let Some(report) = report.filter(|report| report.exists()) else {
        return Readiness::NotReady;
    };
    if is_loading(route_id, prerequisites) {
        return Readiness::NotReady;
    }
    if report.report_id != route_id {
        return Readiness::Transitioning;
    }
    Readiness::Ready
}

/// Whether the route needs `open_report`: a route is selected and the cached
/// report is absent or belongs to another route.
pub fn should_fetch(route_id: &str, report: Option<&Report>) -> bool {
    if route_id.is_empty() {
        return false;
    }
    !report.is_some_and(|report| report.exists() && report.report_id == route_id)
}

/// Whether the report identity is unchanged since the previous update, so no
/// fetch is needed.
///
/// The route can move to another report without the cached report changing
/// (the screen is reused), so an unchanged ID only counts when it also matches
/// the route.
pub fn is_identity_unchanged(route_id: &str, report_id: &str, previous_report_id: &str) -> bool {
    report_id == previous_report_id && (report_id.is_empty() || report_id == route_id)
}

/// No history to show yet and the report is still loading it.
pub fn compute_loading_initial_history(history: &[ReportAction], report: Option<&Report>) -> bool {
    history.is_empty() && report.is_some_and(|report| report.is_loading_report_actions)
}
