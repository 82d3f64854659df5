//! Report screen controller
//!
//! Keeps one chat-thread screen in step with the store. The screen may outlive
//! the report it shows: when the route moves to another report, the bindings
//! keep delivering the previous report until the new one is cached, and the
//! controller fetches the new report exactly once for that transition.
//!
//! The controller never holds derived state. [`ReportScreen::render`] projects
//! the current inputs into a [`ScreenView`] each time it is called.

mod access;
mod bindings;
mod composer;
mod readiness;

use std::sync::{Arc, Mutex, PoisonError};

use crate::identity::{report_route, RouteParams};
use crate::layout::LayoutHints;
use crate::models::{
    Errors, PendingAction, Policies, Report, ReportAction, ReportActions, OPEN_REPORT_FIELD,
};
use crate::services::ReportService;
use crate::store::keys::collection;
use crate::store::{Store, StoreChange, StoreKey};
use crate::visibility::{Visibility, VisibilitySubscription};

pub use access::{
    can_access_report, header_kind, is_report_fully_visible, should_hide_composer, HeaderKind,
};
pub use composer::ComposerActions;
pub use readiness::{
    compute_loading_initial_history, compute_readiness, is_identity_unchanged, is_loading,
    should_fetch, Prerequisites, Readiness,
};

use bindings::ScreenBindings;

/// Collaborators shared by every screen of the process.
#[derive(Clone)]
pub struct ScreenContext {
    pub store: Store,
    pub reports: Arc<dyn ReportService>,
    pub visibility: Visibility,
    pub layout: LayoutHints,
}

impl std::fmt::Debug for ScreenContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenContext")
            .field("store", &self.store)
            .field("visibility", &self.visibility)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Navigation and window state of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenFocus {
    pub is_focused: bool,
    pub is_small_screen_width: bool,
    pub is_sidebar_open: bool,
}

impl Default for ScreenFocus {
    fn default() -> Self {
        Self {
            is_focused: true,
            is_small_screen_width: false,
            is_sidebar_open: false,
        }
    }
}

/// Main area of the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    NotFound,
    Skeleton { height: f64 },
    Messages(Vec<ReportAction>),
}

/// Footer below the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footer {
    /// Covered by the not-found view.
    Hidden,
    /// Placeholder footer with composing disabled.
    Disabled,
    Full {
        show_composer: bool,
        is_composer_full_size: bool,
    },
}

/// Everything the presentation layer draws for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenView {
    pub readiness: Readiness,
    pub content: Content,
    pub footer: Footer,
    pub header: HeaderKind,
    pub show_task_header: bool,
    /// Pending creation of the report, shown as offline feedback.
    pub pending_action: Option<PendingAction>,
    /// Errors from creating the report.
    pub errors: Option<Errors>,
    /// Errors from the last failed fetch of the report.
    pub fetch_errors: Option<Errors>,
    pub show_account_manager_banner: bool,
    pub is_loading: bool,
    pub is_loading_initial_history: bool,
    pub access_denied: bool,
    pub should_hide_composer: bool,
}

/// Inputs the visibility listener reads from outside the screen.
#[derive(Debug, Clone, Default)]
struct VisibilityInputs {
    report_id: String,
    is_optimistic_report: bool,
    focus: ScreenFocus,
}

pub struct ReportScreen {
    context: ScreenContext,
    composer: ComposerActions,
    route: RouteParams,
    focus: ScreenFocus,
    bindings: ScreenBindings,
    first_render: bool,
    skeleton_height: f64,
    is_banner_visible: bool,
    previous_report_id: String,
    last_fetched_route: Option<String>,
    visibility_inputs: Arc<Mutex<VisibilityInputs>>,
    visibility_subscription: Option<VisibilitySubscription>,
}

impl std::fmt::Debug for ReportScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportScreen")
            .field("route", &self.route)
            .field("focus", &self.focus)
            .field("first_render", &self.first_render)
            .field("previous_report_id", &self.previous_report_id)
            .field("last_fetched_route", &self.last_fetched_route)
            .finish_non_exhaustive()
    }
}

impl ReportScreen {
    /// Open the store bindings for `route`. Nothing is fetched until [`Self::mount`].
    pub fn new(context: ScreenContext, route: RouteParams) -> Self {
        let bindings = ScreenBindings::open(&context.store, &route);
        let previous_report_id = bindings
            .report
            .value()
            .map(|report| report.report_id.clone())
            .unwrap_or_default();
        let skeleton_height = context.layout.skeleton_height();
        Self {
            composer: ComposerActions::new(context.store.clone()),
            context,
            route,
            focus: ScreenFocus::default(),
            bindings,
            first_render: true,
            skeleton_height,
            is_banner_visible: true,
            previous_report_id,
            last_fetched_route: None,
            visibility_inputs: Arc::new(Mutex::new(VisibilityInputs::default())),
            visibility_subscription: None,
        }
    }

    /// Start listening for visibility changes and fetch the report if it is
    /// not cached.
    pub fn mount(&mut self) {
        self.refresh_visibility_inputs();
        let inputs = Arc::clone(&self.visibility_inputs);
        let reports = Arc::clone(&self.context.reports);
        self.visibility_subscription =
            Some(self.context.visibility.on_visibility_change(move |visible| {
                let inputs = inputs
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                refresh_if_fully_visible(&inputs, visible, reports.as_ref());
            }));

        self.fetch_if_needed();
        self.composer.set_should_show_compose_input(true);
    }

    /// Release the visibility listener and every store binding.
    pub fn unmount(self) {
        tracing::debug!(report_id = self.route.report_id(), "Unmounting report screen");
    }

    pub fn route(&self) -> &RouteParams {
        &self.route
    }

    /// Point the screen at a new route without remounting it.
    pub fn set_route(&mut self, route: RouteParams) {
        if route == self.route {
            return;
        }
        self.route = route;
        self.bindings.rebind(&self.route);
        self.did_update();
    }

    pub fn set_focus(&mut self, focus: ScreenFocus) {
        self.focus = focus;
        self.refresh_visibility_inputs();
    }

    /// React to a store mutation. Returns whether any input of the screen changed.
    pub fn handle_store_change(&mut self, change: &StoreChange) -> bool {
        if !self.bindings.sync_changed(&change.key) {
            return false;
        }
        self.did_update();
        true
    }

    /// Re-read every input, for callers that missed change notifications.
    pub fn sync(&mut self) {
        self.bindings.sync_all();
        self.did_update();
    }

    /// The report currently delivered, possibly still the previous route's.
    pub fn report(&self) -> Option<&Report> {
        self.bindings.report.value()
    }

    pub fn readiness(&self) -> Readiness {
        compute_readiness(self.route.report_id(), self.report(), self.prerequisites())
    }

    /// Project the current inputs into a view. The first call of an instance
    /// always renders the loading state.
    pub fn render(&mut self) -> ScreenView {
        let view = self.view();
        self.first_render = false;
        view
    }

    /// Record a layout measurement of the history area. Zero heights come from
    /// views being torn down and are ignored.
    pub fn on_layout(&mut self, height: f64) {
        if self.context.layout.record_skeleton_height(height) {
            self.skeleton_height = height;
        }
    }

    pub fn skeleton_height(&self) -> f64 {
        self.skeleton_height
    }

    pub fn on_submit_comment(&self, text: &str) {
        self.context.reports.add_comment(self.route.report_id(), text);
    }

    pub fn dismiss_banner(&mut self) {
        self.is_banner_visible = false;
    }

    /// Route of the account manager chat, if one is configured.
    pub fn chat_with_account_manager(&self) -> Option<String> {
        self.account_manager_report_id().map(report_route)
    }

    /// Refresh the current report after the app returns to the foreground.
    pub fn on_visibility_regained(&self) {
        let inputs = self
            .visibility_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        refresh_if_fully_visible(
            &inputs,
            self.context.visibility.is_visible(),
            self.context.reports.as_ref(),
        );
    }

    fn did_update(&mut self) {
        if let Some(report) = self.report() {
            if should_hide_composer(report, report.creation_errors()) {
                self.composer.hide_emoji_picker();
            }
        }

        let report_id = self
            .report()
            .map(|report| report.report_id.clone())
            .unwrap_or_default();
        let unchanged =
            is_identity_unchanged(self.route.report_id(), &report_id, &self.previous_report_id);
        self.previous_report_id = report_id;
        self.refresh_visibility_inputs();
        if unchanged {
            return;
        }

        self.fetch_if_needed();
        self.composer.set_should_show_compose_input(true);
    }

    fn fetch_if_needed(&mut self) {
        let route_id = self.route.report_id();
        if !should_fetch(route_id, self.report()) {
            self.last_fetched_route = None;
            return;
        }
        if self.last_fetched_route.as_deref() == Some(route_id) {
            tracing::debug!(report_id = route_id, "Report already requested for this route");
            return;
        }
        tracing::debug!(report_id = route_id, "Report not cached; opening");
        self.context.reports.open_report(route_id);
        self.last_fetched_route = Some(route_id.to_string());
    }

    fn refresh_visibility_inputs(&self) {
        let report = self.report();
        let mut inputs = self
            .visibility_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        inputs.report_id = report
            .map(|report| report.report_id.clone())
            .unwrap_or_default();
        inputs.is_optimistic_report = report.is_some_and(|report| report.is_optimistic_report);
        inputs.focus = self.focus;
    }

    fn prerequisites(&self) -> Prerequisites {
        Prerequisites {
            sidebar_loaded: self.bindings.is_sidebar_loaded.value() == Some(&true),
            personal_details_loaded: self
                .bindings
                .personal_details
                .value()
                .is_some_and(|details| !details.is_empty()),
            first_render: self.first_render,
        }
    }

    fn account_manager_report_id(&self) -> Option<&str> {
        self.bindings
            .account_manager_report_id
            .value()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }

    fn parent_report_action(&self, report: &Report) -> Option<ReportAction> {
        let parent_report_id = report.parent_report_id.as_deref()?;
        let parent_action_id = report.parent_report_action_id.as_deref()?;
        let key = StoreKey::member(collection::REPORT_ACTIONS, parent_report_id);
        match self.context.store.get::<ReportActions>(&key) {
            Ok(actions) => actions?.remove(parent_action_id),
            Err(error) => {
                tracing::warn!("Unreadable parent report actions: {error}");
                None
            }
        }
    }

    fn view(&self) -> ScreenView {
        let empty = Report::default();
        let report = self.report().unwrap_or(&empty);
        let route_id = self.route.report_id();
        let prerequisites = self.prerequisites();

        let readiness = compute_readiness(route_id, self.report(), prerequisites);
        let is_loading = is_loading(route_id, prerequisites);
        let history = self
            .bindings
            .report_actions
            .value()
            .map(Vec::as_slice)
            .unwrap_or_default();
        let is_loading_initial_history = compute_loading_initial_history(history, self.report());

        let parent_action = self.parent_report_action(report);
        let betas = self.bindings.betas.value().map(Vec::as_slice).unwrap_or_default();
        let empty_policies = Policies::new();
        let policies = self.bindings.policies.value().unwrap_or(&empty_policies);
        let access_denied = (!report.exists() && !report.is_loading_report_actions && !is_loading)
            || !can_access_report(report, policies, betas, parent_action.as_ref());

        let errors = report.creation_errors().cloned();
        let fetch_errors = report
            .error_fields
            .get(OPEN_REPORT_FIELD)
            .filter(|errors| !errors.is_empty())
            .cloned();
        let hide_composer = should_hide_composer(report, errors.as_ref());

        let content = if access_denied {
            Content::NotFound
        } else if readiness == Readiness::Ready && !is_loading_initial_history {
            Content::Messages(history.to_vec())
        } else {
            Content::Skeleton {
                height: self.skeleton_height,
            }
        };
        let footer = match readiness {
            _ if access_denied => Footer::Hidden,
            Readiness::Ready => Footer::Full {
                show_composer: !hide_composer,
                is_composer_full_size: self.bindings.is_composer_full_size.value() == Some(&true),
            },
            Readiness::NotReady | Readiness::Transitioning => Footer::Disabled,
        };

        ScreenView {
            readiness,
            content,
            footer,
            header: header_kind(report, parent_action.as_ref()),
            show_task_header: report.is_task_report(),
            pending_action: report.creation_pending_action(),
            errors,
            fetch_errors,
            show_account_manager_banner: self.is_banner_visible
                && self.account_manager_report_id().is_some()
                && report.is_concierge_chat(),
            is_loading,
            is_loading_initial_history,
            access_denied,
            should_hide_composer: hide_composer,
        }
    }
}

fn refresh_if_fully_visible(
    inputs: &VisibilityInputs,
    app_visible: bool,
    reports: &dyn ReportService,
) {
    if !is_report_fully_visible(app_visible, inputs.focus) || inputs.is_optimistic_report {
        return;
    }
    if inputs.report_id.is_empty() {
        return;
    }
    tracing::debug!(report_id = %inputs.report_id, "Refreshing report after visibility change");
    reports.open_report(&inputs.report_id);
}
