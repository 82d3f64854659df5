//! Store subscriptions backing the report screen.

use serde_json::Value;

use crate::error::Result;
use crate::identity::RouteParams;
use crate::models::{sorted_for_display, PersonalDetailsList, Policies, Report, ReportAction, ReportActions};
use crate::store::keys::{self, collection};
use crate::store::{Binding, Store, StoreKey, SubscriptionDescriptor};

fn report_key(route: &RouteParams) -> StoreKey {
    StoreKey::member(collection::REPORT, route.report_id())
}

fn report_actions_key(route: &RouteParams) -> StoreKey {
    StoreKey::member(collection::REPORT_ACTIONS, route.report_id())
}

fn composer_full_size_key(route: &RouteParams) -> StoreKey {
    StoreKey::member(collection::REPORT_IS_COMPOSER_FULL_SIZE, route.report_id())
}

fn sorted_actions_selector(value: Value) -> Result<Vec<ReportAction>> {
    let actions: ReportActions = serde_json::from_value(value)?;
    Ok(sorted_for_display(actions))
}

fn sync_if_affected<T>(binding: &mut Binding<T>, changed: &str) -> bool {
    let affected = binding.is_affected_by(changed);
    if affected {
        binding.sync();
    }
    affected
}

/// Every store input of one screen instance.
#[derive(Debug)]
pub(crate) struct ScreenBindings {
    pub(crate) is_sidebar_loaded: Binding<bool>,
    pub(crate) report_actions: Binding<Vec<ReportAction>>,
    pub(crate) report: Binding<Report>,
    pub(crate) is_composer_full_size: Binding<bool>,
    pub(crate) betas: Binding<Vec<String>>,
    pub(crate) policies: Binding<Policies>,
    pub(crate) account_manager_report_id: Binding<String>,
    pub(crate) personal_details: Binding<PersonalDetailsList>,
}

impl ScreenBindings {
    pub(crate) fn open(store: &Store, route: &RouteParams) -> Self {
        Self {
            is_sidebar_loaded: store.subscribe(
                SubscriptionDescriptor::fixed(
                    "isSidebarLoaded",
                    StoreKey::single(keys::IS_SIDEBAR_LOADED),
                ),
                route,
            ),
            report_actions: store.subscribe(
                SubscriptionDescriptor::routed("reportActions", report_actions_key)
                    .never_evict()
                    .with_selector(sorted_actions_selector),
                route,
            ),
            report: store.subscribe(
                SubscriptionDescriptor::routed("report", report_key).keep_stale_on_rebind(),
                route,
            ),
            is_composer_full_size: store.subscribe(
                SubscriptionDescriptor::routed("isComposerFullSize", composer_full_size_key),
                route,
            ),
            betas: store.subscribe(
                SubscriptionDescriptor::fixed("betas", StoreKey::single(keys::BETAS)),
                route,
            ),
            policies: store.subscribe(
                SubscriptionDescriptor::fixed("policies", StoreKey::Collection(collection::POLICY)),
                route,
            ),
            account_manager_report_id: store.subscribe(
                SubscriptionDescriptor::fixed(
                    "accountManagerReportID",
                    StoreKey::single(keys::ACCOUNT_MANAGER_REPORT_ID),
                ),
                route,
            ),
            personal_details: store.subscribe(
                SubscriptionDescriptor::fixed(
                    "personalDetails",
                    StoreKey::single(keys::PERSONAL_DETAILS_LIST),
                ),
                route,
            ),
        }
    }

    /// Move the routed bindings to `route`. Returns whether any key changed.
    ///
    /// Only the report keeps the previous route's value; history and composer
    /// size start empty for the new route.
    pub(crate) fn rebind(&mut self, route: &RouteParams) -> bool {
        let report_actions = self.report_actions.rebind(route);
        let report = self.report.rebind(route);
        let composer = self.is_composer_full_size.rebind(route);
        report_actions || report || composer
    }

    /// Re-read the bindings affected by a change to `changed`. Returns whether
    /// any binding was affected.
    pub(crate) fn sync_changed(&mut self, changed: &str) -> bool {
        let affected = [
            sync_if_affected(&mut self.is_sidebar_loaded, changed),
            sync_if_affected(&mut self.report_actions, changed),
            sync_if_affected(&mut self.report, changed),
            sync_if_affected(&mut self.is_composer_full_size, changed),
            sync_if_affected(&mut self.betas, changed),
            sync_if_affected(&mut self.policies, changed),
            sync_if_affected(&mut self.account_manager_report_id, changed),
            sync_if_affected(&mut self.personal_details, changed),
        ];
        affected.contains(&true)
    }

    /// Re-read every binding.
    pub(crate) fn sync_all(&mut self) {
        self.is_sidebar_loaded.sync();
        self.report_actions.sync();
        self.report.sync();
        self.is_composer_full_size.sync();
        self.betas.sync();
        self.policies.sync();
        self.account_manager_report_id.sync();
        self.personal_details.sync();
    }
}
