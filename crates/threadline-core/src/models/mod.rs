//! Data models for Threadline

mod policy;
mod report;
mod report_action;

pub use policy::{
    betas, PersonalDetails, PersonalDetailsList, Policies, Policy, PolicyType, Session,
};
pub use report::{
    ChatType, Errors, PendingAction, Report, ReportType, WriteCapability, CONCIERGE_ACCOUNT_ID,
    CREATION_FIELDS, OPEN_REPORT_FIELD,
};
pub use report_action::{
    sorted_for_display, ActionName, OriginalMessage, ReportAction, ReportActions,
};
