//! Collaborator services
//!
//! The report screen and the download coordinator only see the traits here.
//! [`ApiClient`] and [`HttpFileDownloader`] are the HTTP-backed implementations.

mod api;
#[cfg(test)]
mod test_server;
mod transfer;

use std::future::Future;

pub use api::ApiClient;
pub use transfer::HttpFileDownloader;

use crate::Result;

/// Writes report data into the store. Calls return immediately; results arrive
/// later as store mutations.
pub trait ReportService: Send + Sync {
    /// Fetch a report and its recent history.
    fn open_report(&self, report_id: &str);

    /// Post a comment, appending it optimistically first.
    fn add_comment(&self, report_id: &str, text: &str);
}

/// Retrieves a file to local storage.
pub trait FileDownloader: Send + Sync {
    /// Download `url` and save it under `display_name`. Resolves once the
    /// transfer finished or failed.
    fn download(&self, url: &str, display_name: &str) -> impl Future<Output = Result<()>> + Send;
}
