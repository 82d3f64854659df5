//! Identity extraction for attachments and routed reports.
//!
//! Both extractors are total: input that does not match yields `None` (or an
//! empty report ID), never an error.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CHAT_ATTACHMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"chat-attachments/(\d+)").expect("Invalid regex"));

/// Stable identity of a chat attachment, used to key its download flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    /// Get the string representation of this ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the attachment identity from a source URL.
///
/// The identity is the run of digits following the first `chat-attachments/`
/// segment.
///
/// # Examples
///
/// ```
/// use threadline_core::identity::extract_resource_id;
///
/// let id = extract_resource_id("https://www.example.com/chat-attachments/482/w_abc.pdf");
/// assert_eq!(id.as_ref().map(|id| id.as_str()), Some("482"));
/// assert!(extract_resource_id("https://www.example.com/receipts/482").is_none());
/// ```
#[must_use]
pub fn extract_resource_id(source_url: &str) -> Option<ResourceId> {
    CHAT_ATTACHMENT_PATTERN
        .captures(source_url)
        .and_then(|captures| captures.get(1))
        .map(|id| ResourceId(id.as_str().to_string()))
}

/// Route parameters of the report screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    /// Raw report ID from the route; may be empty or padded.
    pub report_id: String,
}

impl RouteParams {
    /// Build route parameters for a report ID.
    pub fn new(report_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
        }
    }

    /// The routed report ID, trimmed. Empty means no report is selected.
    #[must_use]
    pub fn report_id(&self) -> &str {
        self.report_id.trim()
    }

    /// Whether the route selects a report at all.
    #[must_use]
    pub fn has_report(&self) -> bool {
        !self.report_id().is_empty()
    }
}

/// Build the route path for a report.
#[must_use]
pub fn report_route(report_id: &str) -> String {
    format!("r/{report_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_digits_after_marker() {
        let id = extract_resource_id("https://www.example.com/chat-attachments/482").unwrap();
        assert_eq!(id.as_str(), "482");

        let id = extract_resource_id("/chat-attachments/7310/w_2a1b.png?x=1").unwrap();
        assert_eq!(id.to_string(), "7310");
    }

    #[test]
    fn unmatched_urls_are_unkeyed() {
        assert!(extract_resource_id("").is_none());
        assert!(extract_resource_id("https://www.example.com/receipts/482").is_none());
        assert!(extract_resource_id("https://www.example.com/chat-attachments/abc").is_none());
    }

    #[test]
    fn extraction_is_deterministic() {
        let url = "https://www.example.com/chat-attachments/99/file.txt";
        assert_eq!(extract_resource_id(url), extract_resource_id(url));
    }

    #[test]
    fn route_report_id_is_trimmed() {
        assert_eq!(RouteParams::new(" 123 ").report_id(), "123");
        assert!(!RouteParams::new("   ").has_report());
        assert!(!RouteParams::default().has_report());
    }

    #[test]
    fn report_route_formats_path() {
        assert_eq!(report_route("42"), "r/42");
    }
}
