//! Store key names and the tagged key type.

use std::fmt;

/// Whether the sidebar index has finished its first load.
pub const IS_SIDEBAR_LOADED: &str = "isSidebarLoaded";
/// Enabled beta features for the signed-in account.
pub const BETAS: &str = "betas";
/// Directory of every known participant.
pub const PERSONAL_DETAILS_LIST: &str = "personalDetailsList";
/// Report ID of the account manager chat, if one is assigned.
pub const ACCOUNT_MANAGER_REPORT_ID: &str = "accountManagerReportID";
/// Signed-in session (account ID, auth token).
pub const SESSION: &str = "session";
/// Whether the compose input is shown.
pub const SHOULD_SHOW_COMPOSE_INPUT: &str = "shouldShowComposeInput";
/// Whether the emoji picker popover is open.
pub const IS_EMOJI_PICKER_VISIBLE: &str = "isEmojiPickerVisible";

/// Collection key prefixes. Members are addressed as `prefix + id`.
pub mod collection {
    pub const REPORT: &str = "report_";
    pub const REPORT_ACTIONS: &str = "reportActions_";
    pub const REPORT_IS_COMPOSER_FULL_SIZE: &str = "reportIsComposerFullSize_";
    pub const POLICY: &str = "policy_";
    pub const DOWNLOAD: &str = "download_";

    /// Every known collection prefix.
    pub const ALL: [&str; 5] = [
        REPORT,
        REPORT_ACTIONS,
        REPORT_IS_COMPOSER_FULL_SIZE,
        POLICY,
        DOWNLOAD,
    ];

    /// Collections whose members may be dropped under cache pressure.
    pub const SAFE_EVICTION: [&str; 1] = [REPORT_ACTIONS];
}

/// A store key: a single named value, a whole collection, or one collection member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Single(String),
    Collection(&'static str),
    Member(&'static str, String),
}

impl StoreKey {
    /// Key for a single named value.
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    /// Key for one member of a collection.
    pub fn member(prefix: &'static str, id: impl Into<String>) -> Self {
        Self::Member(prefix, id.into())
    }

    /// Classify a raw key string, recognising known collection prefixes.
    pub fn parse(raw: &str) -> Self {
        for prefix in collection::ALL {
            if raw == prefix {
                return Self::Collection(prefix);
            }
            if let Some(id) = raw.strip_prefix(prefix) {
                return Self::Member(prefix, id.to_string());
            }
        }
        Self::Single(raw.to_string())
    }

    /// The flat string form used for storage and change notifications.
    pub fn as_string(&self) -> String {
        match self {
            Self::Single(name) => name.clone(),
            Self::Collection(prefix) => (*prefix).to_string(),
            Self::Member(prefix, id) => format!("{prefix}{id}"),
        }
    }

    /// Whether a change to the raw key `changed` affects a reader of this key.
    pub fn covers(&self, changed: &str) -> bool {
        match self {
            Self::Collection(prefix) => changed.starts_with(prefix),
            _ => self.as_string() == changed,
        }
    }

    /// Whether the retention policy may drop this key.
    pub fn is_evictable(&self) -> bool {
        matches!(self, Self::Member(prefix, _) if collection::SAFE_EVICTION.contains(prefix))
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}
