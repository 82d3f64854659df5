//! Workspace policy and participant directory models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    Personal,
    Team,
    Corporate,
    #[serde(other)]
    Other,
}

/// A workspace the user has access to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: Option<PolicyType>,
    pub role: Option<String>,
}

impl Policy {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// Policies keyed by their full store key (`policy_<id>`).
pub type Policies = BTreeMap<String, Policy>;

/// Display data of one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalDetails {
    #[serde(rename = "accountID")]
    pub account_id: u64,
    pub display_name: Option<String>,
    pub login: Option<String>,
}

/// Participant directory keyed by account ID.
pub type PersonalDetailsList = BTreeMap<String, PersonalDetails>;

/// Signed-in session data kept in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    #[serde(rename = "accountID")]
    pub account_id: Option<u64>,
    pub email: Option<String>,
}

/// Beta feature names checked by the report screen.
pub mod betas {
    pub const ALL: &str = "all";
    pub const DEFAULT_ROOMS: &str = "defaultRooms";
    pub const POLICY_ROOMS: &str = "policyRooms";

    /// Whether `betas` enables `feature`, directly or through `all`.
    pub fn is_enabled(betas: &[String], feature: &str) -> bool {
        betas.iter().any(|beta| beta == feature || beta == ALL)
    }
}
