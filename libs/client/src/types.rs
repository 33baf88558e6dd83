//! API resource models.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project: the top-level container for environments and domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    /// The protected default branch; its environment can never be
    /// deactivated or deleted.
    pub default_branch: String,
}

/// Environment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentStatus {
    Active,
    Inactive,
    Dirty,
    Deleting,
    /// Statuses introduced server-side that this client does not know yet.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Dirty => "dirty",
            Self::Deleting => "deleting",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// An environment: a branch-like deployment that can be activated,
/// deactivated, and deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub status: EnvironmentStatus,
    /// Parent environment ID; `None` for root environments.
    pub parent: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Operations the server currently permits on this environment.
    #[serde(default)]
    pub operations: Vec<String>,
}

impl Environment {
    pub fn is_active(&self) -> bool {
        self.status == EnvironmentStatus::Active
    }

    pub fn operation_available(&self, name: &str) -> bool {
        self.operations.iter().any(|op| op == name)
    }
}

/// Completion state of an asynchronous activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityState {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "failed")]
    Failed,
}

impl ActivityState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A server-tracked asynchronous job representing one remote operation.
///
/// Activities are created server-side and observed, never mutated, by
/// clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// Job type, e.g. `environment.backup` or `environment.synchronize`.
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Opaque key/value data attached by the server.
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub state: ActivityState,
    /// Operations the server currently permits on this activity.
    #[serde(default)]
    pub operations: Vec<String>,
}

impl Activity {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_complete(&self) -> bool {
        self.state == ActivityState::Complete
    }

    pub fn operation_available(&self, name: &str) -> bool {
        self.operations.iter().any(|op| op == name)
    }

    /// Backup name recorded by `environment.backup` activities.
    pub fn backup_name(&self) -> Option<&str> {
        self.payload.get("backup_name").map(String::as_str)
    }
}

/// A domain attached to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub wildcard: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated SSL material for a domain: certificate, private key, and an
/// ordered certificate chain, all as PEM text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslBundle {
    pub certificate: String,
    pub key: String,
    pub chain: Vec<String>,
}

/// Request body for domain creation.
#[derive(Debug, Clone, Serialize)]
pub struct AddDomainRequest {
    pub name: String,
    pub wildcard: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<SslBundle>,
}

/// Authenticated identity, as reported by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub subject_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Standard list envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub items: Vec<T>,
}
