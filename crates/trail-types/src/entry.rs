use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::change::ChangeRecord;
use crate::error::TypeError;
use crate::family::EntityFamily;

/// The kind of event that produced an audit entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    /// Infer the action from which snapshots an event carried.
    ///
    /// Returns `None` when neither snapshot is present.
    pub fn infer(old_present: bool, new_present: bool) -> Option<Self> {
        match (old_present, new_present) {
            (false, true) => Some(Self::Create),
            (true, true) => Some(Self::Update),
            (true, false) => Some(Self::Delete),
            (false, false) => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

impl FromStr for AuditAction {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(TypeError::UnknownAction(other.to_string())),
        }
    }
}

/// One row of the audit trail, as handed to persistence.
///
/// The diff is stored as an opaque structured blob next to the event and
/// entity identity. `diff` is `None` when the event carried no structural
/// change (or the family is not diffed at all).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique event identifier (UUID v7 for time-ordering).
    pub event_id: Uuid,
    pub tenant_id: String,
    pub entity_id: String,
    pub family: EntityFamily,
    pub action: AuditAction,
    /// Actor that performed the change, when known.
    #[serde(default)]
    pub user_id: Option<String>,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub diff: Option<ChangeRecord>,
}

impl AuditEntry {
    /// Create an entry stamped with a fresh event id and the current time.
    pub fn new(
        tenant_id: impl Into<String>,
        entity_id: impl Into<String>,
        family: EntityFamily,
        action: AuditAction,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            tenant_id: tenant_id.into(),
            entity_id: entity_id.into(),
            family,
            action,
            user_id: None,
            event_date: Utc::now(),
            diff: None,
        }
    }

    /// Attach the actor identity.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach a computed diff.
    pub fn with_diff(mut self, diff: Option<ChangeRecord>) -> Self {
        self.diff = diff;
        self
    }

    /// Serialize the entry to JSON for storage.
    pub fn to_json(&self) -> Result<String, TypeError> {
        serde_json::to_string(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Parse a stored entry.
    pub fn from_json(json: &str) -> Result<Self, TypeError> {
        serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
