use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::Action;
use super::activity::Activity;
use super::contact::Contact;

/// A tracked startup engagement.
///
/// A challenge pairs a business entity with a startup and a WENOV
/// responsible. Its actions, activities and contacts are loaded with it and
/// handed to the ranking engine as an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub name: String,
    pub wenov_responsible: String,
    pub entity: String,
    pub startup_name: String,
    pub status: ChallengeStatus,
    /// Manual ordering position. Lower values come first in stored order.
    pub sort_order: i64,
    pub actions: Vec<Action>,
    /// Newest first.
    pub activities: Vec<Activity>,
    pub contacts: Vec<Contact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a challenge, set manually by the team.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    #[default]
    Ongoing,
    Overdue,
    Standby,
    Done,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Overdue => "overdue",
            Self::Standby => "standby",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ongoing" => Some(Self::Ongoing),
            "overdue" => Some(Self::Overdue),
            "standby" => Some(Self::Standby),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Input for creating a challenge. Only `name` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateChallengeInput {
    pub name: String,
    #[serde(default)]
    pub wenov_responsible: Option<String>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub startup_name: Option<String>,
    /// Defaults to `Ongoing`.
    #[serde(default)]
    pub status: Option<ChallengeStatus>,
}

/// Input for updating a challenge. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChallengeInput {
    pub name: Option<String>,
    pub wenov_responsible: Option<String>,
    pub entity: Option<String>,
    pub startup_name: Option<String>,
    pub status: Option<ChallengeStatus>,
}

/// New manual ordering: challenge ids in their desired order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderChallengesInput {
    pub ordered_ids: Vec<Uuid>,
}
