use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A timeline entry on a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub challenge_id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub note: String,
    /// Optional URL (meeting notes, recording, email thread).
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Call,
    Meeting,
    Email,
    Note,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Email => "email",
            Self::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "call" => Some(Self::Call),
            "meeting" => Some(Self::Meeting),
            "email" => Some(Self::Email),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

/// Input for logging an activity on a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityInput {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub note: String,
    #[serde(default)]
    pub link: Option<String>,
}
