use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task belonging to a challenge.
///
/// `due_date` is a plain calendar date. Overdue checks compare dates only,
/// never times of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub title: String,
    pub owner: ActionOwner,
    pub due_date: NaiveDate,
    pub is_done: bool,
    pub is_urgent: bool,
    /// Board member the action is assigned to, if any.
    pub assignee_id: Option<Uuid>,
    pub assignee_name: Option<String>,
}

/// Who is responsible for an action.
///
/// Three fixed roles plus any named organisation. Organisations (business
/// units such as "WafaSalaf" or "AWB RH") share the same field as the roles,
/// so anything that is not exactly one of the role constants is treated as an
/// entity owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionOwner {
    Startup,
    Wenov,
    Ceed,
    /// A named organisation, carrying the raw name.
    Entity(String),
}

impl ActionOwner {
    pub const STARTUP: &'static str = "STARTUP";
    pub const WENOV: &'static str = "WENOV";
    pub const CEED: &'static str = "CEED";

    pub fn parse(s: &str) -> Self {
        Self::from(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Startup => Self::STARTUP,
            Self::Wenov => Self::WENOV,
            Self::Ceed => Self::CEED,
            Self::Entity(name) => name,
        }
    }

    /// True for named organisations, false for the three fixed roles.
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Entity(_))
    }
}

impl From<String> for ActionOwner {
    fn from(s: String) -> Self {
        match s.as_str() {
            Self::STARTUP => Self::Startup,
            Self::WENOV => Self::Wenov,
            Self::CEED => Self::Ceed,
            _ => Self::Entity(s),
        }
    }
}

impl From<ActionOwner> for String {
    fn from(owner: ActionOwner) -> Self {
        match owner {
            ActionOwner::Entity(name) => name,
            fixed => fixed.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActionOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for creating an action on a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActionInput {
    pub title: String,
    pub owner: ActionOwner,
    pub due_date: NaiveDate,
    /// Defaults to `false`.
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
}

/// Input for updating an action. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateActionInput {
    pub title: Option<String>,
    pub owner: Option<ActionOwner>,
    pub due_date: Option<NaiveDate>,
    pub is_done: Option<bool>,
    pub is_urgent: Option<bool>,
    /// `Some(None)` (JSON `null`) clears the assignee; absence leaves it untouched.
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<Uuid>>,
}

/// An action flattened with the context of the challenge it belongs to.
///
/// Used by the cross-challenge action list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionWithChallenge {
    #[serde(flatten)]
    pub action: Action,
    pub challenge_name: String,
    pub challenge_entity: String,
    pub startup_name: String,
}

/// Distinguishes a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_roles_are_not_entities() {
        assert!(!ActionOwner::parse("STARTUP").is_entity());
        assert!(!ActionOwner::parse("WENOV").is_entity());
        assert!(!ActionOwner::parse("CEED").is_entity());
    }

    #[test]
    fn any_other_name_is_an_entity() {
        assert_eq!(
            ActionOwner::parse("Wafa Cash"),
            ActionOwner::Entity("Wafa Cash".to_string())
        );
        // Role matching is exact; case variants are organisations.
        assert!(ActionOwner::parse("startup").is_entity());
    }

    #[test]
    fn owner_serializes_as_plain_string() {
        let json = serde_json::to_string(&ActionOwner::Startup).unwrap();
        assert_eq!(json, "\"STARTUP\"");

        let owner: ActionOwner = serde_json::from_str("\"AWB RH\"").unwrap();
        assert_eq!(owner, ActionOwner::Entity("AWB RH".to_string()));
    }

    #[test]
    fn update_input_distinguishes_null_assignee_from_missing() {
        let cleared: UpdateActionInput =
            serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let untouched: UpdateActionInput = serde_json::from_str(r#"{"is_done": true}"#).unwrap();
        assert_eq!(untouched.assignee_id, None);
        assert_eq!(untouched.is_done, Some(true));
    }
}
