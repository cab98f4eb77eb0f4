use chrono::NaiveDate;
use serde::de::{self, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::is_overdue;
use crate::models::ActionWithChallenge;

/// Status selector for the cross-challenge action list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatusFilter {
    All,
    #[default]
    Open,
    Done,
    Overdue,
}

/// Filters for the action list. Empty strings and `None` mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionFilters {
    #[serde(deserialize_with = "empty_as_default")]
    pub status: ActionStatusFilter,
    pub entity: String,
    pub startup: String,
    pub challenge: String,
    #[serde(deserialize_with = "empty_as_none")]
    pub assignee: Option<Uuid>,
    pub search: String,
}

/// Query strings send `status=` when the picker is cleared.
fn empty_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(T::default());
    }
    let value: de::value::StringDeserializer<D::Error> = raw.to_string().into_deserializer();
    T::deserialize(value)
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            Uuid::parse_str(raw.trim()).map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Header badges for the action list, computed on the unfiltered set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub open: usize,
    pub overdue: usize,
}

pub fn count_actions(actions: &[ActionWithChallenge], today: NaiveDate) -> ActionCounts {
    ActionCounts {
        open: actions.iter().filter(|a| !a.action.is_done).count(),
        overdue: actions
            .iter()
            .filter(|a| is_overdue(&a.action, today))
            .count(),
    }
}

fn matches_status(item: &ActionWithChallenge, status: ActionStatusFilter, today: NaiveDate) -> bool {
    match status {
        ActionStatusFilter::All => true,
        ActionStatusFilter::Open => !item.action.is_done,
        ActionStatusFilter::Done => item.action.is_done,
        ActionStatusFilter::Overdue => is_overdue(&item.action, today),
    }
}

fn matches_search(item: &ActionWithChallenge, needle: &str) -> bool {
    needle.is_empty()
        || item.action.title.to_lowercase().contains(needle)
        || item.challenge_name.to_lowercase().contains(needle)
        || item.startup_name.to_lowercase().contains(needle)
}

/// Narrows the action list and orders it by ascending due date.
pub fn filter_actions(
    actions: &[ActionWithChallenge],
    filters: &ActionFilters,
    today: NaiveDate,
) -> Vec<ActionWithChallenge> {
    let needle = filters.search.to_lowercase();

    let mut filtered: Vec<ActionWithChallenge> = actions
        .iter()
        .filter(|a| matches_status(a, filters.status, today))
        .filter(|a| filters.entity.is_empty() || a.challenge_entity == filters.entity)
        .filter(|a| filters.startup.is_empty() || a.startup_name == filters.startup)
        .filter(|a| filters.challenge.is_empty() || a.challenge_name == filters.challenge)
        .filter(|a| {
            filters
                .assignee
                .map_or(true, |id| a.action.assignee_id == Some(id))
        })
        .filter(|a| matches_search(a, &needle))
        .cloned()
        .collect();

    filtered.sort_by_key(|a| a.action.due_date);
    filtered
}
