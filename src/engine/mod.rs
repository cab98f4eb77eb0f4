//! Challenge filtering and ranking.
//!
//! Everything here is a pure function over immutable snapshots loaded by the
//! persistence layer. Nothing is cached between calls, so handlers re-run the
//! pipeline on every request:
//!
//! 1. [`compute_kpis`] summarises the unfiltered challenge set.
//! 2. [`filter_challenges`] narrows the set by search text, entity, WENOV
//!    owner and a [`Category`], then hands the survivors to
//! 3. [`sort_challenges`], which orders by alert score and nearest open due date.
//!
//! "Today" is always passed in as a calendar date so results are reproducible.

mod actions;
mod timeline;

pub use actions::*;
pub use timeline::*;

use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::models::{Action, ActionOwner, Challenge};

/// Ranking key used for challenges without any open action.
pub const NO_DUE_DATE: NaiveDate = NaiveDate::MAX;

const SCORE_URGENT_AND_OVERDUE: u32 = 100;
const SCORE_URGENT: u32 = 50;
const SCORE_OVERDUE: u32 = 25;

// ============================================================
// Action predicates
// ============================================================

/// An open action whose due date is strictly before `today`.
pub fn is_overdue(action: &Action, today: NaiveDate) -> bool {
    !action.is_done && action.due_date < today
}

/// An open action that is urgent or overdue.
pub fn is_alert(action: &Action, today: NaiveDate) -> bool {
    !action.is_done && (action.is_urgent || is_overdue(action, today))
}

/// Actions that are not done, in input order.
pub fn open_actions(actions: &[Action]) -> Vec<&Action> {
    actions.iter().filter(|a| !a.is_done).collect()
}

/// The first few open actions a reader should look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextActions {
    pub actions: Vec<Action>,
    /// Open actions left out by the limit.
    pub remaining: usize,
}

/// Up to `limit` open actions: alerts first, then by ascending due date.
pub fn next_actions(actions: &[Action], limit: usize, today: NaiveDate) -> NextActions {
    let mut open = open_actions(actions);
    open.sort_by_key(|a| (!is_alert(a, today), a.due_date));

    let remaining = open.len().saturating_sub(limit);
    NextActions {
        actions: open.into_iter().take(limit).cloned().collect(),
        remaining,
    }
}

// ============================================================
// KPIs
// ============================================================

/// Summary tiles for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpis {
    pub challenges_count: usize,
    /// Open actions owned by a named organisation.
    pub actions_entity: usize,
    /// Open actions owned by the startup.
    pub actions_startup: usize,
    /// Open actions that are urgent or overdue.
    pub alerts_count: usize,
}

pub fn compute_kpis(challenges: &[Challenge], today: NaiveDate) -> Kpis {
    let mut kpis = Kpis {
        challenges_count: challenges.len(),
        ..Kpis::default()
    };

    for action in challenges.iter().flat_map(|c| open_actions(&c.actions)) {
        if action.owner.is_entity() {
            kpis.actions_entity += 1;
        }
        if action.owner == ActionOwner::Startup {
            kpis.actions_startup += 1;
        }
        if is_alert(action, today) {
            kpis.alerts_count += 1;
        }
    }

    kpis
}

// ============================================================
// Ranking
// ============================================================

/// Sum over open actions: 100 urgent and overdue, 50 urgent, 25 overdue.
pub fn alert_score(challenge: &Challenge, today: NaiveDate) -> u32 {
    open_actions(&challenge.actions)
        .into_iter()
        .map(|action| match (action.is_urgent, is_overdue(action, today)) {
            (true, true) => SCORE_URGENT_AND_OVERDUE,
            (true, false) => SCORE_URGENT,
            (false, true) => SCORE_OVERDUE,
            (false, false) => 0,
        })
        .sum()
}

/// Earliest due date among open actions, or [`NO_DUE_DATE`] if there are none.
pub fn earliest_open_due_date(challenge: &Challenge) -> NaiveDate {
    open_actions(&challenge.actions)
        .into_iter()
        .map(|a| a.due_date)
        .min()
        .unwrap_or(NO_DUE_DATE)
}

/// Orders challenges by descending alert score, then ascending earliest open
/// due date. Challenges with no open actions sort last.
pub fn sort_challenges(challenges: &[Challenge], today: NaiveDate) -> Vec<Challenge> {
    let mut keyed: Vec<_> = challenges
        .iter()
        .map(|c| {
            let key = (Reverse(alert_score(c, today)), earliest_open_due_date(c));
            (key, c)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    keyed.into_iter().map(|(_, c)| c.clone()).collect()
}

// ============================================================
// Filtering
// ============================================================

/// Quick-filter chips on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    All,
    Overdue,
    Urgent,
    Entity,
    Startup,
    Alerts,
}

impl Category {
    const NAMES: &'static [&'static str] = &["all", "overdue", "urgent", "entity", "startup", "alerts"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Overdue => "overdue",
            Self::Urgent => "urgent",
            Self::Entity => "entity",
            Self::Startup => "startup",
            Self::Alerts => "alerts",
        }
    }

    /// An empty value selects `All`. Older clients call the entity chip `awb`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "" | "all" => Some(Self::All),
            "overdue" => Some(Self::Overdue),
            "urgent" => Some(Self::Urgent),
            "entity" | "awb" => Some(Self::Entity),
            "startup" => Some(Self::Startup),
            "alerts" => Some(Self::Alerts),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).ok_or_else(|| de::Error::unknown_variant(&raw, Self::NAMES))
    }
}

/// Dashboard filter state. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub active_category: Category,
    pub search: String,
    pub entity: String,
    pub wenov_owner: String,
}

fn matches_category(challenge: &Challenge, category: Category, today: NaiveDate) -> bool {
    let mut open = open_actions(&challenge.actions).into_iter();
    match category {
        Category::All => true,
        Category::Overdue => open.any(|a| is_overdue(a, today)),
        Category::Urgent => open.any(|a| a.is_urgent),
        Category::Entity => open.any(|a| a.owner.is_entity()),
        Category::Startup => open.any(|a| a.owner == ActionOwner::Startup),
        Category::Alerts => open.any(|a| is_alert(a, today)),
    }
}

/// Applies every active filter (logical AND) and returns the survivors ranked
/// by [`sort_challenges`].
pub fn filter_challenges(
    challenges: &[Challenge],
    filters: &Filters,
    today: NaiveDate,
) -> Vec<Challenge> {
    let search = filters.search.to_lowercase();

    let filtered: Vec<Challenge> = challenges
        .iter()
        .filter(|c| {
            search.is_empty()
                || c.name.to_lowercase().contains(&search)
                || c.startup_name.to_lowercase().contains(&search)
        })
        .filter(|c| filters.entity.is_empty() || c.entity == filters.entity)
        .filter(|c| filters.wenov_owner.is_empty() || c.wenov_responsible == filters.wenov_owner)
        .filter(|c| matches_category(c, filters.active_category, today))
        .cloned()
        .collect();

    sort_challenges(&filtered, today)
}
