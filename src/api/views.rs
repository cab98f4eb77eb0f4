//! Response bodies that combine stored records with engine output.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{self, ActionCounts, ActionFilters, Category, Filters, Kpis, LastComment, NextActions};
use crate::models::{ActionWithChallenge, Challenge, ChallengeStatus, Member};

/// Open actions shown inline on each dashboard row.
pub const DASHBOARD_NEXT_ACTIONS: usize = 2;

/// One ranked row on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRow {
    pub id: Uuid,
    pub name: String,
    pub wenov_responsible: String,
    pub entity: String,
    pub startup_name: String,
    pub status: ChallengeStatus,
    pub alert_score: u32,
    pub open_actions: usize,
    pub next_actions: NextActions,
    pub last_comment: Option<LastComment>,
}

impl ChallengeRow {
    pub fn new(challenge: &Challenge, today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: challenge.id,
            name: challenge.name.clone(),
            wenov_responsible: challenge.wenov_responsible.clone(),
            entity: challenge.entity.clone(),
            startup_name: challenge.startup_name.clone(),
            status: challenge.status,
            alert_score: engine::alert_score(challenge, today),
            open_actions: engine::open_actions(&challenge.actions).len(),
            next_actions: engine::next_actions(&challenge.actions, DASHBOARD_NEXT_ACTIONS, today),
            last_comment: engine::last_comment(&challenge.activities, now),
        }
    }
}

/// Dashboard query string. Older clients send `category` instead of
/// `active_category`; when both are present `active_category` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    pub active_category: Option<Category>,
    pub category: Option<Category>,
    pub search: String,
    pub entity: String,
    pub wenov_owner: String,
}

impl From<DashboardQuery> for Filters {
    fn from(query: DashboardQuery) -> Self {
        Self {
            active_category: query.active_category.or(query.category).unwrap_or_default(),
            search: query.search,
            entity: query.entity,
            wenov_owner: query.wenov_owner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardResponse {
    /// Computed over every challenge, before filtering.
    pub kpis: Kpis,
    pub challenges: Vec<ChallengeRow>,
    pub entities: Vec<String>,
    pub wenov_owners: Vec<String>,
}

impl DashboardResponse {
    pub fn build(
        challenges: &[Challenge],
        filters: &Filters,
        entities: Vec<String>,
        wenov_owners: Vec<String>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Self {
        let kpis = engine::compute_kpis(challenges, today);
        let rows = engine::filter_challenges(challenges, filters, today)
            .iter()
            .map(|c| ChallengeRow::new(c, today, now))
            .collect();

        Self {
            kpis,
            challenges: rows,
            entities,
            wenov_owners,
        }
    }
}

/// A challenge as offered in the action-list challenge picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeOption {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsResponse {
    pub actions: Vec<ActionWithChallenge>,
    /// Computed over every action, before filtering.
    pub counts: ActionCounts,
    pub members: Vec<Member>,
    pub entities: Vec<String>,
    pub startups: Vec<String>,
    pub challenges: Vec<ChallengeOption>,
}

impl ActionsResponse {
    pub fn build(
        all_actions: &[ActionWithChallenge],
        filters: &ActionFilters,
        members: Vec<Member>,
        challenges: &[Challenge],
        today: NaiveDate,
    ) -> Self {
        let mut entities: Vec<String> = challenges
            .iter()
            .map(|c| c.entity.clone())
            .filter(|e| !e.is_empty())
            .collect();
        entities.sort();
        entities.dedup();

        let mut startups: Vec<String> = challenges
            .iter()
            .map(|c| c.startup_name.clone())
            .filter(|s| !s.is_empty())
            .collect();
        startups.sort();
        startups.dedup();

        let mut options: Vec<ChallengeOption> = challenges
            .iter()
            .map(|c| ChallengeOption {
                id: c.id,
                name: c.name.clone(),
            })
            .collect();
        options.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            actions: engine::filter_actions(all_actions, filters, today),
            counts: engine::count_actions(all_actions, today),
            members,
            entities,
            startups,
            challenges: options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, ActionOwner};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn challenge(name: &str, entity: &str, actions: Vec<(bool, &str)>) -> Challenge {
        let id = Uuid::new_v4();
        Challenge {
            id,
            name: name.to_string(),
            wenov_responsible: "Rim".to_string(),
            entity: entity.to_string(),
            startup_name: format!("{name} Startup"),
            status: ChallengeStatus::Ongoing,
            sort_order: 0,
            actions: actions
                .into_iter()
                .map(|(urgent, due)| Action {
                    id: Uuid::new_v4(),
                    challenge_id: id,
                    title: "Do it".to_string(),
                    owner: ActionOwner::Startup,
                    due_date: date(due),
                    is_done: false,
                    is_urgent: urgent,
                    assignee_id: None,
                    assignee_name: None,
                })
                .collect(),
            activities: Vec::new(),
            contacts: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn dashboard_ranks_rows_and_keeps_unfiltered_kpis() {
        let today = date("2024-06-10");
        let challenges = vec![
            challenge("Calm", "AFM", vec![(false, "2024-06-20")]),
            challenge("Hot", "AWB", vec![(true, "2024-06-01"), (false, "2024-06-11"), (false, "2024-06-12")]),
        ];

        let response = DashboardResponse::build(
            &challenges,
            &Filters {
                entity: "AWB".to_string(),
                ..Filters::default()
            },
            vec!["AFM".to_string(), "AWB".to_string()],
            Vec::new(),
            Utc::now(),
            today,
        );

        assert_eq!(response.kpis.challenges_count, 2);
        assert_eq!(response.challenges.len(), 1);

        let row = &response.challenges[0];
        assert_eq!(row.name, "Hot");
        assert_eq!(row.alert_score, 100);
        assert_eq!(row.open_actions, 3);
        assert_eq!(row.next_actions.actions.len(), DASHBOARD_NEXT_ACTIONS);
        assert_eq!(row.next_actions.remaining, 1);
        assert!(row.last_comment.is_none());
    }

    #[test]
    fn actions_response_lists_distinct_pickers() {
        let challenges = vec![
            challenge("Beta", "AFM", vec![]),
            challenge("Alpha", "AFM", vec![]),
            challenge("Gamma", "", vec![]),
        ];

        let response = ActionsResponse::build(
            &[],
            &ActionFilters::default(),
            Vec::new(),
            &challenges,
            date("2024-06-10"),
        );

        assert_eq!(response.entities, vec!["AFM"]);
        assert_eq!(response.startups.len(), 3);
        let names: Vec<_> = response.challenges.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn dashboard_query_prefers_active_category() {
        let both: DashboardQuery =
            serde_json::from_str(r#"{"category": "urgent", "active_category": "alerts"}"#).unwrap();
        assert_eq!(Filters::from(both).active_category, Category::Alerts);

        let legacy: DashboardQuery = serde_json::from_str(r#"{"category": "awb"}"#).unwrap();
        assert_eq!(Filters::from(legacy).active_category, Category::Entity);

        let blank: DashboardQuery = serde_json::from_str(r#"{"category": "", "search": ""}"#).unwrap();
        assert_eq!(Filters::from(blank), Filters::default());
    }
}
