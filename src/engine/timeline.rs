use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Activity;

/// The most recent timeline entry of a challenge, for dashboard rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastComment {
    pub note: String,
    pub time_ago: String,
}

/// Coarse relative age in whole days: days under a week, weeks under a
/// month, then 30-day months.
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - at).num_days();
    match days {
        d if d <= 0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        d if d < 7 => format!("{d} days ago"),
        d if d < 30 => format!("{} weeks ago", d / 7),
        d => format!("{} months ago", d / 30),
    }
}

pub fn last_comment(activities: &[Activity], now: DateTime<Utc>) -> Option<LastComment> {
    activities
        .iter()
        .max_by_key(|a| a.created_at)
        .map(|latest| LastComment {
            note: latest.note.clone(),
            time_ago: time_ago(latest.created_at, now),
        })
}
