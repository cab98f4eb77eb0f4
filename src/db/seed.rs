//! Demo data for local development.

use anyhow::Result;
use chrono::{Days, NaiveDate};

use super::Database;
use crate::models::*;

struct SeedAction {
    title: &'static str,
    owner: &'static str,
    /// Offset from today, in days. Negative is in the past.
    due_in: i64,
    urgent: bool,
    done: bool,
}

struct SeedContact {
    first_name: &'static str,
    last_name: &'static str,
    function: &'static str,
    company: &'static str,
    email: &'static str,
    group: ContactGroup,
}

struct SeedChallenge {
    name: &'static str,
    wenov_responsible: &'static str,
    entity: &'static str,
    startup_name: &'static str,
    contacts: &'static [SeedContact],
    actions: &'static [SeedAction],
    activities: &'static [(ActivityType, &'static str)],
}

const fn action(title: &'static str, owner: &'static str, due_in: i64) -> SeedAction {
    SeedAction {
        title,
        owner,
        due_in,
        urgent: false,
        done: false,
    }
}

const fn urgent(title: &'static str, owner: &'static str, due_in: i64) -> SeedAction {
    SeedAction {
        title,
        owner,
        due_in,
        urgent: true,
        done: false,
    }
}

const fn done(title: &'static str, owner: &'static str, due_in: i64) -> SeedAction {
    SeedAction {
        title,
        owner,
        due_in,
        urgent: false,
        done: true,
    }
}

const SEED: &[SeedChallenge] = &[
    SeedChallenge {
        name: "API Integration Payment Gateway",
        wenov_responsible: "Othmane As Salih",
        entity: "WafaSalaf",
        startup_name: "PayFlow",
        contacts: &[
            SeedContact {
                first_name: "Othmane",
                last_name: "As Salih",
                function: "Project Lead",
                company: "WENOV",
                email: "othmane@wenov.com",
                group: ContactGroup::Wenov,
            },
            SeedContact {
                first_name: "Sarah",
                last_name: "Chen",
                function: "CEO",
                company: "PayFlow",
                email: "sarah@payflow.io",
                group: ContactGroup::Startup,
            },
        ],
        actions: &[
            urgent("Review API documentation", "WafaSalaf", -2),
            action("Setup test environment", "STARTUP", 3),
            action("Security audit planning", "WafaSalaf", 7),
            done("Initial meeting", "WENOV", -10),
        ],
        activities: &[
            (ActivityType::Meeting, "Kickoff meeting with PayFlow team."),
            (ActivityType::Email, "Sent technical requirements document to startup."),
        ],
    },
    SeedChallenge {
        name: "Mobile App Beta Launch",
        wenov_responsible: "Asmaa Ouach",
        entity: "AWB IT",
        startup_name: "AppNova",
        contacts: &[SeedContact {
            first_name: "Tom",
            last_name: "Wilson",
            function: "CTO",
            company: "AppNova",
            email: "tom@appnova.io",
            group: ContactGroup::Startup,
        }],
        actions: &[
            urgent("Beta testing coordination", "STARTUP", 1),
            action("User feedback collection setup", "AWB IT", 5),
        ],
        activities: &[(ActivityType::Note, "Internal review: app performance looks good.")],
    },
    SeedChallenge {
        name: "Data Analytics Dashboard POC",
        wenov_responsible: "Rim Hachidi",
        entity: "AFM",
        startup_name: "DataViz Pro",
        contacts: &[SeedContact {
            first_name: "Karim",
            last_name: "Fassi",
            function: "Analytics Director",
            company: "AFM",
            email: "karim@afm.ma",
            group: ContactGroup::Metier,
        }],
        actions: &[
            action("Data source mapping", "AFM", -5),
            action("Dashboard mockups review", "STARTUP", -1),
            action("Performance benchmarks", "CEED", 10),
        ],
        activities: &[(ActivityType::Email, "Received updated mockups from DataViz Pro.")],
    },
    SeedChallenge {
        name: "Customer Support AI Bot",
        wenov_responsible: "Asmaa Ouach",
        entity: "Wafa Cash",
        startup_name: "BotGenius",
        contacts: &[],
        actions: &[
            urgent("Training data preparation", "Wafa Cash", -3),
            urgent("Bot personality definition", "STARTUP", 0),
            action("Integration with CRM", "STARTUP", 14),
        ],
        activities: &[
            (ActivityType::Meeting, "Workshop on conversation flows and edge cases."),
            (ActivityType::Call, "Follow-up on pilot group selection."),
        ],
    },
    SeedChallenge {
        name: "HR Talent Platform Integration",
        wenov_responsible: "Rim Hachidi",
        entity: "AWB RH",
        startup_name: "TalentMatch AI",
        contacts: &[],
        actions: &[
            action("Job description standardization", "AWB RH", 6),
            done("Contract signature", "WENOV", -4),
        ],
        activities: &[],
    },
];

impl Database {
    /// Replaces every challenge with a small demo board. Due dates are
    /// relative to `today`. Users are left untouched.
    pub fn seed_demo_data(&self, today: NaiveDate) -> Result<usize> {
        {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute("DELETE FROM challenges", [])?;
        }

        for seed in SEED {
            let challenge = self.create_challenge(CreateChallengeInput {
                name: seed.name.to_string(),
                wenov_responsible: Some(seed.wenov_responsible.to_string()),
                entity: Some(seed.entity.to_string()),
                startup_name: Some(seed.startup_name.to_string()),
                status: None,
            })?;

            for contact in seed.contacts {
                self.create_contact(
                    challenge.id,
                    CreateContactInput {
                        first_name: contact.first_name.to_string(),
                        last_name: contact.last_name.to_string(),
                        function: contact.function.to_string(),
                        company: contact.company.to_string(),
                        email: contact.email.to_string(),
                        phone: None,
                        group: contact.group,
                    },
                )?;
            }

            for a in seed.actions {
                let created = self.create_action(
                    challenge.id,
                    CreateActionInput {
                        title: a.title.to_string(),
                        owner: ActionOwner::parse(a.owner),
                        due_date: offset_date(today, a.due_in),
                        is_urgent: a.urgent,
                        assignee_id: None,
                    },
                )?;
                if a.done {
                    self.update_action(
                        created.id,
                        UpdateActionInput {
                            is_done: Some(true),
                            ..Default::default()
                        },
                    )?;
                }
            }

            for (kind, note) in seed.activities {
                self.create_activity(
                    challenge.id,
                    CreateActivityInput {
                        kind: *kind,
                        note: note.to_string(),
                        link: None,
                    },
                )?;
            }
        }

        tracing::info!("Seeded {} demo challenges", SEED.len());
        Ok(SEED.len())
    }
}

fn offset_date(today: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        today.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.unwrap_or(today)
}
