mod schema;
mod seed;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::auth;
use crate::error::BoardError;
use crate::models::*;

const CHALLENGE_COLUMNS: &str =
    "id, name, wenov_responsible, entity, startup_name, status, sort_order, created_at, updated_at";

const ACTION_COLUMNS: &str =
    "a.id, a.challenge_id, a.title, a.owner, a.due_date, a.is_done, a.is_urgent, a.assignee_id, u.name";

const ACTIVITY_COLUMNS: &str = "id, challenge_id, type, note, link, created_at";

const CONTACT_COLUMNS: &str =
    "id, challenge_id, first_name, last_name, function, company, email, phone, contact_group";

const USER_COLUMNS: &str = "id, email, name, entity, is_admin, created_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Challenge operations
    // ============================================================

    /// All challenges with their actions, activities and contacts, in stored
    /// order (manual `sort_order`, then newest first).
    pub fn get_all_challenges(&self) -> Result<Vec<Challenge>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges
             ORDER BY sort_order, created_at DESC, rowid DESC"
        ))?;
        let mut challenges = stmt
            .query_map([], challenge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut actions = group_by_challenge(load_actions(&conn, None)?, |a| a.challenge_id);
        let mut activities =
            group_by_challenge(load_activities(&conn, None)?, |a| a.challenge_id);
        let mut contacts = group_by_challenge(load_contacts(&conn, None)?, |c| c.challenge_id);

        for challenge in &mut challenges {
            challenge.actions = actions.remove(&challenge.id).unwrap_or_default();
            challenge.activities = activities.remove(&challenge.id).unwrap_or_default();
            challenge.contacts = contacts.remove(&challenge.id).unwrap_or_default();
        }

        Ok(challenges)
    }

    pub fn get_challenge(&self, id: Uuid) -> Result<Option<Challenge>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let challenge = conn
            .query_row(
                &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?"),
                [id.to_string()],
                challenge_from_row,
            )
            .optional()?;

        let Some(mut challenge) = challenge else {
            return Ok(None);
        };

        challenge.actions = load_actions(&conn, Some(id))?;
        challenge.activities = load_activities(&conn, Some(id))?;
        challenge.contacts = load_contacts(&conn, Some(id))?;

        Ok(Some(challenge))
    }

    pub fn create_challenge(&self, input: CreateChallengeInput) -> Result<Challenge> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(BoardError::Validation("Challenge name is required".to_string()).into());
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        let wenov_responsible = input.wenov_responsible.unwrap_or_default();
        let entity = input.entity.unwrap_or_default();
        let startup_name = input.startup_name.unwrap_or_default();

        conn.execute(
            "INSERT INTO challenges (id, name, wenov_responsible, entity, startup_name, status, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
            (
                id.to_string(),
                &name,
                &wenov_responsible,
                &entity,
                &startup_name,
                status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Challenge {
            id,
            name,
            wenov_responsible,
            entity,
            startup_name,
            status,
            sort_order: 0,
            actions: Vec::new(),
            activities: Vec::new(),
            contacts: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_challenge(
        &self,
        id: Uuid,
        input: UpdateChallengeInput,
    ) -> Result<Option<Challenge>> {
        let Some(existing) = self.get_challenge(id)? else {
            return Ok(None);
        };

        let name = match input.name {
            Some(name) if name.trim().is_empty() => {
                return Err(
                    BoardError::Validation("Challenge name is required".to_string()).into(),
                );
            }
            Some(name) => name.trim().to_string(),
            None => existing.name,
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let wenov_responsible = input
            .wenov_responsible
            .unwrap_or(existing.wenov_responsible);
        let entity = input.entity.unwrap_or(existing.entity);
        let startup_name = input.startup_name.unwrap_or(existing.startup_name);
        let status = input.status.unwrap_or(existing.status);

        conn.execute(
            "UPDATE challenges SET name = ?, wenov_responsible = ?, entity = ?, startup_name = ?, status = ?, updated_at = ?
             WHERE id = ?",
            (
                &name,
                &wenov_responsible,
                &entity,
                &startup_name,
                status.as_str(),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(Challenge {
            id,
            name,
            wenov_responsible,
            entity,
            startup_name,
            status,
            updated_at: now,
            ..existing
        }))
    }

    /// Deletes a challenge; its actions, activities and contacts go with it.
    pub fn delete_challenge(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM challenges WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Sets each challenge's `sort_order` to its position in `ordered_ids`.
    /// Unknown ids are ignored.
    pub fn reorder_challenges(&self, ordered_ids: &[Uuid]) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE challenges SET sort_order = ? WHERE id = ?")?;
            for (position, id) in ordered_ids.iter().enumerate() {
                stmt.execute((position as i64, id.to_string()))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Distinct non-empty challenge entities, sorted.
    pub fn get_entities(&self) -> Result<Vec<String>> {
        self.distinct_challenge_column("entity")
    }

    /// Distinct non-empty WENOV responsibles, sorted.
    pub fn get_wenov_owners(&self) -> Result<Vec<String>> {
        self.distinct_challenge_column("wenov_responsible")
    }

    fn distinct_challenge_column(&self, column: &'static str) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {column} FROM challenges WHERE {column} != '' ORDER BY {column}"
        ))?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }

    // ============================================================
    // Action operations
    // ============================================================

    pub fn get_action(&self, id: Uuid) -> Result<Option<Action>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let action = conn
            .query_row(
                &format!(
                    "SELECT {ACTION_COLUMNS} FROM actions a
                     LEFT JOIN users u ON u.id = a.assignee_id
                     WHERE a.id = ?"
                ),
                [id.to_string()],
                action_from_row,
            )
            .optional()?;
        Ok(action)
    }

    pub fn create_action(&self, challenge_id: Uuid, input: CreateActionInput) -> Result<Action> {
        if input.title.trim().is_empty() {
            return Err(BoardError::Validation("Action title is required".to_string()).into());
        }
        if !self.challenge_exists(challenge_id)? {
            return Err(BoardError::NotFound("Challenge").into());
        }
        if let Some(assignee_id) = input.assignee_id {
            self.require_user(assignee_id)?;
        }

        let id = Uuid::new_v4();
        {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute(
                "INSERT INTO actions (id, challenge_id, title, owner, due_date, is_done, is_urgent, assignee_id, created_at)
                 VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)",
                (
                    id.to_string(),
                    challenge_id.to_string(),
                    input.title.trim(),
                    input.owner.as_str(),
                    input.due_date.format(DATE_FORMAT).to_string(),
                    input.is_urgent,
                    input.assignee_id.map(|u| u.to_string()),
                    Utc::now().to_rfc3339(),
                ),
            )?;
        }

        self.get_action(id)?
            .ok_or_else(|| anyhow::anyhow!("Action vanished after insert"))
    }

    pub fn update_action(&self, id: Uuid, input: UpdateActionInput) -> Result<Option<Action>> {
        let Some(existing) = self.get_action(id)? else {
            return Ok(None);
        };

        let title = match input.title {
            Some(title) if title.trim().is_empty() => {
                return Err(BoardError::Validation("Action title is required".to_string()).into());
            }
            Some(title) => title.trim().to_string(),
            None => existing.title,
        };
        let assignee_id = match input.assignee_id {
            Some(Some(user_id)) => {
                self.require_user(user_id)?;
                Some(user_id)
            }
            Some(None) => None,
            None => existing.assignee_id,
        };
        let owner = input.owner.unwrap_or(existing.owner);
        let due_date = input.due_date.unwrap_or(existing.due_date);
        let is_done = input.is_done.unwrap_or(existing.is_done);
        let is_urgent = input.is_urgent.unwrap_or(existing.is_urgent);

        {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute(
                "UPDATE actions SET title = ?, owner = ?, due_date = ?, is_done = ?, is_urgent = ?, assignee_id = ?
                 WHERE id = ?",
                (
                    &title,
                    owner.as_str(),
                    due_date.format(DATE_FORMAT).to_string(),
                    is_done,
                    is_urgent,
                    assignee_id.map(|u| u.to_string()),
                    id.to_string(),
                ),
            )?;
        }

        self.get_action(id)
    }

    pub fn delete_action(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM actions WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Every action across all challenges, with challenge context.
    pub fn get_all_actions(&self) -> Result<Vec<ActionWithChallenge>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACTION_COLUMNS}, c.name, c.entity, c.startup_name
             FROM actions a
             JOIN challenges c ON c.id = a.challenge_id
             LEFT JOIN users u ON u.id = a.assignee_id
             ORDER BY a.due_date, a.rowid"
        ))?;

        let actions = stmt
            .query_map([], |row| {
                Ok(ActionWithChallenge {
                    action: action_from_row(row)?,
                    challenge_name: row.get(9)?,
                    challenge_entity: row.get(10)?,
                    startup_name: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(actions)
    }

    // ============================================================
    // Activity operations
    // ============================================================

    pub fn create_activity(
        &self,
        challenge_id: Uuid,
        input: CreateActivityInput,
    ) -> Result<Activity> {
        if input.note.trim().is_empty() {
            return Err(BoardError::Validation("Activity note is required".to_string()).into());
        }
        if !self.challenge_exists(challenge_id)? {
            return Err(BoardError::NotFound("Challenge").into());
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let link = input.link.filter(|l| !l.trim().is_empty());

        conn.execute(
            "INSERT INTO activities (id, challenge_id, type, note, link, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                challenge_id.to_string(),
                input.kind.as_str(),
                &input.note,
                &link,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Activity {
            id,
            challenge_id,
            kind: input.kind,
            note: input.note,
            link,
            created_at: now,
        })
    }

    /// Activities of a challenge, newest first.
    pub fn get_activities(&self, challenge_id: Uuid) -> Result<Vec<Activity>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        Ok(load_activities(&conn, Some(challenge_id))?)
    }

    // ============================================================
    // Contact operations
    // ============================================================

    pub fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let contact = conn
            .query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"),
                [id.to_string()],
                contact_from_row,
            )
            .optional()?;
        Ok(contact)
    }

    pub fn create_contact(&self, challenge_id: Uuid, input: CreateContactInput) -> Result<Contact> {
        if input.first_name.trim().is_empty() && input.last_name.trim().is_empty() {
            return Err(BoardError::Validation("Contact name is required".to_string()).into());
        }
        if !self.challenge_exists(challenge_id)? {
            return Err(BoardError::NotFound("Challenge").into());
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let phone = input.phone.unwrap_or_default();

        conn.execute(
            "INSERT INTO contacts (id, challenge_id, first_name, last_name, function, company, email, phone, contact_group, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                challenge_id.to_string(),
                &input.first_name,
                &input.last_name,
                &input.function,
                &input.company,
                &input.email,
                &phone,
                input.group.as_str(),
                Utc::now().to_rfc3339(),
            ),
        )?;

        Ok(Contact {
            id,
            challenge_id,
            first_name: input.first_name,
            last_name: input.last_name,
            function: input.function,
            company: input.company,
            email: input.email,
            phone,
            group: input.group,
        })
    }

    pub fn update_contact(&self, id: Uuid, input: UpdateContactInput) -> Result<Option<Contact>> {
        let Some(existing) = self.get_contact(id)? else {
            return Ok(None);
        };

        let contact = Contact {
            id,
            challenge_id: existing.challenge_id,
            first_name: input.first_name.unwrap_or(existing.first_name),
            last_name: input.last_name.unwrap_or(existing.last_name),
            function: input.function.unwrap_or(existing.function),
            company: input.company.unwrap_or(existing.company),
            email: input.email.unwrap_or(existing.email),
            phone: input.phone.unwrap_or(existing.phone),
            group: input.group.unwrap_or(existing.group),
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE contacts SET first_name = ?, last_name = ?, function = ?, company = ?, email = ?, phone = ?, contact_group = ?
             WHERE id = ?",
            (
                &contact.first_name,
                &contact.last_name,
                &contact.function,
                &contact.company,
                &contact.email,
                &contact.phone,
                contact.group.as_str(),
                id.to_string(),
            ),
        )?;

        Ok(Some(contact))
    }

    pub fn delete_contact(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM contacts WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // User operations
    // ============================================================

    /// All users, newest first.
    pub fn get_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Users offered as action assignees, by name.
    pub fn get_members(&self) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self.get_users()?.into_iter().map(Into::into).collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                [id.to_string()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let credentials = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"),
                [email.trim()],
                |row| {
                    Ok(UserCredentials {
                        user: user_from_row(row)?,
                        password_hash: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    fn get_password_hash(&self, id: Uuid) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let hash = conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Creates a user. Emails are unique; a duplicate is a [`BoardError::Conflict`].
    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let email = input.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(BoardError::Validation("A valid email is required".to_string()).into());
        }
        if input.password.is_empty() {
            return Err(BoardError::Validation("Password is required".to_string()).into());
        }
        if self.get_user_credentials_by_email(&email)?.is_some() {
            return Err(
                BoardError::Conflict("A user with this email already exists".to_string()).into(),
            );
        }

        let password_hash = auth::hash_password(&input.password)?;

        let user = User {
            id: Uuid::new_v4(),
            email,
            name: input.name,
            entity: input.entity,
            is_admin: input.is_admin,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        insert_user(&conn, &user, &password_hash)?;
        Ok(user)
    }

    pub fn update_user(&self, id: Uuid, input: UpdateUserInput) -> Result<Option<User>> {
        let Some(existing) = self.get_user(id)? else {
            return Ok(None);
        };

        let user = User {
            name: input.name.unwrap_or(existing.name),
            entity: input.entity.unwrap_or(existing.entity),
            is_admin: input.is_admin.unwrap_or(existing.is_admin),
            ..existing
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE users SET name = ?, entity = ?, is_admin = ? WHERE id = ?",
            (&user.name, user.entity.as_str(), user.is_admin, id.to_string()),
        )?;

        Ok(Some(user))
    }

    /// Deletes a user. Their sessions are removed and their actions unassigned.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM users WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn set_user_password(&self, id: Uuid, password: &str) -> Result<bool> {
        if password.is_empty() {
            return Err(BoardError::Validation("Password is required".to_string()).into());
        }
        let password_hash = auth::hash_password(password)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            (&password_hash, id.to_string()),
        )?;
        Ok(rows > 0)
    }

    /// Self-service profile edit. A password change must present the current
    /// password; a blank name is ignored.
    pub fn update_profile(&self, user_id: Uuid, input: UpdateProfileInput) -> Result<User> {
        let user = self
            .get_user(user_id)?
            .ok_or(BoardError::NotFound("User"))?;

        if let (Some(current), Some(new)) = (&input.current_password, &input.new_password) {
            let hash = self
                .get_password_hash(user_id)?
                .ok_or(BoardError::NotFound("User"))?;
            if !auth::verify_password(current, &hash)? {
                return Err(
                    BoardError::Validation("Current password is incorrect".to_string()).into(),
                );
            }
            self.set_user_password(user_id, new)?;
        }

        match input.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => Ok(self
                .update_user(
                    user_id,
                    UpdateUserInput {
                        name: Some(name.trim().to_string()),
                        ..Default::default()
                    },
                )?
                .unwrap_or(user)),
            None => Ok(user),
        }
    }

    /// Creates an admin, or resets an existing account with that email to
    /// admin with the given name and password.
    pub fn upsert_admin(&self, email: &str, name: &str, password: &str) -> Result<User> {
        match self.get_user_credentials_by_email(email)? {
            Some(existing) => {
                self.set_user_password(existing.user.id, password)?;
                self.update_user(
                    existing.user.id,
                    UpdateUserInput {
                        name: Some(name.to_string()),
                        entity: None,
                        is_admin: Some(true),
                    },
                )?
                .ok_or_else(|| anyhow::anyhow!("User vanished during update"))
            }
            None => self.create_user(CreateUserInput {
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                entity: UserEntity::Wenov,
                is_admin: true,
            }),
        }
    }

    // ============================================================
    // Sign-in sessions
    // ============================================================

    /// Checks credentials and opens a session valid for `ttl`.
    pub fn login(&self, input: &LoginInput, ttl: chrono::Duration) -> Result<LoginResponse> {
        let credentials = self
            .get_user_credentials_by_email(&input.email)?
            .ok_or(BoardError::InvalidCredentials)?;

        if !auth::verify_password(&input.password, &credentials.password_hash)? {
            return Err(BoardError::InvalidCredentials.into());
        }

        let (token, expires_at) = self.create_auth_session(credentials.user.id, ttl)?;
        Ok(LoginResponse {
            token,
            expires_at,
            user: credentials.user,
        })
    }

    pub fn create_auth_session(
        &self,
        user_id: Uuid,
        ttl: chrono::Duration,
    ) -> Result<(String, DateTime<Utc>)> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let token = auth::generate_token();
        let now = Utc::now();
        let expires_at = now + ttl;

        conn.execute(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
            (
                &token,
                user_id.to_string(),
                now.to_rfc3339(),
                expires_at.timestamp(),
            ),
        )?;

        Ok((token, expires_at))
    }

    /// Resolves a bearer token to its user. Expired sessions are pruned.
    pub fn get_session_user(&self, token: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now().timestamp();

        conn.execute("DELETE FROM auth_sessions WHERE expires_at <= ?", [now])?;

        let user = conn
            .query_row(
                "SELECT u.id, u.email, u.name, u.entity, u.is_admin, u.created_at
                 FROM auth_sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?",
                [token],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn delete_auth_session(&self, token: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM auth_sessions WHERE token = ?", [token])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Helpers
    // ============================================================

    fn challenge_exists(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM challenges WHERE id = ?",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn require_user(&self, id: Uuid) -> Result<()> {
        if self.get_user(id)?.is_none() {
            return Err(BoardError::Validation(format!("Unknown assignee: {id}")).into());
        }
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

// ============================================================
// Row mapping
// ============================================================

fn load_actions(conn: &Connection, challenge_id: Option<Uuid>) -> rusqlite::Result<Vec<Action>> {
    let base = format!(
        "SELECT {ACTION_COLUMNS} FROM actions a LEFT JOIN users u ON u.id = a.assignee_id"
    );
    match challenge_id {
        Some(id) => {
            let mut stmt = conn.prepare(&format!(
                "{base} WHERE a.challenge_id = ? ORDER BY a.due_date, a.rowid"
            ))?;
            let actions: rusqlite::Result<Vec<Action>> = stmt
                .query_map([id.to_string()], action_from_row)?
                .collect();
            actions
        }
        None => {
            let mut stmt = conn.prepare(&format!("{base} ORDER BY a.due_date, a.rowid"))?;
            let actions: rusqlite::Result<Vec<Action>> =
                stmt.query_map([], action_from_row)?.collect();
            actions
        }
    }
}

fn load_activities(
    conn: &Connection,
    challenge_id: Option<Uuid>,
) -> rusqlite::Result<Vec<Activity>> {
    match challenge_id {
        Some(id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE challenge_id = ?
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let activities: rusqlite::Result<Vec<Activity>> = stmt
                .query_map([id.to_string()], activity_from_row)?
                .collect();
            activities
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY created_at DESC, rowid DESC"
            ))?;
            let activities: rusqlite::Result<Vec<Activity>> =
                stmt.query_map([], activity_from_row)?.collect();
            activities
        }
    }
}

fn load_contacts(conn: &Connection, challenge_id: Option<Uuid>) -> rusqlite::Result<Vec<Contact>> {
    match challenge_id {
        Some(id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts WHERE challenge_id = ? ORDER BY rowid"
            ))?;
            let contacts: rusqlite::Result<Vec<Contact>> = stmt
                .query_map([id.to_string()], contact_from_row)?
                .collect();
            contacts
        }
        None => {
            let mut stmt =
                conn.prepare(&format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY rowid"))?;
            let contacts: rusqlite::Result<Vec<Contact>> =
                stmt.query_map([], contact_from_row)?.collect();
            contacts
        }
    }
}

fn group_by_challenge<T>(items: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

fn challenge_from_row(row: &Row) -> rusqlite::Result<Challenge> {
    Ok(Challenge {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        wenov_responsible: row.get(2)?,
        entity: row.get(3)?,
        startup_name: row.get(4)?,
        status: ChallengeStatus::from_str(&row.get::<_, String>(5)?).unwrap_or_default(),
        sort_order: row.get(6)?,
        actions: Vec::new(),
        activities: Vec::new(),
        contacts: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn action_from_row(row: &Row) -> rusqlite::Result<Action> {
    Ok(Action {
        id: parse_uuid(row.get::<_, String>(0)?),
        challenge_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        owner: ActionOwner::from(row.get::<_, String>(3)?),
        due_date: parse_date(4, row.get::<_, String>(4)?)?,
        is_done: row.get(5)?,
        is_urgent: row.get(6)?,
        assignee_id: row.get::<_, Option<String>>(7)?.map(parse_uuid),
        assignee_name: row.get(8)?,
    })
}

fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: parse_uuid(row.get::<_, String>(0)?),
        challenge_id: parse_uuid(row.get::<_, String>(1)?),
        kind: ActivityType::from_str(&row.get::<_, String>(2)?).unwrap_or(ActivityType::Note),
        note: row.get(3)?,
        link: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn contact_from_row(row: &Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: parse_uuid(row.get::<_, String>(0)?),
        challenge_id: parse_uuid(row.get::<_, String>(1)?),
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        function: row.get(4)?,
        company: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
        group: ContactGroup::from_str(&row.get::<_, String>(8)?).unwrap_or(ContactGroup::Startup),
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(row.get::<_, String>(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        entity: UserEntity::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        is_admin: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Unlike ids and timestamps, a malformed due date is a read error.
fn parse_date(column: usize, s: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Inserts a user row. Another request may have taken the email since the
/// caller's lookup; the UNIQUE index then reports a conflict.
fn insert_user(conn: &Connection, user: &User, password_hash: &str) -> Result<()> {
    let inserted = conn.execute(
        "INSERT INTO users (id, email, password_hash, name, entity, is_admin, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            user.id.to_string(),
            &user.email,
            password_hash,
            &user.name,
            user.entity.as_str(),
            user.is_admin,
            user.created_at.to_rfc3339(),
        ),
    );

    match inserted {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(BoardError::Conflict("A user with this email already exists".to_string()).into())
        }
        Err(e) => Err(e.into()),
    }
}
