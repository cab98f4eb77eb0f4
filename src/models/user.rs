use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A board member who can sign in.
///
/// The password hash never leaves the persistence layer except through
/// [`UserCredentials`], which is not serialisable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub entity: UserEntity,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// The organisation a board member works for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserEntity {
    #[default]
    Wenov,
    Ceed,
}

impl UserEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wenov => "WENOV",
            Self::Ceed => "CEED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "WENOV" => Some(Self::Wenov),
            "CEED" => Some(Self::Ceed),
            _ => None,
        }
    }
}

/// A user together with their stored password hash. Used only at sign-in.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A user as offered in assignee pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub entity: UserEntity,
}

impl From<User> for Member {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            entity: user.entity,
        }
    }
}

/// Input for creating a user (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub entity: UserEntity,
    #[serde(default)]
    pub is_admin: bool,
}

/// Input for updating a user (admin only). Email and password are not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub entity: Option<UserEntity>,
    pub is_admin: Option<bool>,
}

/// Input for a user editing their own profile.
///
/// A password change needs both `current_password` and `new_password`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Issued on successful sign-in. `token` is sent back as a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}
