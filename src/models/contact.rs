use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person associated with a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Job title or role within their company.
    pub function: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub group: ContactGroup,
}

/// Which side of the engagement a contact belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContactGroup {
    #[serde(rename = "WENOV")]
    Wenov,
    Metier,
    Startup,
    OpenStart,
}

impl ContactGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wenov => "WENOV",
            Self::Metier => "Metier",
            Self::Startup => "Startup",
            Self::OpenStart => "OpenStart",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "WENOV" => Some(Self::Wenov),
            "Metier" => Some(Self::Metier),
            "Startup" => Some(Self::Startup),
            "OpenStart" => Some(Self::OpenStart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContactInput {
    pub first_name: String,
    pub last_name: String,
    pub function: String,
    pub company: String,
    pub email: String,
    /// Defaults to an empty string.
    #[serde(default)]
    pub phone: Option<String>,
    pub group: ContactGroup,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContactInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub function: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub group: Option<ContactGroup>,
}
