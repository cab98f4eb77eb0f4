use thiserror::Error;

/// Domain failures that callers are allowed to see.
///
/// These travel inside `anyhow::Error`; the API layer downcasts them to pick a
/// status code. Anything else is treated as an internal error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Admin access required")]
    Forbidden,
}
