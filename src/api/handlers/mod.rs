mod actions;
mod auth;
mod challenges;
mod contacts;
mod dashboard;
mod users;

pub use actions::*;
pub use auth::*;
pub use challenges::*;
pub use contacts::*;
pub use dashboard::*;
pub use users::*;

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;

use crate::error::BoardError;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Maps domain errors to their status and message. Anything else is logged
/// and returned as a generic 500 so internals never reach the client.
fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(err) = e.downcast_ref::<BoardError>() {
        let status = match err {
            BoardError::NotFound(_) => StatusCode::NOT_FOUND,
            BoardError::Conflict(_) => StatusCode::CONFLICT,
            BoardError::Validation(_) => StatusCode::BAD_REQUEST,
            BoardError::InvalidCredentials | BoardError::Unauthorized => StatusCode::UNAUTHORIZED,
            BoardError::Forbidden => StatusCode::FORBIDDEN,
        };
        tracing::warn!("Request rejected: {}", err);
        return (status, err.to_string());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(what: &'static str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, BoardError::NotFound(what).to_string())
}

/// Runs password hashing and other CPU-bound store calls on the blocking pool
/// so Argon2 never stalls an async worker.
async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| internal_error(e.into()))?
        .map_err(internal_error)
}

/// Local calendar date used for every overdue check.
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
