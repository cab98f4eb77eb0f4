use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, run_blocking, ApiResult};
use crate::api::AuthSession;
use crate::db::Database;
use crate::error::BoardError;
use crate::models::*;

// ============================================================
// Profile
// ============================================================

pub async fn get_profile(Extension(session): Extension<AuthSession>) -> Json<User> {
    Json(session.user)
}

pub async fn update_profile(
    State(db): State<Database>,
    Extension(session): Extension<AuthSession>,
    Json(input): Json<UpdateProfileInput>,
) -> ApiResult<Json<User>> {
    let user_id = session.user.id;
    run_blocking(move || db.update_profile(user_id, input))
        .await
        .map(Json)
}

/// Everyone an action can be assigned to.
pub async fn list_members(State(db): State<Database>) -> ApiResult<Json<Vec<Member>>> {
    db.get_members().map(Json).map_err(internal_error)
}

// ============================================================
// Admin
// ============================================================

pub async fn list_users(State(db): State<Database>) -> ApiResult<Json<Vec<User>>> {
    db.get_users().map(Json).map_err(internal_error)
}

pub async fn create_user(
    State(db): State<Database>,
    Json(input): Json<CreateUserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = run_blocking(move || db.create_user(input)).await?;
    tracing::info!("Created user {}", user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> ApiResult<Json<User>> {
    db.update_user(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("User"))
}

pub async fn delete_user(
    State(db): State<Database>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if session.user.id == id {
        return Err(internal_error(
            BoardError::Validation("You cannot delete your own account".to_string()).into(),
        ));
    }

    if db.delete_user(id).map_err(internal_error)? {
        tracing::info!("Deleted user {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("User"))
    }
}
