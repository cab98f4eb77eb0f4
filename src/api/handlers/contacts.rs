use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, ApiResult};
use crate::db::Database;
use crate::models::*;

pub async fn create_contact(
    State(db): State<Database>,
    Path(challenge_id): Path<Uuid>,
    Json(input): Json<CreateContactInput>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    db.create_contact(challenge_id, input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

pub async fn update_contact(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateContactInput>,
) -> ApiResult<Json<Contact>> {
    db.update_contact(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Contact"))
}

pub async fn delete_contact(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_contact(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Contact"))
    }
}
