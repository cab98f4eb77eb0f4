use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, today, ApiResult};
use crate::api::views::ActionsResponse;
use crate::db::Database;
use crate::engine::ActionFilters;
use crate::models::*;

/// Cross-challenge action list with its pickers and badges.
pub async fn list_actions(
    State(db): State<Database>,
    Query(filters): Query<ActionFilters>,
) -> ApiResult<Json<ActionsResponse>> {
    let actions = db.get_all_actions().map_err(internal_error)?;
    let members = db.get_members().map_err(internal_error)?;
    let challenges = db.get_all_challenges().map_err(internal_error)?;

    Ok(Json(ActionsResponse::build(
        &actions,
        &filters,
        members,
        &challenges,
        today(),
    )))
}

pub async fn create_action(
    State(db): State<Database>,
    Path(challenge_id): Path<Uuid>,
    Json(input): Json<CreateActionInput>,
) -> ApiResult<(StatusCode, Json<Action>)> {
    db.create_action(challenge_id, input)
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(internal_error)
}

/// Partial update; `{"is_done": true}` is how an action gets ticked off.
pub async fn update_action(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateActionInput>,
) -> ApiResult<Json<Action>> {
    db.update_action(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Action"))
}

pub async fn delete_action(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_action(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Action"))
    }
}
