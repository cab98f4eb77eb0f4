use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, today, ApiResult};
use crate::db::Database;
use crate::engine;
use crate::models::*;

/// Every challenge with its children, ranked by urgency.
pub async fn list_challenges(State(db): State<Database>) -> ApiResult<Json<Vec<Challenge>>> {
    let challenges = db.get_all_challenges().map_err(internal_error)?;
    Ok(Json(engine::sort_challenges(&challenges, today())))
}

pub async fn get_challenge(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Challenge>> {
    db.get_challenge(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Challenge"))
}

pub async fn create_challenge(
    State(db): State<Database>,
    Json(input): Json<CreateChallengeInput>,
) -> ApiResult<(StatusCode, Json<Challenge>)> {
    db.create_challenge(input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

pub async fn update_challenge(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateChallengeInput>,
) -> ApiResult<Json<Challenge>> {
    db.update_challenge(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Challenge"))
}

pub async fn delete_challenge(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_challenge(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Challenge"))
    }
}

pub async fn reorder_challenges(
    State(db): State<Database>,
    Json(input): Json<ReorderChallengesInput>,
) -> ApiResult<StatusCode> {
    db.reorder_challenges(&input.ordered_ids)
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Timeline
// ============================================================

pub async fn list_activities(
    State(db): State<Database>,
    Path(challenge_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Activity>>> {
    db.get_activities(challenge_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_activity(
    State(db): State<Database>,
    Path(challenge_id): Path<Uuid>,
    Json(input): Json<CreateActivityInput>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    db.create_activity(challenge_id, input)
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(internal_error)
}
