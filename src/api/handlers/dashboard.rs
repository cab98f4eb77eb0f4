use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use super::{internal_error, today, ApiResult};
use crate::api::views::{DashboardQuery, DashboardResponse};
use crate::db::Database;

pub async fn dashboard(
    State(db): State<Database>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let challenges = db.get_all_challenges().map_err(internal_error)?;
    let entities = db.get_entities().map_err(internal_error)?;
    let wenov_owners = db.get_wenov_owners().map_err(internal_error)?;

    Ok(Json(DashboardResponse::build(
        &challenges,
        &query.into(),
        entities,
        wenov_owners,
        Utc::now(),
        today(),
    )))
}
