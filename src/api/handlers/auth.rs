use axum::{extract::State, http::StatusCode, Extension, Json};

use super::{internal_error, run_blocking, ApiResult};
use crate::api::AuthSession;
use crate::config::Config;
use crate::db::Database;
use crate::models::{LoginInput, LoginResponse};

pub async fn login(
    State(db): State<Database>,
    State(config): State<Config>,
    Json(input): Json<LoginInput>,
) -> ApiResult<Json<LoginResponse>> {
    let response = run_blocking(move || db.login(&input, config.session_ttl)).await?;
    tracing::info!("User {} signed in", response.user.email);
    Ok(Json(response))
}

pub async fn logout(
    State(db): State<Database>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    db.delete_auth_session(&session.token)
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}
