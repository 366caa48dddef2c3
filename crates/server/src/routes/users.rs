//! Admin-only user management. Responses never carry hashes or salts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use service::auth::domain::{NewUserInput, UpdateUserInput, UserView};

use super::auth::ServerState;
use crate::errors::ApiError;

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.auth.get_all_users().await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    WithRejection(Json(input), _): WithRejection<Json<NewUserInput>, ApiError>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let user = state.auth.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateUserInput>, ApiError>,
) -> Result<Json<UserView>, ApiError> {
    let user = state.auth.update_user(id, input).await?;
    Ok(Json(UserView::from(&user)))
}

pub async fn remove(State(state): State<ServerState>, Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    state.auth.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
