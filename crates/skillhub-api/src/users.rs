use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use skillhub_types::api::{RegisterUserRequest, UpdateUserRequest};

use crate::error::ApiResult;
use crate::service::users;
use crate::state::{AppState, blocking};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = blocking(&state, move |s| users::register(&s.db, req, Utc::now())).await?;
    Ok(Json(profile))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, |s| users::list_users(&s.db)).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| users::get_user(&s.db, &id)).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| users::update_user(&s.db, &id, req)).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| users::delete_user(&s.db, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
