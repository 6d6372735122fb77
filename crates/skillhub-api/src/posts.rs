use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use skillhub_types::api::CreateUpdatePostRequest;

use crate::error::ApiResult;
use crate::service::posts;
use crate::state::{AppState, blocking};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorQuery {
    pub user_id: String,
}

pub async fn create_post(
    State(state): State<AppState>,
    Query(q): Query<AuthorQuery>,
    Json(req): Json<CreateUpdatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let post = blocking(&state, move |s| posts::create_post(&s.db, &q.user_id, req, Utc::now())).await?;
    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(req): Json<CreateUpdatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| posts::update_post(&s.db, &post_id, req)).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| posts::delete_post(&s.db, &post_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| posts::get_post(&s.db, &post_id)).await?))
}

pub async fn list_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, |s| posts::list_posts(&s.db)).await?))
}

pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| posts::list_user_posts(&s.db, &user_id)).await?))
}
