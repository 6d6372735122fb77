use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use skillhub_types::api::{CommentRequest, CountResponse};

use crate::error::ApiResult;
use crate::extract::UserId;
use crate::service::comments;
use crate::state::{AppState, blocking};

pub async fn create_comment(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(req): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let comment =
        blocking(&state, move |s| comments::create_comment(&s.db, &user_id, req, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let comment = blocking(&state, move |s| {
        comments::update_comment(&s.db, &id, &user_id, req, Utc::now())
    })
    .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| comments::delete_comment(&s.db, &id, &user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| comments::get_comment(&s.db, &id)).await?))
}

pub async fn comments_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| comments::comments_for_post(&s.db, &post_id)).await?))
}

pub async fn comments_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| comments::comments_by_user(&s.db, &user_id)).await?))
}

pub async fn count_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = blocking(&state, move |s| comments::count_for_post(&s.db, &post_id)).await?;
    Ok(Json(CountResponse { count }))
}
