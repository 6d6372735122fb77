use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use skillhub_types::api::CountResponse;

use crate::error::ApiResult;
use crate::service::relationships;
use crate::state::{AppState, blocking};

pub async fn follow(
    State(state): State<AppState>,
    Path((follower_id, following_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let rel = blocking(&state, move |s| {
        relationships::follow(&s.db, &follower_id, &following_id, Utc::now())
    })
    .await?;
    Ok(Json(rel))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path((follower_id, following_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| relationships::unfollow(&s.db, &follower_id, &following_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| relationships::following(&s.db, &user_id)).await?))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| relationships::followers(&s.db, &user_id)).await?))
}

/// Bare `true`/`false` body.
pub async fn is_following(
    State(state): State<AppState>,
    Path((follower_id, following_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let yes = blocking(&state, move |s| {
        relationships::is_following(&s.db, &follower_id, &following_id)
    })
    .await?;
    Ok(Json(yes))
}

pub async fn following_count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = blocking(&state, move |s| relationships::following_count(&s.db, &user_id)).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn followers_count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = blocking(&state, move |s| relationships::followers_count(&s.db, &user_id)).await?;
    Ok(Json(CountResponse { count }))
}
