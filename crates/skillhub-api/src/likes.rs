use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use skillhub_types::api::{CountResponse, LikeRequest, LikedResponse};

use crate::error::ApiResult;
use crate::extract::{MaybeUserId, UserId};
use crate::service::likes::{self, ToggleOutcome};
use crate::state::{AppState, blocking};

/// 201 with the new like, or 204 when the call removed one.
pub async fn toggle_like(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(req): Json<LikeRequest>,
) -> ApiResult<Response> {
    let outcome =
        blocking(&state, move |s| likes::toggle_like(&s.db, &user_id, &req.post_id, Utc::now())).await?;

    Ok(match outcome {
        ToggleOutcome::Liked(like) => (StatusCode::CREATED, Json(like)).into_response(),
        ToggleOutcome::Unliked => StatusCode::NO_CONTENT.into_response(),
    })
}

pub async fn unlike(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(post_id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| likes::unlike(&s.db, &user_id, &post_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn likes_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| likes::likes_for_post(&s.db, &post_id)).await?))
}

pub async fn likes_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| likes::likes_by_user(&s.db, &user_id)).await?))
}

pub async fn summary(
    State(state): State<AppState>,
    MaybeUserId(user_id): MaybeUserId,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let summary =
        blocking(&state, move |s| likes::summary(&s.db, &post_id, user_id.as_deref())).await?;
    Ok(Json(summary))
}

pub async fn check(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let liked = blocking(&state, move |s| likes::has_liked(&s.db, &user_id, &post_id)).await?;
    Ok(Json(LikedResponse { liked }))
}

pub async fn count(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = blocking(&state, move |s| likes::count(&s.db, &post_id)).await?;
    Ok(Json(CountResponse { count }))
}
