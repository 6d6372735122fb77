use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use skillhub_types::api::CountResponse;

use crate::error::ApiResult;
use crate::extract::PageQuery;
use crate::service::notifications;
use crate::state::{AppState, blocking};

/// The acting user for single-notification writes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorQuery {
    pub user_id: String,
}

pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| notifications::list_for_user(&s.db, &user_id)).await?))
}

pub async fn page_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(q): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let size = state.settings.page_size(q.size);
    let page = blocking(&state, move |s| {
        notifications::page_for_user(&s.db, &user_id, q.page, size)
    })
    .await?;
    Ok(Json(page))
}

pub async fn unread_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| notifications::unread_for_user(&s.db, &user_id)).await?))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = blocking(&state, move |s| notifications::unread_count(&s.db, &user_id)).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<ActorQuery>,
) -> ApiResult<impl IntoResponse> {
    let n = blocking(&state, move |s| {
        notifications::mark_as_read(&s.db, &id, &q.user_id, Utc::now())
    })
    .await?;
    Ok(Json(n))
}

pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = blocking(&state, move |s| {
        notifications::mark_all_as_read(&s.db, &user_id, Utc::now())
    })
    .await?;
    Ok(Json(CountResponse { count }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<ActorQuery>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| notifications::delete(&s.db, &id, &q.user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| notifications::delete_all_for_user(&s.db, &user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
