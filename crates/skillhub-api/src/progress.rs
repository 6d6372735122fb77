use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use skillhub_types::api::{CreateProgressUpdateRequest, UpdateProgressUpdateRequest};

use crate::error::ApiResult;
use crate::service::progress;
use crate::state::{AppState, blocking};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    pub user_id: String,
    pub plan_id: Option<String>,
    pub template_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerQuery {
    pub user_id: String,
}

pub async fn create_update(
    State(state): State<AppState>,
    Json(req): Json<CreateProgressUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let update = blocking(&state, move |s| progress::create_update(&s.db, req, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(update)))
}

pub async fn create_from_template(
    State(state): State<AppState>,
    Query(q): Query<TemplateQuery>,
) -> ApiResult<impl IntoResponse> {
    let update = blocking(&state, move |s| {
        progress::create_from_template(&s.db, &q.user_id, q.plan_id, &q.template_type, Utc::now())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(update)))
}

pub async fn list_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, |s| progress::list_all(&s.db)).await?))
}

pub async fn list_public(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, |s| progress::list_public(&s.db)).await?))
}

pub async fn get_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| progress::get_update(&s.db, &id)).await?))
}

pub async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| progress::list_by_user(&s.db, &user_id)).await?))
}

pub async fn list_by_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| progress::list_by_plan(&s.db, &plan_id)).await?))
}

pub async fn list_by_unit(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| progress::list_by_unit(&s.db, &unit_id)).await?))
}

pub async fn update_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProgressUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let update =
        blocking(&state, move |s| progress::update_update(&s.db, &id, req, Utc::now())).await?;
    Ok(Json(update))
}

pub async fn delete_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| progress::delete_update(&s.db, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| progress::like_update(&s.db, &id)).await?))
}

pub async fn unlike_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| progress::unlike_update(&s.db, &id)).await?))
}

pub async fn mark_viewed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<ViewerQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| progress::mark_viewed(&s.db, &id, &q.user_id)).await?))
}
