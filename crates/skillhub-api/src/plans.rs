use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use skillhub_types::api::{CreateLearningPlanRequest, UpdateLearningPlanRequest};

use crate::error::ApiResult;
use crate::extract::PageQuery;
use crate::service::plans;
use crate::state::{AppState, blocking};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: Option<String>,
    pub category: Option<String>,
    pub skill_level: Option<String>,
    #[serde(default)]
    pub page: u32,
    pub size: Option<u32>,
}

/// `?tags=rust,async`
#[derive(Debug, Deserialize)]
pub struct TagsQuery {
    #[serde(default)]
    pub tags: String,
}

impl TagsQuery {
    fn split(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkQuery {
    pub user_id: String,
}

pub async fn create_plan(
    State(state): State<AppState>,
    Json(req): Json<CreateLearningPlanRequest>,
) -> ApiResult<impl IntoResponse> {
    let plan = blocking(&state, move |s| plans::create_plan(&s.db, req, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Counts as a view.
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| plans::view_plan(&s.db, &id)).await?))
}

pub async fn plans_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| plans::plans_by_owner(&s.db, &owner_id)).await?))
}

pub async fn public_plans(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let size = state.settings.page_size(q.size);
    Ok(Json(blocking(&state, move |s| plans::public_plans(&s.db, q.page, size)).await?))
}

pub async fn search_plans(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let size = state.settings.page_size(q.size);
    let page = blocking(&state, move |s| {
        plans::search_plans(
            &s.db,
            q.query.as_deref(),
            q.category.as_deref(),
            q.skill_level.as_deref(),
            q.page,
            size,
        )
    })
    .await?;
    Ok(Json(page))
}

pub async fn plans_by_tags(
    State(state): State<AppState>,
    Query(q): Query<TagsQuery>,
) -> ApiResult<impl IntoResponse> {
    let tags = q.split();
    Ok(Json(blocking(&state, move |s| plans::plans_by_tags(&s.db, &tags)).await?))
}

pub async fn popular_plans(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let size = state.settings.page_size(q.size);
    Ok(Json(blocking(&state, move |s| plans::popular_plans(&s.db, q.page, size)).await?))
}

pub async fn most_forked_plans(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let size = state.settings.page_size(q.size);
    Ok(Json(blocking(&state, move |s| plans::most_forked_plans(&s.db, q.page, size)).await?))
}

/// Bare number body.
pub async fn count_by_owner(
    State(state): State<AppState>,
    Query(q): Query<OwnerQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| plans::count_by_owner(&s.db, &q.owner_id)).await?))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLearningPlanRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| plans::update_plan(&s.db, &id, req, Utc::now())).await?))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| plans::delete_plan(&s.db, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_unit(
    State(state): State<AppState>,
    Path((plan_id, unit_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let plan =
        blocking(&state, move |s| plans::complete_unit(&s.db, &plan_id, &unit_id, Utc::now())).await?;
    Ok(Json(plan))
}

pub async fn fork_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    Query(q): Query<ForkQuery>,
) -> ApiResult<impl IntoResponse> {
    let fork = blocking(&state, move |s| {
        plans::fork_plan(&s.db, &plan_id, &q.user_id, s.settings.reset_units_on_fork, Utc::now())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(fork)))
}
