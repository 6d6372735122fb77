use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use skillhub_types::api::{ConversationRequest, CountResponse, SendMessageRequest, UpdateMessageRequest};

use crate::error::ApiResult;
use crate::service::chat;
use crate::state::{AppState, blocking};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairQuery {
    pub user1_id: String,
    pub user2_id: String,
}

pub async fn open_conversation(
    State(state): State<AppState>,
    Json(req): Json<ConversationRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| chat::open_conversation(&s.db, req, Utc::now())).await?))
}

pub async fn conversations_for(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| chat::conversations_for(&s.db, &user_id)).await?))
}

pub async fn conversation_between(
    State(state): State<AppState>,
    Query(q): Query<PairQuery>,
) -> ApiResult<impl IntoResponse> {
    let convo = blocking(&state, move |s| {
        chat::conversation_between(&s.db, &q.user1_id, &q.user2_id)
    })
    .await?;
    Ok(Json(convo))
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = blocking(&state, move |s| chat::send_message(&s.db, req, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn edit_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| chat::edit_message(&s.db, &id, req, Utc::now())).await?))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    blocking(&state, move |s| chat::delete_message(&s.db, &id, Utc::now())).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn conversation_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let messages = blocking(&state, move |s| {
        chat::conversation_messages(&s.db, &conversation_id)
    })
    .await?;
    Ok(Json(messages))
}

/// Body is a JSON array of message ids.
pub async fn mark_read(
    State(state): State<AppState>,
    Json(ids): Json<Vec<String>>,
) -> ApiResult<impl IntoResponse> {
    let count = blocking(&state, move |s| chat::mark_read(&s.db, &ids, Utc::now())).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn unread_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| chat::unread_messages(&s.db, &user_id)).await?))
}
