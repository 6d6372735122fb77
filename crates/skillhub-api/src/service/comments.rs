use chrono::{DateTime, Utc};
use skillhub_db::Database;
use skillhub_db::models::Authored;
use skillhub_types::api::{CommentRequest, CommentResponse};
use skillhub_types::models::{Comment, new_id};
use tracing::info;

use super::{ensure_post_exists, ensure_user_exists, notifications, require_post, require_user};
use crate::error::{ApiError, ApiResult};

fn to_response(c: &Authored<Comment>) -> CommentResponse {
    CommentResponse::from_comment(&c.record, &c.author)
}

fn require_comment(db: &Database, id: &str) -> ApiResult<Authored<Comment>> {
    db.get_comment(id)?
        .ok_or_else(|| ApiError::not_found("Comment", id))
}

fn require_author(comment: &Authored<Comment>, user_id: &str, action: &str) -> ApiResult<()> {
    if comment.record.user_id != user_id {
        return Err(ApiError::Forbidden(format!(
            "User is not authorized to {} this comment",
            action
        )));
    }
    Ok(())
}

pub fn create_comment(
    db: &Database,
    user_id: &str,
    req: CommentRequest,
    now: DateTime<Utc>,
) -> ApiResult<CommentResponse> {
    let post_id = req
        .post_id
        .ok_or_else(|| ApiError::BadRequest("postId is required".into()))?;
    let user = require_user(db, user_id)?;
    let post = require_post(db, &post_id)?;

    let comment = Comment {
        id: new_id(),
        user_id: user.id.clone(),
        post_id: post.id.clone(),
        content: req.content,
        created_at: now,
        updated_at: now,
    };
    db.insert_comment(&comment)?;
    notifications::notify_comment(db, &user, &post, now)?;
    info!("{} commented on post {}", user.username, post.id);

    Ok(CommentResponse::from_comment(&comment, &user))
}

/// Author only.
pub fn update_comment(
    db: &Database,
    comment_id: &str,
    user_id: &str,
    req: CommentRequest,
    now: DateTime<Utc>,
) -> ApiResult<CommentResponse> {
    let mut comment = require_comment(db, comment_id)?;
    require_author(&comment, user_id, "update")?;

    comment.record.content = req.content;
    comment.record.updated_at = now;
    db.update_comment(&comment.record)?;
    Ok(to_response(&comment))
}

/// Author only.
pub fn delete_comment(db: &Database, comment_id: &str, user_id: &str) -> ApiResult<()> {
    let comment = require_comment(db, comment_id)?;
    require_author(&comment, user_id, "delete")?;
    db.delete_comment(comment_id)?;
    Ok(())
}

pub fn get_comment(db: &Database, comment_id: &str) -> ApiResult<CommentResponse> {
    Ok(to_response(&require_comment(db, comment_id)?))
}

/// Newest first.
pub fn comments_for_post(db: &Database, post_id: &str) -> ApiResult<Vec<CommentResponse>> {
    ensure_post_exists(db, post_id)?;
    Ok(db.list_comments_for_post(post_id)?.iter().map(to_response).collect())
}

pub fn comments_by_user(db: &Database, user_id: &str) -> ApiResult<Vec<CommentResponse>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_comments_by_user(user_id)?.iter().map(to_response).collect())
}

pub fn count_for_post(db: &Database, post_id: &str) -> ApiResult<u64> {
    Ok(db.count_comments_for_post(post_id)?)
}
