use chrono::{DateTime, Utc};
use skillhub_db::{Database, is_unique_violation};
use skillhub_types::api::{RelationshipResponse, UserProfile};
use skillhub_types::models::{UserRelationship, new_id};
use tracing::info;

use super::{ensure_user_exists, notifications, require_user};
use crate::error::{ApiError, ApiResult};

const ALREADY_FOLLOWING: &str = "You are already following this user";

pub fn follow(
    db: &Database,
    follower_id: &str,
    following_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<RelationshipResponse> {
    let follower = require_user(db, follower_id)?;
    let followed = require_user(db, following_id)?;

    if follower.id == followed.id {
        return Err(ApiError::BadRequest("You cannot follow yourself".into()));
    }
    if db.find_relationship(&follower.id, &followed.id)?.is_some() {
        return Err(ApiError::BadRequest(ALREADY_FOLLOWING.into()));
    }

    let rel = UserRelationship {
        id: new_id(),
        follower_id: follower.id.clone(),
        following_id: followed.id.clone(),
        created_at: now,
    };
    db.insert_relationship(&rel).map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::BadRequest(ALREADY_FOLLOWING.into())
        } else {
            ApiError::Internal(e)
        }
    })?;
    notifications::notify_follow(db, &follower, &followed, now)?;
    info!("{} now follows {}", follower.username, followed.username);

    Ok(RelationshipResponse::from_relationship(&rel))
}

pub fn unfollow(db: &Database, follower_id: &str, following_id: &str) -> ApiResult<()> {
    ensure_user_exists(db, follower_id)?;
    ensure_user_exists(db, following_id)?;
    if !db.delete_relationship(follower_id, following_id)? {
        return Err(ApiError::NotFound("You are not following this user".into()));
    }
    info!("{} unfollowed {}", follower_id, following_id);
    Ok(())
}

pub fn following(db: &Database, user_id: &str) -> ApiResult<Vec<UserProfile>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_following(user_id)?.iter().map(UserProfile::from_user).collect())
}

pub fn followers(db: &Database, user_id: &str) -> ApiResult<Vec<UserProfile>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_followers(user_id)?.iter().map(UserProfile::from_user).collect())
}

pub fn is_following(db: &Database, follower_id: &str, following_id: &str) -> ApiResult<bool> {
    ensure_user_exists(db, follower_id)?;
    ensure_user_exists(db, following_id)?;
    Ok(db.find_relationship(follower_id, following_id)?.is_some())
}

pub fn following_count(db: &Database, user_id: &str) -> ApiResult<u64> {
    ensure_user_exists(db, user_id)?;
    Ok(db.count_following(user_id)?)
}

pub fn followers_count(db: &Database, user_id: &str) -> ApiResult<u64> {
    ensure_user_exists(db, user_id)?;
    Ok(db.count_followers(user_id)?)
}
