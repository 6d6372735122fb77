use chrono::{DateTime, Utc};
use skillhub_db::models::Authored;
use skillhub_db::{Database, is_unique_violation};
use skillhub_types::api::{LikeResponse, LikeSummary};
use skillhub_types::models::{AppUser, Like, UserPost, new_id};
use tracing::{info, warn};

use super::{ensure_post_exists, ensure_user_exists, notifications, require_post, require_user};
use crate::error::ApiResult;

#[derive(Debug)]
pub enum ToggleOutcome {
    Liked(LikeResponse),
    Unliked,
}

fn to_response(like: &Authored<Like>) -> LikeResponse {
    LikeResponse::from_like(&like.record, &like.author)
}

/// Likes the post if the user has not yet, unlikes it otherwise.
pub fn toggle_like(
    db: &Database,
    user_id: &str,
    post_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<ToggleOutcome> {
    let user = require_user(db, user_id)?;
    let post = require_post(db, post_id)?;

    if db.find_like(&user.id, &post.id)?.is_some() {
        db.delete_like(&user.id, &post.id)?;
        info!("{} unliked post {}", user.username, post.id);
        return Ok(ToggleOutcome::Unliked);
    }

    like_or_yield(db, &user, &post, now)
}

/// Inserts the like and notifies the post owner. If the insert hits the
/// (user, post) unique index a concurrent toggle has liked the post in the
/// meantime; this call then acts as the unlike.
pub(crate) fn like_or_yield(
    db: &Database,
    user: &AppUser,
    post: &UserPost,
    now: DateTime<Utc>,
) -> ApiResult<ToggleOutcome> {
    let like = Like {
        id: new_id(),
        user_id: user.id.clone(),
        post_id: post.id.clone(),
        created_at: now,
    };

    match db.insert_like(&like) {
        Ok(()) => {
            notifications::notify_like(db, user, post, now)?;
            info!("{} liked post {}", user.username, post.id);
            Ok(ToggleOutcome::Liked(LikeResponse::from_like(&like, user)))
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(
                "Concurrent like on post {} by {}; resolving as unlike",
                post.id, user.id
            );
            db.delete_like(&user.id, &post.id)?;
            Ok(ToggleOutcome::Unliked)
        }
        Err(e) => Err(e.into()),
    }
}

/// Explicit unlike; a no-op when there is nothing to remove.
pub fn unlike(db: &Database, user_id: &str, post_id: &str) -> ApiResult<()> {
    ensure_user_exists(db, user_id)?;
    ensure_post_exists(db, post_id)?;
    if db.delete_like(user_id, post_id)? {
        info!("{} unliked post {}", user_id, post_id);
    }
    Ok(())
}

pub fn likes_for_post(db: &Database, post_id: &str) -> ApiResult<Vec<LikeResponse>> {
    ensure_post_exists(db, post_id)?;
    Ok(db.list_likes_for_post(post_id)?.iter().map(to_response).collect())
}

pub fn likes_by_user(db: &Database, user_id: &str) -> ApiResult<Vec<LikeResponse>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_likes_by_user(user_id)?.iter().map(to_response).collect())
}

pub fn summary(db: &Database, post_id: &str, user_id: Option<&str>) -> ApiResult<LikeSummary> {
    let count = db.count_likes_for_post(post_id)?;
    let liked_by_user = match user_id {
        Some(uid) => db.has_liked(uid, post_id)?,
        None => false,
    };
    Ok(LikeSummary { count, liked_by_user })
}

pub fn has_liked(db: &Database, user_id: &str, post_id: &str) -> ApiResult<bool> {
    Ok(db.has_liked(user_id, post_id)?)
}

pub fn count(db: &Database, post_id: &str) -> ApiResult<u64> {
    Ok(db.count_likes_for_post(post_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::service::test_support::{db, post, user};

    #[test]
    fn toggling_twice_likes_then_unlikes() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);

        let first = toggle_like(&db, &grace.id, &p.id, Utc::now()).unwrap();
        match first {
            ToggleOutcome::Liked(resp) => {
                assert_eq!(resp.user.username, "grace");
                assert_eq!(resp.post_id, p.id);
            }
            ToggleOutcome::Unliked => panic!("expected a like"),
        }
        assert!(matches!(
            toggle_like(&db, &grace.id, &p.id, Utc::now()).unwrap(),
            ToggleOutcome::Unliked
        ));
        assert_eq!(count(&db, &p.id).unwrap(), 0);
        assert!(db.find_like(&grace.id, &p.id).unwrap().is_none());
    }

    #[test]
    fn losing_the_insert_race_unlikes_instead_of_failing() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);

        // The other request's like lands between our lookup and our insert.
        let outcome = like_or_yield(&db, &grace, &p, Utc::now()).unwrap();
        assert!(matches!(outcome, ToggleOutcome::Liked(_)));
        let loser = like_or_yield(&db, &grace, &p, Utc::now()).unwrap();
        assert!(matches!(loser, ToggleOutcome::Unliked));

        assert_eq!(db.count_likes_for_post(&p.id).unwrap(), 0);
        // Only the winning insert notified the owner.
        assert_eq!(db.count_unread_notifications(&ada.id).unwrap(), 1);
    }

    #[test]
    fn cross_user_like_notifies_exactly_once_and_self_like_never() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);

        toggle_like(&db, &ada.id, &p.id, Utc::now()).unwrap();
        assert_eq!(db.count_unread_notifications(&ada.id).unwrap(), 0);

        toggle_like(&db, &grace.id, &p.id, Utc::now()).unwrap();
        let notes = db.list_notifications(&ada.id).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].record.message, "grace liked your post");
    }

    #[test]
    fn summary_reflects_the_asking_user() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);
        toggle_like(&db, &grace.id, &p.id, Utc::now()).unwrap();

        let for_grace = summary(&db, &p.id, Some(&grace.id)).unwrap();
        assert_eq!(for_grace.count, 1);
        assert!(for_grace.liked_by_user);
        assert!(!summary(&db, &p.id, Some(&ada.id)).unwrap().liked_by_user);
        assert!(!summary(&db, &p.id, None).unwrap().liked_by_user);
        assert_eq!(likes_for_post(&db, &p.id).unwrap().len(), 1);
        assert_eq!(likes_by_user(&db, &grace.id).unwrap().len(), 1);
    }

    #[test]
    fn missing_user_or_post_is_not_found() {
        let db = db();
        let ada = user(&db, "ada");
        let p = post(&db, &ada);
        assert!(matches!(toggle_like(&db, "ghost", &p.id, Utc::now()), Err(ApiError::NotFound(_))));
        assert!(matches!(toggle_like(&db, &ada.id, "ghost", Utc::now()), Err(ApiError::NotFound(_))));
        assert!(matches!(unlike(&db, &ada.id, "ghost"), Err(ApiError::NotFound(_))));
        assert!(matches!(likes_for_post(&db, "ghost"), Err(ApiError::NotFound(_))));
        unlike(&db, &ada.id, &p.id).unwrap();
    }
}
