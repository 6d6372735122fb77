use chrono::{DateTime, Utc};
use skillhub_db::Database;
use skillhub_db::models::Authored;
use skillhub_types::api::{NotificationResponse, Page};
use skillhub_types::models::{
    AppUser, Notification, NotificationKind, NotificationTarget, UserPost,
};
use tracing::debug;

use super::ensure_user_exists;
use crate::error::{ApiError, ApiResult};

fn to_response(n: &Authored<Notification>) -> NotificationResponse {
    NotificationResponse::from_notification(&n.record, &n.author)
}

// -- Fan-out. Called directly by the like, comment and follow services. --

/// No notification when someone likes their own post.
pub fn notify_like(
    db: &Database,
    liker: &AppUser,
    post: &UserPost,
    now: DateTime<Utc>,
) -> ApiResult<Option<Notification>> {
    if liker.id == post.posted_by {
        return Ok(None);
    }
    let n = Notification::new(
        &post.posted_by,
        &liker.id,
        NotificationKind::Like,
        NotificationTarget::Post(post.id.clone()),
        format!("{} liked your post", liker.username),
        now,
    );
    db.insert_notification(&n)?;
    debug!("Like notification {} for {}", n.id, n.recipient_id);
    Ok(Some(n))
}

/// No notification when someone comments on their own post.
pub fn notify_comment(
    db: &Database,
    commenter: &AppUser,
    post: &UserPost,
    now: DateTime<Utc>,
) -> ApiResult<Option<Notification>> {
    if commenter.id == post.posted_by {
        return Ok(None);
    }
    let n = Notification::new(
        &post.posted_by,
        &commenter.id,
        NotificationKind::Comment,
        NotificationTarget::Post(post.id.clone()),
        format!("{} commented on your post", commenter.username),
        now,
    );
    db.insert_notification(&n)?;
    debug!("Comment notification {} for {}", n.id, n.recipient_id);
    Ok(Some(n))
}

pub fn notify_follow(
    db: &Database,
    follower: &AppUser,
    followed: &AppUser,
    now: DateTime<Utc>,
) -> ApiResult<Notification> {
    let n = Notification::new(
        &followed.id,
        &follower.id,
        NotificationKind::Follow,
        NotificationTarget::User(follower.id.clone()),
        format!("{} started following you", follower.username),
        now,
    );
    db.insert_notification(&n)?;
    debug!("Follow notification {} for {}", n.id, n.recipient_id);
    Ok(n)
}

// -- Recipient-facing operations --

pub fn list_for_user(db: &Database, user_id: &str) -> ApiResult<Vec<NotificationResponse>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_notifications(user_id)?.iter().map(to_response).collect())
}

pub fn page_for_user(
    db: &Database,
    user_id: &str,
    page: u32,
    size: u32,
) -> ApiResult<Page<NotificationResponse>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_notifications_page(user_id, page, size)?.map(|n| to_response(&n)))
}

pub fn unread_for_user(db: &Database, user_id: &str) -> ApiResult<Vec<NotificationResponse>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_unread_notifications(user_id)?.iter().map(to_response).collect())
}

pub fn unread_count(db: &Database, user_id: &str) -> ApiResult<u64> {
    ensure_user_exists(db, user_id)?;
    Ok(db.count_unread_notifications(user_id)?)
}

fn require_own_notification(
    db: &Database,
    notification_id: &str,
    user_id: &str,
    action: &str,
) -> ApiResult<Authored<Notification>> {
    let n = db
        .get_notification(notification_id)?
        .ok_or_else(|| ApiError::not_found("Notification", notification_id))?;
    if n.record.recipient_id != user_id {
        return Err(ApiError::Forbidden(format!(
            "User is not authorized to {} this notification",
            action
        )));
    }
    Ok(n)
}

/// Recipient only. Marking an already read notification changes nothing.
pub fn mark_as_read(
    db: &Database,
    notification_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<NotificationResponse> {
    let mut n = require_own_notification(db, notification_id, user_id, "mark as read")?;
    if n.record.mark_read(now) && !db.mark_notification_read(notification_id, now)? {
        // Someone else got there first; report what the store holds.
        n = require_own_notification(db, notification_id, user_id, "mark as read")?;
    }
    Ok(to_response(&n))
}

pub fn mark_all_as_read(db: &Database, user_id: &str, now: DateTime<Utc>) -> ApiResult<u64> {
    ensure_user_exists(db, user_id)?;
    let changed = db.mark_all_notifications_read(user_id, now)?;
    debug!("Marked {} notifications read for {}", changed, user_id);
    Ok(changed)
}

pub fn delete(db: &Database, notification_id: &str, user_id: &str) -> ApiResult<()> {
    require_own_notification(db, notification_id, user_id, "delete")?;
    db.delete_notification(notification_id)?;
    Ok(())
}

pub fn delete_all_for_user(db: &Database, user_id: &str) -> ApiResult<u64> {
    ensure_user_exists(db, user_id)?;
    Ok(db.delete_notifications_for(user_id)?)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::service::test_support::{db, post, user};

    #[test]
    fn own_activity_is_not_notified() {
        let db = db();
        let ada = user(&db, "ada");
        let p = post(&db, &ada);
        assert!(notify_like(&db, &ada, &p, Utc::now()).unwrap().is_none());
        assert!(notify_comment(&db, &ada, &p, Utc::now()).unwrap().is_none());
        assert_eq!(unread_count(&db, &ada.id).unwrap(), 0);
    }

    #[test]
    fn follow_targets_the_follower() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        notify_follow(&db, &grace, &ada, Utc::now()).unwrap();

        let list = list_for_user(&db, &ada.id).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, "FOLLOW");
        assert_eq!(list[0].target_type, "USER");
        assert_eq!(list[0].target_id, grace.id);
        assert_eq!(list[0].message, "grace started following you");
    }

    #[test]
    fn only_the_recipient_may_mark_or_delete() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);
        let n = notify_like(&db, &grace, &p, Utc::now()).unwrap().unwrap();

        assert!(matches!(
            mark_as_read(&db, &n.id, &grace.id, Utc::now()),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(delete(&db, &n.id, &grace.id), Err(ApiError::Forbidden(_))));
        assert!(matches!(
            mark_as_read(&db, "missing", &ada.id, Utc::now()),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn mark_as_read_is_idempotent() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);
        let n = notify_like(&db, &grace, &p, Utc::now()).unwrap().unwrap();

        let first_at = Utc::now();
        let first = mark_as_read(&db, &n.id, &ada.id, first_at).unwrap();
        assert!(first.read);
        assert_eq!(first.read_at, Some(first_at));

        let again = mark_as_read(&db, &n.id, &ada.id, first_at + Duration::hours(1)).unwrap();
        assert!(again.read);
        assert_eq!(again.read_at, Some(first_at));
        assert_eq!(unread_count(&db, &ada.id).unwrap(), 0);
    }

    #[test]
    fn missing_recipient_is_not_found() {
        let db = db();
        assert!(matches!(list_for_user(&db, "ghost"), Err(ApiError::NotFound(_))));
        assert!(matches!(mark_all_as_read(&db, "ghost", Utc::now()), Err(ApiError::NotFound(_))));
        assert!(matches!(delete_all_for_user(&db, "ghost"), Err(ApiError::NotFound(_))));
    }
}
