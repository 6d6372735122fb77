use chrono::{DateTime, Utc};
use skillhub_db::Database;
use skillhub_db::models::Authored;
use skillhub_types::api::{
    CreateProgressUpdateRequest, ProgressMediaDto, ProgressUpdateResponse,
    UpdateProgressUpdateRequest,
};
use skillhub_types::models::{ProgressTemplate, ProgressUpdate};
use tracing::{debug, info};

use super::{ensure_user_exists, require_user};
use crate::error::{ApiError, ApiResult};

fn to_response(u: &Authored<ProgressUpdate>) -> ProgressUpdateResponse {
    ProgressUpdateResponse::from_update(&u.record, &u.author)
}

fn require_update(db: &Database, id: &str) -> ApiResult<Authored<ProgressUpdate>> {
    db.get_progress(id)?
        .ok_or_else(|| ApiError::not_found("Progress update", id))
}

/// Blank plan ids count as "no plan"; a real one must exist.
fn resolve_plan_id(db: &Database, plan_id: Option<String>) -> ApiResult<Option<String>> {
    match plan_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => {
            if !db.plan_exists(&id)? {
                return Err(ApiError::not_found("Learning plan", &id));
            }
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

pub fn create_update(
    db: &Database,
    req: CreateProgressUpdateRequest,
    now: DateTime<Utc>,
) -> ApiResult<ProgressUpdateResponse> {
    let author = require_user(db, &req.user_id)?;
    let related_plan_id = resolve_plan_id(db, req.related_plan_id)?;

    let mut update = ProgressUpdate::new(&author.id, now);
    update.related_plan_id = related_plan_id;
    update.learning_unit_id = req.learning_unit_id;
    update.title = req.title;
    update.content = req.content;
    update.is_public = req.is_public;
    update.hours_spent = req.hours_spent;
    update.progress_type = req.progress_type;
    update.rating = req.rating;
    update.template_type = req.template_type;
    update.sentiment = req.sentiment;
    update.challenges = req.challenges;
    update.achievements = req.achievements;
    update.attached_media = req
        .attached_media
        .into_iter()
        .map(ProgressMediaDto::into_media)
        .collect();

    db.insert_progress(&update)?;
    info!("Progress update {} posted by {}", update.id, author.username);
    Ok(ProgressUpdateResponse::from_update(&update, &author))
}

/// Pre-filled update from one of the fixed templates.
pub fn create_from_template(
    db: &Database,
    user_id: &str,
    plan_id: Option<String>,
    template_type: &str,
    now: DateTime<Utc>,
) -> ApiResult<ProgressUpdateResponse> {
    let template: ProgressTemplate = template_type.parse().map_err(ApiError::BadRequest)?;
    let author = require_user(db, user_id)?;
    let plan_id = resolve_plan_id(db, plan_id)?;

    let update = template.build(&author.id, plan_id.as_deref(), now);
    db.insert_progress(&update)?;
    info!("{} template update {} for {}", template.as_str(), update.id, author.username);
    Ok(ProgressUpdateResponse::from_update(&update, &author))
}

pub fn list_all(db: &Database) -> ApiResult<Vec<ProgressUpdateResponse>> {
    Ok(db.list_progress()?.iter().map(to_response).collect())
}

pub fn list_public(db: &Database) -> ApiResult<Vec<ProgressUpdateResponse>> {
    Ok(db.list_public_progress()?.iter().map(to_response).collect())
}

pub fn get_update(db: &Database, id: &str) -> ApiResult<ProgressUpdateResponse> {
    Ok(to_response(&require_update(db, id)?))
}

pub fn list_by_user(db: &Database, user_id: &str) -> ApiResult<Vec<ProgressUpdateResponse>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_progress_by_user(user_id)?.iter().map(to_response).collect())
}

pub fn list_by_plan(db: &Database, plan_id: &str) -> ApiResult<Vec<ProgressUpdateResponse>> {
    Ok(db.list_progress_by_plan(plan_id)?.iter().map(to_response).collect())
}

pub fn list_by_unit(db: &Database, unit_id: &str) -> ApiResult<Vec<ProgressUpdateResponse>> {
    Ok(db.list_progress_by_unit(unit_id)?.iter().map(to_response).collect())
}

pub fn update_update(
    db: &Database,
    id: &str,
    req: UpdateProgressUpdateRequest,
    now: DateTime<Utc>,
) -> ApiResult<ProgressUpdateResponse> {
    let mut update = require_update(db, id)?;
    let u = &mut update.record;

    if let Some(title) = req.title {
        u.title = title;
    }
    if let Some(content) = req.content {
        u.content = content;
    }
    if let Some(is_public) = req.is_public {
        u.is_public = is_public;
    }
    if let Some(hours) = req.hours_spent {
        u.hours_spent = hours;
    }
    if req.progress_type.is_some() {
        u.progress_type = req.progress_type;
    }
    if req.rating.is_some() {
        u.rating = req.rating;
    }
    if req.sentiment.is_some() {
        u.sentiment = req.sentiment;
    }
    if let Some(challenges) = req.challenges {
        u.challenges = challenges;
    }
    if let Some(achievements) = req.achievements {
        u.achievements = achievements;
    }
    if req.learning_unit_id.is_some() {
        u.learning_unit_id = req.learning_unit_id;
    }
    if let Some(media) = req.attached_media {
        u.attached_media = media.into_iter().map(ProgressMediaDto::into_media).collect();
    }
    u.updated_at = now;

    db.save_progress(&update.record)?;
    Ok(to_response(&update))
}

pub fn delete_update(db: &Database, id: &str) -> ApiResult<()> {
    if !db.delete_progress(id)? {
        return Err(ApiError::not_found("Progress update", id));
    }
    Ok(())
}

pub fn like_update(db: &Database, id: &str) -> ApiResult<ProgressUpdateResponse> {
    let mut update = require_update(db, id)?;
    update.record.increment_likes();
    db.save_progress(&update.record)?;
    Ok(to_response(&update))
}

/// Never takes the count below zero.
pub fn unlike_update(db: &Database, id: &str) -> ApiResult<ProgressUpdateResponse> {
    let mut update = require_update(db, id)?;
    update.record.decrement_likes();
    db.save_progress(&update.record)?;
    Ok(to_response(&update))
}

/// Each viewer is recorded once; repeat views are not written.
pub fn mark_viewed(db: &Database, id: &str, viewer_id: &str) -> ApiResult<ProgressUpdateResponse> {
    let mut update = require_update(db, id)?;
    ensure_user_exists(db, viewer_id)?;
    if update.record.mark_viewed(viewer_id) {
        db.save_progress(&update.record)?;
    } else {
        debug!("{} already viewed progress update {}", viewer_id, id);
    }
    Ok(to_response(&update))
}

#[cfg(test)]
mod tests {
    use skillhub_types::models::ProgressType;

    use super::*;
    use crate::service::test_support::{db, user};

    fn request(user_id: &str) -> CreateProgressUpdateRequest {
        CreateProgressUpdateRequest {
            user_id: user_id.into(),
            title: "Finished chapter 4".into(),
            content: "Ownership finally clicked".into(),
            is_public: true,
            hours_spent: 2,
            progress_type: Some(ProgressType::Milestone),
            rating: Some(5),
            template_type: None,
            sentiment: None,
            challenges: vec![],
            achievements: vec!["borrow checker".into()],
            related_plan_id: None,
            learning_unit_id: None,
            attached_media: vec![],
        }
    }

    #[test]
    fn views_are_counted_once_per_viewer() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let created = create_update(&db, request(&ada.id), Utc::now()).unwrap();

        mark_viewed(&db, &created.id, &grace.id).unwrap();
        let again = mark_viewed(&db, &created.id, &grace.id).unwrap();
        assert_eq!(again.view_count, 1);
        assert_eq!(mark_viewed(&db, &created.id, &ada.id).unwrap().view_count, 2);
    }

    #[test]
    fn unlike_stops_at_zero() {
        let db = db();
        let ada = user(&db, "ada");
        let created = create_update(&db, request(&ada.id), Utc::now()).unwrap();

        assert_eq!(unlike_update(&db, &created.id).unwrap().like_count, 0);
        like_update(&db, &created.id).unwrap();
        assert_eq!(get_update(&db, &created.id).unwrap().like_count, 1);
        unlike_update(&db, &created.id).unwrap();
        assert_eq!(unlike_update(&db, &created.id).unwrap().like_count, 0);
    }

    #[test]
    fn templates_fill_in_type_and_text() {
        let db = db();
        let ada = user(&db, "ada");
        let created = create_from_template(&db, &ada.id, None, "Daily", Utc::now()).unwrap();
        assert_eq!(created.progress_type, Some(ProgressType::DailyUpdate));
        assert_eq!(created.template_type.as_deref(), Some("daily"));
        assert_eq!(created.title, "My learning progress today");

        assert!(matches!(
            create_from_template(&db, &ada.id, None, "weekly", Utc::now()),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            create_from_template(&db, "ghost", None, "daily", Utc::now()),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            create_from_template(&db, &ada.id, Some("no-plan".into()), "daily", Utc::now()),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn partial_update_and_delete() {
        let db = db();
        let ada = user(&db, "ada");
        let created = create_update(&db, request(&ada.id), Utc::now()).unwrap();

        let updated = update_update(
            &db,
            &created.id,
            UpdateProgressUpdateRequest {
                is_public: Some(false),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(!updated.is_public);
        assert_eq!(updated.title, created.title);
        assert!(list_public(&db).unwrap().is_empty());
        assert_eq!(list_by_user(&db, &ada.id).unwrap().len(), 1);

        delete_update(&db, &created.id).unwrap();
        assert!(matches!(delete_update(&db, &created.id), Err(ApiError::NotFound(_))));
    }
}
