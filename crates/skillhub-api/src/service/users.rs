use chrono::{DateTime, Utc};
use skillhub_db::{Database, is_unique_violation};
use skillhub_types::api::{RegisterUserRequest, UpdateUserRequest, UserProfile};
use skillhub_types::models::{AppUser, new_id};
use tracing::info;

use super::require_user;
use crate::error::{ApiError, ApiResult};

fn ensure_username_free(db: &Database, username: &str, except: Option<&str>) -> ApiResult<()> {
    match db.get_user_by_username(username)? {
        Some(existing) if Some(existing.id.as_str()) != except => {
            Err(ApiError::BadRequest("Username is already taken".into()))
        }
        _ => Ok(()),
    }
}

fn ensure_email_free(db: &Database, email: &str, except: Option<&str>) -> ApiResult<()> {
    match db.get_user_by_email(email)? {
        Some(existing) if Some(existing.id.as_str()) != except => {
            Err(ApiError::BadRequest("Email is already in use".into()))
        }
        _ => Ok(()),
    }
}

/// A concurrent registration can still slip past the pre-checks; the unique
/// indexes catch it.
fn map_duplicate(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::BadRequest("Username or email is already in use".into())
    } else {
        ApiError::Internal(err)
    }
}

pub fn register(db: &Database, req: RegisterUserRequest, now: DateTime<Utc>) -> ApiResult<UserProfile> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() {
        return Err(ApiError::BadRequest("Username and email are required".into()));
    }
    ensure_username_free(db, username, None)?;
    ensure_email_free(db, email, None)?;

    let user = AppUser {
        id: new_id(),
        username: username.to_string(),
        email: email.to_string(),
        first_name: req.first_name,
        last_name: req.last_name,
        profile_image_url: req.profile_image_url,
        created_at: now,
    };
    db.insert_user(&user).map_err(map_duplicate)?;
    info!("Registered user {} ({})", user.username, user.id);
    Ok(UserProfile::from_user(&user))
}

pub fn get_user(db: &Database, id: &str) -> ApiResult<UserProfile> {
    Ok(UserProfile::from_user(&require_user(db, id)?))
}

pub fn list_users(db: &Database) -> ApiResult<Vec<UserProfile>> {
    Ok(db.list_users()?.iter().map(UserProfile::from_user).collect())
}

/// Only the supplied fields change.
pub fn update_user(db: &Database, id: &str, req: UpdateUserRequest) -> ApiResult<UserProfile> {
    let mut user = require_user(db, id)?;

    if let Some(username) = req.username {
        ensure_username_free(db, &username, Some(id))?;
        user.username = username;
    }
    if let Some(email) = req.email {
        ensure_email_free(db, &email, Some(id))?;
        user.email = email;
    }
    if req.first_name.is_some() {
        user.first_name = req.first_name;
    }
    if req.last_name.is_some() {
        user.last_name = req.last_name;
    }
    if req.profile_image_url.is_some() {
        user.profile_image_url = req.profile_image_url;
    }

    db.update_user(&user).map_err(map_duplicate)?;
    Ok(UserProfile::from_user(&user))
}

pub fn delete_user(db: &Database, id: &str) -> ApiResult<()> {
    if !db.delete_user(id)? {
        return Err(ApiError::not_found("User", id));
    }
    info!("Deleted user {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{db, post, user};

    fn request(username: &str, email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: username.into(),
            email: email.into(),
            first_name: Some("Ada".into()),
            last_name: None,
            profile_image_url: None,
        }
    }

    #[test]
    fn duplicate_username_or_email_is_rejected() {
        let db = db();
        register(&db, request("ada", "ada@example.com"), Utc::now()).unwrap();

        assert!(matches!(
            register(&db, request("ada", "other@example.com"), Utc::now()),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            register(&db, request("other", "ada@example.com"), Utc::now()),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn partial_update_keeps_unspecified_fields() {
        let db = db();
        let created = register(&db, request("ada", "ada@example.com"), Utc::now()).unwrap();

        let updated = update_user(
            &db,
            &created.id,
            UpdateUserRequest {
                last_name: Some("Lovelace".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));
        assert_eq!(updated.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(updated.username, "ada");
    }

    #[test]
    fn renaming_onto_a_taken_username_fails() {
        let db = db();
        let ada = user(&db, "ada");
        user(&db, "grace");
        let res = update_user(
            &db,
            &ada.id,
            UpdateUserRequest {
                username: Some("grace".into()),
                ..Default::default()
            },
        );
        assert!(matches!(res, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn delete_cascades_and_reports_missing() {
        let db = db();
        let ada = user(&db, "ada");
        let p = post(&db, &ada);

        delete_user(&db, &ada.id).unwrap();
        assert!(db.get_post(&p.id).unwrap().is_none());
        assert!(matches!(get_user(&db, &ada.id), Err(ApiError::NotFound(_))));
        assert!(matches!(delete_user(&db, &ada.id), Err(ApiError::NotFound(_))));
    }
}
