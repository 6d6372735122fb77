//! Business rules. Every function here is synchronous and works directly on
//! a `&Database`; handlers move the call onto the blocking pool.

pub mod chat;
pub mod comments;
pub mod likes;
pub mod notifications;
pub mod plans;
pub mod posts;
pub mod progress;
pub mod relationships;
pub mod users;

use skillhub_db::Database;
use skillhub_types::models::{AppUser, UserPost};

use crate::error::{ApiError, ApiResult};

pub(crate) fn require_user(db: &Database, id: &str) -> ApiResult<AppUser> {
    db.get_user_by_id(id)?
        .ok_or_else(|| ApiError::not_found("User", id))
}

pub(crate) fn ensure_user_exists(db: &Database, id: &str) -> ApiResult<()> {
    if db.user_exists(id)? {
        Ok(())
    } else {
        Err(ApiError::not_found("User", id))
    }
}

pub(crate) fn require_post(db: &Database, id: &str) -> ApiResult<UserPost> {
    db.get_post(id)?
        .ok_or_else(|| ApiError::not_found("Post", id))
}

pub(crate) fn ensure_post_exists(db: &Database, id: &str) -> ApiResult<()> {
    if db.post_exists(id)? {
        Ok(())
    } else {
        Err(ApiError::not_found("Post", id))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use skillhub_db::Database;
    use skillhub_types::api::{CreateUpdatePostRequest, RegisterUserRequest, UserProfile};
    use skillhub_types::models::{AppUser, UserPost};

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn user(db: &Database, username: &str) -> AppUser {
        let profile: UserProfile = super::users::register(
            db,
            RegisterUserRequest {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                first_name: None,
                last_name: None,
                profile_image_url: None,
            },
            Utc::now(),
        )
        .unwrap();
        db.get_user_by_id(&profile.id).unwrap().unwrap()
    }

    pub fn post(db: &Database, author: &AppUser) -> UserPost {
        let created = super::posts::create_post(
            db,
            &author.id,
            CreateUpdatePostRequest {
                title: "Knife skills".into(),
                description: "Julienne practice".into(),
                medias: vec![],
            },
            Utc::now(),
        )
        .unwrap();
        db.get_post(&created.id).unwrap().unwrap()
    }
}
