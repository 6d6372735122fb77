use chrono::{DateTime, Utc};
use skillhub_db::Database;
use skillhub_db::models::Authored;
use skillhub_types::api::{CreateUpdatePostRequest, PostResponse};
use skillhub_types::models::{UserPost, new_id};
use tracing::info;

use super::{ensure_user_exists, require_user};
use crate::error::{ApiError, ApiResult};

fn to_response(p: &Authored<UserPost>) -> PostResponse {
    PostResponse::from_post(&p.record, &p.author)
}

fn require_authored_post(db: &Database, id: &str) -> ApiResult<Authored<UserPost>> {
    db.get_post_with_author(id)?
        .ok_or_else(|| ApiError::not_found("Post", id))
}

pub fn create_post(
    db: &Database,
    user_id: &str,
    req: CreateUpdatePostRequest,
    now: DateTime<Utc>,
) -> ApiResult<PostResponse> {
    let author = require_user(db, user_id)?;
    let post = UserPost {
        id: new_id(),
        posted_by: author.id.clone(),
        posted_at: now,
        title: req.title,
        description: req.description,
        medias: req.medias,
    };
    db.insert_post(&post)?;
    info!("Post {} created by {}", post.id, author.username);
    Ok(PostResponse::from_post(&post, &author))
}

pub fn update_post(db: &Database, post_id: &str, req: CreateUpdatePostRequest) -> ApiResult<PostResponse> {
    let mut post = require_authored_post(db, post_id)?;
    post.record.title = req.title;
    post.record.description = req.description;
    post.record.medias = req.medias;
    db.update_post(&post.record)?;
    Ok(to_response(&post))
}

pub fn delete_post(db: &Database, post_id: &str) -> ApiResult<()> {
    if !db.delete_post(post_id)? {
        return Err(ApiError::not_found("Post", post_id));
    }
    info!("Post {} deleted", post_id);
    Ok(())
}

pub fn get_post(db: &Database, post_id: &str) -> ApiResult<PostResponse> {
    Ok(to_response(&require_authored_post(db, post_id)?))
}

pub fn list_posts(db: &Database) -> ApiResult<Vec<PostResponse>> {
    Ok(db.list_posts()?.iter().map(to_response).collect())
}

pub fn list_user_posts(db: &Database, user_id: &str) -> ApiResult<Vec<PostResponse>> {
    ensure_user_exists(db, user_id)?;
    Ok(db.list_posts_by_user(user_id)?.iter().map(to_response).collect())
}

#[cfg(test)]
mod tests {
    use skillhub_types::models::Media;

    use super::*;
    use crate::service::test_support::{db, user};

    #[test]
    fn create_then_replace_content() {
        let db = db();
        let ada = user(&db, "ada");
        let created = create_post(
            &db,
            &ada.id,
            CreateUpdatePostRequest {
                title: "Pasta".into(),
                description: String::new(),
                medias: vec![],
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(created.posted_by.username, "ada");

        let updated = update_post(
            &db,
            &created.id,
            CreateUpdatePostRequest {
                title: "Fresh pasta".into(),
                description: "Egg dough".into(),
                medias: vec![Media {
                    url: "https://example.com/p.jpg".into(),
                    media_type: "image".into(),
                }],
            },
        )
        .unwrap();
        assert_eq!(updated.title, "Fresh pasta");
        assert_eq!(updated.posted_at, created.posted_at);
        assert_eq!(get_post(&db, &created.id).unwrap().medias.len(), 1);
    }

    #[test]
    fn unknown_author_or_post_is_not_found() {
        let db = db();
        let req = || CreateUpdatePostRequest {
            title: "x".into(),
            description: String::new(),
            medias: vec![],
        };
        assert!(matches!(create_post(&db, "ghost", req(), Utc::now()), Err(ApiError::NotFound(_))));
        assert!(matches!(update_post(&db, "ghost", req()), Err(ApiError::NotFound(_))));
        assert!(matches!(delete_post(&db, "ghost"), Err(ApiError::NotFound(_))));
        assert!(matches!(list_user_posts(&db, "ghost"), Err(ApiError::NotFound(_))));
    }
}
