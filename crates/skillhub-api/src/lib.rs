//! HTTP surface of skillhub: axum handlers per resource on top of the
//! synchronous `service` layer.

pub mod chat;
pub mod comments;
pub mod error;
pub mod extract;
pub mod likes;
pub mod notifications;
pub mod plans;
pub mod posts;
pub mod progress;
pub mod relationships;
pub mod service;
pub mod state;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Every `/api/...` route with `state` attached. Cross-cutting layers
/// (tracing, CORS) are added by the server.
pub fn router(state: AppState) -> Router {
    let users_routes = Router::new()
        .route("/register", post(users::register))
        .route("/", get(users::list_users))
        .route(
            "/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        );

    let posts_routes = Router::new()
        .route("/", get(posts::list_posts).post(posts::create_post))
        .route(
            "/{post_id}",
            get(posts::get_post).put(posts::update_post).delete(posts::delete_post),
        )
        .route("/user/{user_id}", get(posts::list_user_posts));

    let likes_routes = Router::new()
        .route("/toggle", post(likes::toggle_like))
        .route("/{post_id}", delete(likes::unlike))
        .route("/post/{post_id}", get(likes::likes_for_post))
        .route("/user/{user_id}", get(likes::likes_by_user))
        .route("/summary/{post_id}", get(likes::summary))
        .route("/check/{post_id}", get(likes::check))
        .route("/count/{post_id}", get(likes::count));

    let comments_routes = Router::new()
        .route("/", post(comments::create_comment))
        .route(
            "/{id}",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/post/{post_id}", get(comments::comments_for_post))
        .route("/user/{user_id}", get(comments::comments_by_user))
        .route("/count/{post_id}", get(comments::count_for_post));

    let relationships_routes = Router::new()
        .route("/follow/{follower_id}/{following_id}", post(relationships::follow))
        .route("/unfollow/{follower_id}/{following_id}", delete(relationships::unfollow))
        .route("/following/{user_id}", get(relationships::following))
        .route("/followers/{user_id}", get(relationships::followers))
        .route("/isFollowing/{follower_id}/{following_id}", get(relationships::is_following))
        .route("/following/count/{user_id}", get(relationships::following_count))
        .route("/followers/count/{user_id}", get(relationships::followers_count));

    let plans_routes = Router::new()
        .route("/", post(plans::create_plan))
        .route("/public", get(plans::public_plans))
        .route("/search", get(plans::search_plans))
        .route("/by-tags", get(plans::plans_by_tags))
        .route("/popular", get(plans::popular_plans))
        .route("/most-forked", get(plans::most_forked_plans))
        .route("/count", get(plans::count_by_owner))
        .route("/owner/{owner_id}", get(plans::plans_by_owner))
        .route(
            "/{id}",
            get(plans::get_plan).put(plans::update_plan).delete(plans::delete_plan),
        )
        .route("/{id}/complete-unit/{unit_id}", post(plans::complete_unit))
        .route("/{id}/fork", post(plans::fork_plan));

    let progress_routes = Router::new()
        .route("/", get(progress::list_all).post(progress::create_update))
        .route("/public", get(progress::list_public))
        .route("/template", post(progress::create_from_template))
        .route("/user/{user_id}", get(progress::list_by_user))
        .route("/plan/{plan_id}", get(progress::list_by_plan))
        .route("/unit/{unit_id}", get(progress::list_by_unit))
        .route(
            "/{id}",
            get(progress::get_update)
                .put(progress::update_update)
                .delete(progress::delete_update),
        )
        .route("/{id}/like", post(progress::like_update))
        .route("/{id}/unlike", post(progress::unlike_update))
        .route("/{id}/view", post(progress::mark_viewed));

    let notifications_routes = Router::new()
        .route(
            "/user/{user_id}",
            get(notifications::list_for_user).delete(notifications::delete_all_for_user),
        )
        .route("/user/{user_id}/paginated", get(notifications::page_for_user))
        .route("/user/{user_id}/unread", get(notifications::unread_for_user))
        .route("/user/{user_id}/unread/count", get(notifications::unread_count))
        .route("/user/{user_id}/mark-all-as-read", put(notifications::mark_all_as_read))
        .route("/{id}/mark-as-read", put(notifications::mark_as_read))
        .route("/{id}", delete(notifications::delete));

    let chat_routes = Router::new()
        .route(
            "/conversations",
            get(chat::conversation_between).post(chat::open_conversation),
        )
        .route("/conversations/{user_id}", get(chat::conversations_for))
        .route("/messages", post(chat::send_message))
        .route("/messages/mark-read", put(chat::mark_read))
        .route(
            "/messages/{id}",
            put(chat::edit_message).delete(chat::delete_message),
        )
        .route(
            "/messages/conversation/{conversation_id}",
            get(chat::conversation_messages),
        )
        .route("/messages/unread/{user_id}", get(chat::unread_messages));

    Router::new()
        .nest("/api/users", users_routes)
        .nest("/api/posts", posts_routes)
        .nest("/api/likes", likes_routes)
        .nest("/api/comments", comments_routes)
        .nest("/api/relationships", relationships_routes)
        .nest("/api/learning-plans", plans_routes)
        .nest("/api/progress-updates", progress_routes)
        .nest("/api/notifications", notifications_routes)
        .nest("/api/chat", chat_routes)
        .with_state(state)
}
