use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::sync::oneshot;

use skillhub_api::state::{ApiSettings, AppStateInner};
use skillhub_db::Database;

async fn start_server() -> (String, oneshot::Sender<()>) {
    let db = Database::open_in_memory().expect("in-memory db");
    let app = skillhub_api::router(AppStateInner::new(db, ApiSettings::default()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind server");
    let addr = listener.local_addr().expect("server addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move {
        let _ = server.await;
    });

    (format!("http://{}", addr), shutdown_tx)
}

async fn register(client: &Client, base: &str, username: &str) -> String {
    let res = client
        .post(format!("{}/api/users/register", base))
        .json(&json!({ "username": username, "email": format!("{}@example.com", username) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn create_post(client: &Client, base: &str, user_id: &str) -> String {
    let res = client
        .post(format!("{}/api/posts?userId={}", base, user_id))
        .json(&json!({ "title": "Sourdough", "description": "Day three starter" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn notifications_for(client: &Client, base: &str, user_id: &str) -> Vec<Value> {
    client
        .get(format!("{}/api/notifications/user/{}", base, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn toggle_like_creates_then_removes() {
    let (base, shutdown_tx) = start_server().await;
    let client = Client::new();
    let ada = register(&client, &base, "ada").await;
    let grace = register(&client, &base, "grace").await;
    let post = create_post(&client, &base, &ada).await;

    let toggle = || {
        client
            .post(format!("{}/api/likes/toggle", base))
            .header("User-ID", &grace)
            .json(&json!({ "postId": post }))
            .send()
    };

    let first = toggle().await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let like: Value = first.json().await.unwrap();
    assert_eq!(like["postId"], json!(post));
    assert_eq!(like["user"]["id"], json!(grace));

    let second = toggle().await.unwrap();
    assert_eq!(second.status(), StatusCode::NO_CONTENT);

    let count: Value = client
        .get(format!("{}/api/likes/count/{}", base, post))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"], json!(0));

    let notes = notifications_for(&client, &base, &ada).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["type"], json!("LIKE"));

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn missing_user_id_header_is_a_bad_request() {
    let (base, shutdown_tx) = start_server().await;
    let client = Client::new();

    let res = client
        .post(format!("{}/api/likes/toggle", base))
        .json(&json!({ "postId": "whatever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("User-ID"));

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn only_the_comment_author_can_edit() {
    let (base, shutdown_tx) = start_server().await;
    let client = Client::new();
    let ada = register(&client, &base, "ada").await;
    let grace = register(&client, &base, "grace").await;
    let post = create_post(&client, &base, &ada).await;

    let res = client
        .post(format!("{}/api/comments", base))
        .header("User-ID", &grace)
        .json(&json!({ "postId": post, "content": "Looks great" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let comment: Value = res.json().await.unwrap();
    let comment_id = comment["id"].as_str().unwrap();

    let res = client
        .put(format!("{}/api/comments/{}", base, comment_id))
        .header("User-ID", &ada)
        .json(&json!({ "content": "Edited by someone else" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(format!("{}/api/comments/{}", base, comment_id))
        .header("User-ID", &grace)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/api/comments/{}", base, comment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn follow_flow_and_notification_read_state() {
    let (base, shutdown_tx) = start_server().await;
    let client = Client::new();
    let ada = register(&client, &base, "ada").await;
    let grace = register(&client, &base, "grace").await;

    let follow = || {
        client
            .post(format!("{}/api/relationships/follow/{}/{}", base, grace, ada))
            .send()
    };
    assert_eq!(follow().await.unwrap().status(), StatusCode::OK);
    assert_eq!(follow().await.unwrap().status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/api/relationships/follow/{}/{}", base, ada, ada))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let following: bool = client
        .get(format!("{}/api/relationships/isFollowing/{}/{}", base, grace, ada))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(following);

    let notes = notifications_for(&client, &base, &ada).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["type"], json!("FOLLOW"));
    let note_id = notes[0]["id"].as_str().unwrap();

    let res = client
        .put(format!("{}/api/notifications/{}/mark-as-read?userId={}", base, note_id, grace))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let mark = || {
        client
            .put(format!("{}/api/notifications/{}/mark-as-read?userId={}", base, note_id, ada))
            .send()
    };
    let first: Value = mark().await.unwrap().json().await.unwrap();
    assert_eq!(first["read"], json!(true));
    assert!(first["readAt"].is_string());
    let again: Value = mark().await.unwrap().json().await.unwrap();
    assert_eq!(again["readAt"], first["readAt"]);

    let unread: Value = client
        .get(format!("{}/api/notifications/user/{}/unread/count", base, ada))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unread["count"], json!(0));

    let res = client
        .delete(format!("{}/api/relationships/unfollow/{}/{}", base, grace, ada))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn fork_makes_a_private_copy_and_counts() {
    let (base, shutdown_tx) = start_server().await;
    let client = Client::new();
    let ada = register(&client, &base, "ada").await;
    let grace = register(&client, &base, "grace").await;

    let res = client
        .post(format!("{}/api/learning-plans", base))
        .json(&json!({
            "ownerId": ada,
            "title": "Rust in a month",
            "isPublic": true,
            "learningUnits": [
                { "title": "Ownership", "estimatedHours": 4 },
                { "title": "Traits", "estimatedHours": 6 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let plan: Value = res.json().await.unwrap();
    let plan_id = plan["id"].as_str().unwrap();
    let unit_id = plan["learningUnits"][0]["unitId"].as_str().unwrap();

    let done: Value = client
        .post(format!("{}/api/learning-plans/{}/complete-unit/{}", base, plan_id, unit_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(done["completedHours"], json!(4));
    assert_eq!(done["completionPercentage"], json!(50.0));

    let res = client
        .post(format!("{}/api/learning-plans/{}/fork?userId={}", base, plan_id, grace))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let fork: Value = res.json().await.unwrap();
    assert_eq!(fork["owner"]["id"], json!(grace));
    assert_eq!(fork["isPublic"], json!(false));
    assert_eq!(fork["title"], json!("Fork of: Rust in a month"));

    let most_forked: Value = client
        .get(format!("{}/api/learning-plans/most-forked", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(most_forked["totalElements"], json!(1));
    assert_eq!(most_forked["content"][0]["forkCount"], json!(1));

    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn chat_round_trip() {
    let (base, shutdown_tx) = start_server().await;
    let client = Client::new();
    let ada = register(&client, &base, "ada").await;
    let grace = register(&client, &base, "grace").await;

    let convo: Value = client
        .post(format!("{}/api/chat/conversations", base))
        .json(&json!({ "participant1Id": ada, "participant2Id": grace }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let convo_id = convo["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/api/chat/messages", base))
        .json(&json!({
            "conversationId": convo_id,
            "senderId": ada,
            "recipientId": grace,
            "content": "lunch?"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let message: Value = res.json().await.unwrap();

    let unread: Vec<Value> = client
        .get(format!("{}/api/chat/messages/unread/{}", base, grace))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unread.len(), 1);

    let res = client
        .put(format!("{}/api/chat/messages/mark-read", base))
        .json(&json!([message["id"]]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/api/chat/conversations?user1Id={}&user2Id={}", base, grace, ada))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/api/chat/conversations?user1Id={}&user2Id=nobody", base, ada))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    shutdown_tx.send(()).ok();
}
