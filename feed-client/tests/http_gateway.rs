use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use feed_client::{Comment, FeedGateway, HttpGateway, NetworkError, Post, User};
use serde_json::{Value, json};
use tokio::net::TcpListener;

type Received = Arc<Mutex<Vec<Value>>>;

async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub listener must bind");
    let addr = listener.local_addr().expect("stub must have local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });
    format!("http://{addr}")
}

fn feed_router(received: Received) -> Router {
    Router::new()
        .route(
            "/api/posts",
            get(|| async {
                Json(json!({
                    "posts": [
                        {"id": "1", "title": "first", "username": "alice", "userAvatar": "",
                         "content": "hello", "createdAt": 100, "images": []},
                        {"id": "2", "title": "second", "username": "bob",
                         "content": "world", "createdAt": 200}
                    ]
                }))
            })
            .post(
                |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().expect("received mutex poisoned").push(body);
                    (StatusCode::CREATED, Json(json!({"id": "srv-42", "ok": true})))
                },
            ),
        )
        .route(
            "/api/comments",
            get(|| async { Json(json!({})) }).post(
                |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().expect("received mutex poisoned").push(body);
                    (StatusCode::CREATED, "stored")
                },
            ),
        )
        .with_state(received)
}

#[tokio::test]
async fn fetch_posts_decodes_posts_field() {
    let base_url = spawn_stub(feed_router(Received::default())).await;
    let gateway = HttpGateway::new(base_url).expect("gateway must build");

    let posts = gateway.fetch_posts().await.expect("fetch_posts must succeed");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "1");
    assert_eq!(posts[1].username, "bob");
    assert_eq!(posts[1].user_avatar, "");
    assert!(posts[1].images.is_empty());
}

#[tokio::test]
async fn fetch_feed_accepts_numeric_ids() {
    let app = Router::new()
        .route(
            "/api/posts",
            get(|| async {
                Json(json!({
                    "posts": [{"id": 17, "title": "t", "username": "u",
                               "content": "c", "createdAt": 1}]
                }))
            }),
        )
        .route(
            "/api/comments",
            get(|| async {
                Json(json!({
                    "comments": [{"postId": 17, "username": "v",
                                  "content": "hi", "createdAt": 2}]
                }))
            }),
        );
    let base_url = spawn_stub(app).await;
    let gateway = HttpGateway::new(base_url).expect("gateway must build");

    let posts = gateway.fetch_posts().await.expect("fetch_posts must succeed");
    let comments = gateway
        .fetch_comments()
        .await
        .expect("fetch_comments must succeed");
    assert_eq!(posts[0].id, "17");
    assert_eq!(comments[0].post_id, "17");
}

#[tokio::test]
async fn fetch_comments_without_field_is_empty() {
    let base_url = spawn_stub(feed_router(Received::default())).await;
    let gateway = HttpGateway::new(base_url).expect("gateway must build");

    let comments = gateway
        .fetch_comments()
        .await
        .expect("fetch_comments must succeed");
    assert!(comments.is_empty());
}

#[tokio::test]
async fn create_post_sends_payload_without_id_and_returns_server_id() {
    let received = Received::default();
    let base_url = spawn_stub(feed_router(received.clone())).await;
    let gateway = HttpGateway::new(format!("{base_url}/")).expect("gateway must build");

    let author = User::new("alice", "");
    let post = Post::draft("title", "body", &author, vec!["data:image/png;base64,AA==".into()]);

    let id = gateway
        .create_post(&post)
        .await
        .expect("create_post must succeed");
    assert_eq!(id, "srv-42");

    let bodies = received.lock().expect("received mutex poisoned").clone();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].get("id").is_none());
    assert!(bodies[0].get("comments").is_none());
    assert_eq!(bodies[0]["title"], "title");
    assert_eq!(bodies[0]["username"], "alice");
    assert_eq!(bodies[0]["createdAt"], post.created_at);
}

#[tokio::test]
async fn create_comment_ignores_response_body() {
    let received = Received::default();
    let base_url = spawn_stub(feed_router(received.clone())).await;
    let gateway = HttpGateway::new(base_url).expect("gateway must build");

    let comment = Comment::draft("2", "nice", &User::new("bob", ""));
    gateway
        .create_comment(&comment)
        .await
        .expect("create_comment must succeed");

    let bodies = received.lock().expect("received mutex poisoned").clone();
    assert_eq!(bodies[0]["postId"], "2");
    assert_eq!(bodies[0]["content"], "nice");
}

#[tokio::test]
async fn create_post_without_id_in_response_is_decode_error() {
    let app = Router::new().route("/api/posts", axum::routing::post(|| async { Json(json!({})) }));
    let base_url = spawn_stub(app).await;
    let gateway = HttpGateway::new(base_url).expect("gateway must build");

    let post = Post::draft("t", "c", &User::new("u", ""), Vec::new());
    let err = gateway.create_post(&post).await.expect_err("must fail");
    assert!(matches!(err, NetworkError::Decode(_)));
}

#[tokio::test]
async fn non_success_status_is_network_error() {
    let app = Router::new().route(
        "/api/posts",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base_url = spawn_stub(app).await;
    let gateway = HttpGateway::new(base_url).expect("gateway must build");

    let err = gateway.fetch_posts().await.expect_err("must fail");
    assert_eq!(
        err,
        NetworkError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    );
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener must bind");
    let addr = listener.local_addr().expect("listener must have local addr");
    drop(listener);

    let gateway = HttpGateway::new(format!("http://{addr}")).expect("gateway must build");
    let err = gateway.fetch_comments().await.expect_err("must fail");
    assert!(matches!(err, NetworkError::Transport(_)));
}
