//! End-to-end behaviour of every route, against a seeded in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::{Value, json};

use tweetstack::auth::{Authenticator, Identity};
use tweetstack::model::UserTweetInteraction;
use tweetstack::store::{Filter, MemoryStore, Row, Select, Store, StoreError};
use tweetstack::{AppState, Response, Router, router};

const CHIP: &str = "Tech company unveils new AI chip to speed up machine learning.";

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// Users 1..=10. Tweets 1..=25: 1..=15 by users 1..=9, 16..=25 by user 10,
/// `created_at` increasing with id. Three comments on tweet 1, one on tweet 2.
async fn seeded() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    store.seed("users", (1..=10).map(|id| row(json!({
        "id": id,
        "username": format!("user{id}"),
        "bio": "",
    })))).await;

    store.seed("tweets", (1..=25).map(|id: i64| {
        let user_id = if id <= 15 { (id - 1) % 9 + 1 } else { 10 };
        let body = if id == 1 { CHIP.to_owned() } else { format!("tweet {id}") };
        row(json!({
            "id": id,
            "user_id": user_id,
            "body": body,
            "created_at": format!("2024-01-01T00:00:{id:02}.000000Z"),
        }))
    })).await;

    store.seed("comments", [
        (1, 2, 1), (2, 3, 1), (3, 4, 1), (4, 5, 2),
    ].map(|(id, user_id, tweet_id)| row(json!({
        "id": id,
        "user_id": user_id,
        "tweet_id": tweet_id,
        "body": format!("comment {id}"),
        "created_at": format!("2024-02-01T00:00:{id:02}.000000Z"),
    })))).await;

    store
}

async fn app() -> (Router<AppState>, Arc<MemoryStore>) {
    let store = seeded().await;
    (router(AppState::new(store.clone())), store)
}

async fn call(
    app: &Router<AppState>,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> Response {
    let mut req = http::Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        req = req.header(*name, *value);
    }
    app.handle(req.body(Bytes::from(body.to_owned())).unwrap()).await
}

fn json_body(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap_or_else(|e| panic!("{e}: {}", res.body_str()))
}

async fn interactions(store: &MemoryStore) -> Vec<UserTweetInteraction> {
    store.rows("user_tweet_interactions").await
        .into_iter()
        .map(|r| serde_json::from_value(Value::Object(r)).unwrap())
        .collect()
}

// ── Feeds ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn home_returns_ten_newest_first() {
    let (app, _) = app().await;
    let res = call(&app, Method::GET, "/home", &[], "").await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/json"));
    let tweets = json_body(&res);
    let ids: Vec<i64> = tweets.as_array().unwrap().iter().map(|t| t["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, (16..=25).rev().collect::<Vec<_>>());
    assert_eq!(tweets[0]["users"]["username"], "user10");
}

#[tokio::test]
async fn home_on_empty_store_is_empty_array() {
    let app = router(AppState::new(Arc::new(MemoryStore::new())));
    let res = call(&app, Method::GET, "/home", &[], "").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body_str(), "[]");
}

#[tokio::test]
async fn user_feed_only_has_that_users_tweets() {
    let (app, _) = app().await;
    let res = call(&app, Method::GET, "/user/10", &[], "").await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let tweets = json_body(&res);
    let tweets = tweets.as_array().unwrap();
    assert_eq!(tweets.len(), 10);
    assert!(tweets.iter().all(|t| t["user_id"] == 10));

    let res = call(&app, Method::GET, "/user/1", &[], "").await;
    let tweets = json_body(&res);
    let ids: Vec<i64> = tweets.as_array().unwrap().iter().map(|t| t["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![10, 1]);
}

#[tokio::test]
async fn user_feed_rejects_non_numeric_id() {
    let (app, _) = app().await;
    let res = call(&app, Method::GET, "/user/bob", &[], "").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body_str(), "invalid user id");
}

// ── Tweet reads ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn tweet_one_matches_fixture() {
    let (app, _) = app().await;
    let res = call(&app, Method::GET, "/tweet/1", &[], "").await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let tweet = json_body(&res);
    assert_eq!(tweet["id"], 1);
    assert_eq!(tweet["user_id"], 1);
    assert_eq!(tweet["body"], CHIP);
    assert_eq!(tweet["users"]["id"], 1);
}

#[tokio::test]
async fn missing_tweet_is_internal_error() {
    let (app, _) = app().await;
    let res = call(&app, Method::GET, "/tweet/999", &[], "").await;

    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.body_str().contains("multiple (or no) rows"));
}

#[tokio::test]
async fn comments_are_newest_first_with_authors() {
    let (app, _) = app().await;
    let res = call(&app, Method::GET, "/tweet/1/comments", &[], "").await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let comments = json_body(&res);
    let comments = comments.as_array().unwrap();
    let ids: Vec<i64> = comments.iter().map(|c| c["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert!(comments.iter().all(|c| c["tweet_id"] == 1));
    assert_eq!(comments[0]["users"]["id"], 4);

    let res = call(&app, Method::GET, "/tweet/7/comments", &[], "").await;
    assert_eq!(res.body_str(), "[]");
}

// ── Content creation ────────────────────────────────────────────────────────

#[tokio::test]
async fn create_tweet_echoes_row_and_tops_the_feed() {
    let (app, _) = app().await;
    let res = call(&app, Method::POST, "/tweet", &[("Authorization", "3")], r#"{"body":"hello"}"#).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let tweet = json_body(&res);
    assert_eq!(tweet["id"], 26);
    assert_eq!(tweet["user_id"], 3);
    assert_eq!(tweet["body"], "hello");
    assert!(tweet["created_at"].is_string());

    let home = json_body(&call(&app, Method::GET, "/home", &[], "").await);
    assert_eq!(home[0]["id"], 26);
}

#[tokio::test]
async fn create_comment_requires_parent_header() {
    let (app, _) = app().await;
    let body = r#"{"body":"hi","is_comment":true}"#;

    let res = call(&app, Method::POST, "/tweet", &[("Authorization", "1")], body).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body_str(), "missing parent tweet id");

    let headers = [("Authorization", "1"), ("Parent-Tweet-ID", "forty")];
    let res = call(&app, Method::POST, "/tweet", &headers, body).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body_str(), "invalid parent tweet id");
}

#[tokio::test]
async fn create_comment_validates_author() {
    let (app, store) = app().await;
    let headers = [("Authorization", "999"), ("Parent-Tweet-ID", "42")];
    let res = call(&app, Method::POST, "/tweet", &headers, r#"{"body":"hi","is_comment":true}"#).await;

    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.rows("comments").await.len(), 4);
}

#[tokio::test]
async fn create_comment_success() {
    let (app, store) = app().await;
    let headers = [("Authorization", "1"), ("Parent-Tweet-ID", "42")];
    let res = call(&app, Method::POST, "/tweet", &headers, r#"{"body":"hi","is_comment":true}"#).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let comment = json_body(&res);
    assert_eq!(comment["tweet_id"], 42);
    assert_eq!(comment["user_id"], 1);
    assert_eq!(comment["id"], 5);
    assert_eq!(store.rows("comments").await.len(), 5);
}

#[tokio::test]
async fn create_requires_numeric_identity() {
    let (app, _) = app().await;
    let body = r#"{"body":"hi"}"#;

    let res = call(&app, Method::POST, "/tweet", &[], body).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.body_str(), "missing authorization");

    let res = call(&app, Method::POST, "/tweet", &[("Authorization", "alice")], body).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.body_str(), "invalid authorization");

    // Identity is checked before the body.
    let res = call(&app, Method::POST, "/tweet", &[], "{oops").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = call(&app, Method::POST, "/tweet", &[("Authorization", "1")], "{oops").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

// ── Profile ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bio_update_needs_no_identity() {
    let (app, store) = app().await;
    let res = call(&app, Method::POST, "/user/3/bio", &[], r#"{"bio":"rustacean"}"#).await;

    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert!(res.body().is_empty());
    let users = store.rows("users").await;
    assert_eq!(users[2]["bio"], "rustacean");
    assert_eq!(users[3]["bio"], "");
}

#[tokio::test]
async fn bio_update_validates_input() {
    let (app, _) = app().await;

    let res = call(&app, Method::POST, "/user/3/bio", &[], "not json").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = call(&app, Method::POST, "/user/x/bio", &[], r#"{"bio":"a"}"#).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    // Unknown user: nothing to update, still a success.
    let res = call(&app, Method::POST, "/user/404/bio", &[], r#"{"bio":"a"}"#).await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
}

// ── Interactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn like_remove_then_set_leaves_flag_set() {
    let (app, store) = app().await;
    let headers = [("Authorization", "1"), ("Is-Comment", "false")];

    let res = call(&app, Method::PUT, "/like/1/10?remove=true", &headers, "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert!(interactions(&store).await.is_empty());

    let res = call(&app, Method::PUT, "/like/1/10", &headers, "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = call(&app, Method::PUT, "/like/1/10", &headers, "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let rows = interactions(&store).await;
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].user_id, rows[0].tweet_id, rows[0].comment_id), (1, Some(10), None));
    assert!(rows[0].is_liked);
}

#[tokio::test]
async fn unlike_clears_flag_without_deleting() {
    let (app, store) = app().await;
    let headers = [("Authorization", "2"), ("Is-Comment", "TRUE")];

    call(&app, Method::PUT, "/like/2/3", &headers, "").await;
    let res = call(&app, Method::PUT, "/like/2/3?remove=True", &headers, "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let rows = interactions(&store).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].comment_id, Some(3));
    assert_eq!(rows[0].tweet_id, None);
    assert!(!rows[0].is_liked);
}

#[tokio::test]
async fn like_requires_is_comment_header() {
    let (app, _) = app().await;
    let res = call(&app, Method::PUT, "/like/1/10", &[("Authorization", "1")], "").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body_str(), "missing Is-Comment header");
}

#[tokio::test]
async fn save_and_unsave() {
    let (app, store) = app().await;
    let auth = [("Authorization", "1")];

    let res = call(&app, Method::PUT, "/save/1/10", &auth, "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert!(interactions(&store).await[0].is_saved);

    let res = call(&app, Method::PUT, "/save/1/10?remove=true", &auth, "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    let rows = interactions(&store).await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_saved);
}

#[tokio::test]
async fn like_save_and_restack_share_one_row() {
    let (app, store) = app().await;
    let auth = [("Authorization", "4"), ("Is-Comment", "false")];

    call(&app, Method::PUT, "/like/4/8", &auth, "").await;
    call(&app, Method::PUT, "/save/4/8", &auth, "").await;
    call(&app, Method::PUT, "/restack/4/8", &auth, "").await;

    let rows = interactions(&store).await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_liked && rows[0].is_saved && rows[0].is_restacked);
}

#[tokio::test]
async fn restack_has_no_remove() {
    let (app, store) = app().await;
    let res = call(&app, Method::PUT, "/restack/1/10?remove=true", &[("Authorization", "1")], "").await;

    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert!(interactions(&store).await[0].is_restacked);
}

#[tokio::test]
async fn follow_is_idempotent() {
    let (app, store) = app().await;
    for _ in 0..2 {
        let res = call(&app, Method::PUT, "/follow/1/3", &[("Authorization", "1")], "").await;
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    }

    let edges = store.rows("user_following").await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["user_id"], 1);
    assert_eq!(edges[0]["following_user_id"], 3);
}

#[tokio::test]
async fn identity_mismatch_is_always_unauthorized() {
    let (app, store) = app().await;
    let uris = ["/like/2/10", "/save/2/10", "/restack/2/10", "/follow/2/3", "/like/2/x"];

    for uri in uris {
        // Wrong identity, and no Is-Comment header: still 401.
        let res = call(&app, Method::PUT, uri, &[("Authorization", "1")], "").await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED, "{uri}");

        let res = call(&app, Method::PUT, uri, &[], "").await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    assert!(interactions(&store).await.is_empty());
    assert!(store.rows("user_following").await.is_empty());
}

#[tokio::test]
async fn non_numeric_segments_are_bad_requests() {
    let (app, _) = app().await;
    let headers = [("Authorization", "1"), ("Is-Comment", "false")];

    let res = call(&app, Method::PUT, "/like/1/ten", &headers, "").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body_str(), "invalid target id");

    let res = call(&app, Method::PUT, "/save/1/ten", &headers, "").await;
    assert_eq!(res.body_str(), "invalid tweet id");

    let res = call(&app, Method::PUT, "/follow/1/ten", &headers, "").await;
    assert_eq!(res.body_str(), "invalid follow id");

    // Identity matches the segment, but it is not a user id.
    let res = call(&app, Method::PUT, "/restack/abc/1", &[("Authorization", "abc")], "").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body_str(), "invalid user id");
}

// ── Routing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_shapes_are_not_found() {
    let (app, _) = app().await;
    let auth = [("Authorization", "1"), ("Is-Comment", "false")];
    let cases = [
        (Method::PUT, "/like/1"),
        (Method::PUT, "/like/1/2/3"),
        (Method::GET, "/like/1/2"),
        (Method::POST, "/home"),
        (Method::DELETE, "/tweet/1"),
        (Method::GET, "/tweet/1/likes"),
        (Method::GET, "/tweet"),
        (Method::GET, "/user/1/bio"),
        (Method::GET, "/"),
        (Method::GET, "/nope"),
    ];

    for (method, uri) in cases {
        let res = call(&app, method.clone(), uri, &auth, "").await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{method} {uri}");
        assert!(res.body().is_empty());
    }
}

#[tokio::test]
async fn slashes_are_normalized() {
    let (app, _) = app().await;
    assert_eq!(call(&app, Method::GET, "/home/", &[], "").await.status_code(), StatusCode::OK);
    assert_eq!(call(&app, Method::GET, "/tweet//1/", &[], "").await.status_code(), StatusCode::OK);

    let res = call(&app, Method::PUT, "/follow/1//3/", &[("Authorization", "1")], "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn encoded_segments_are_decoded_before_authorizing() {
    let (app, store) = app().await;
    let res = call(&app, Method::PUT, "/follow/%31/2", &[("Authorization", "1")], "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let edges = store.rows("user_following").await;
    assert_eq!(edges[0]["user_id"], 1);
    assert_eq!(edges[0]["following_user_id"], 2);

    let res = call(&app, Method::GET, "/tweet/%31", &[], "").await;
    assert_eq!(json_body(&res)["id"], 1);
}

#[tokio::test]
async fn probes() {
    let (app, _) = app().await;
    let res = call(&app, Method::GET, "/healthz", &[], "").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body_str(), "ok");

    let res = call(&app, Method::GET, "/readyz", &[], "").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body_str(), "ready");
}

// ── Store failures ──────────────────────────────────────────────────────────

struct DownStore;

#[async_trait]
impl Store for DownStore {
    async fn select(&self, _: &Select) -> Result<Vec<Row>, StoreError> {
        Err(StoreError::Upstream { status: 503, message: "store unavailable".into() })
    }

    async fn insert(&self, _: &'static str, _: Row, _: Option<&[&str]>) -> Result<Row, StoreError> {
        Err(StoreError::Upstream { status: 503, message: "store unavailable".into() })
    }

    async fn update(&self, _: &'static str, _: Row, _: &[Filter]) -> Result<(), StoreError> {
        Err(StoreError::Upstream { status: 503, message: "store unavailable".into() })
    }
}

#[tokio::test]
async fn store_failures_surface_as_500_with_text() {
    let app = router(AppState::new(Arc::new(DownStore)));
    let auth = [("Authorization", "1"), ("Is-Comment", "false")];

    for (method, uri) in [
        (Method::GET, "/home"),
        (Method::GET, "/user/1"),
        (Method::GET, "/tweet/1"),
        (Method::GET, "/tweet/1/comments"),
        (Method::PUT, "/like/1/2"),
        (Method::PUT, "/save/1/2?remove=true"),
        (Method::PUT, "/restack/1/2"),
        (Method::PUT, "/follow/1/2"),
    ] {
        let res = call(&app, method.clone(), uri, &auth, "").await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(res.body_str(), "store unavailable");
    }

    let res = call(&app, Method::POST, "/tweet", &auth, r#"{"body":"x"}"#).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = call(&app, Method::GET, "/readyz", &[], "").await;
    assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn failed_author_lookup_is_unauthorized() {
    let app = router(AppState::new(Arc::new(DownStore)));
    let headers = [("Authorization", "1"), ("Parent-Tweet-ID", "42")];
    let res = call(&app, Method::POST, "/tweet", &headers, r#"{"body":"x","is_comment":true}"#).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

// ── Pluggable identity ──────────────────────────────────────────────────────

/// `Authorization: Bearer <id>`.
struct BearerAuthenticator;

impl Authenticator for BearerAuthenticator {
    fn identify(&self, credential: Option<&str>) -> Option<Identity> {
        credential?.strip_prefix("Bearer ").map(Identity::new)
    }
}

#[tokio::test]
async fn authenticator_is_replaceable() {
    let store = seeded().await;
    let state = AppState::new(store.clone()).with_authenticator(Arc::new(BearerAuthenticator));
    let app = router(state);

    let res = call(&app, Method::PUT, "/follow/1/2", &[("Authorization", "1")], "").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = call(&app, Method::PUT, "/follow/1/2", &[("Authorization", "Bearer 1")], "").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = call(&app, Method::POST, "/tweet", &[("Authorization", "Bearer 5")], r#"{"body":"b"}"#).await;
    assert_eq!(json_body(&res)["user_id"], 5);
}
