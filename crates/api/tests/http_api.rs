mod common;

use std::time::Duration;

use axum::{Router, routing::get};
use chrono::Duration as ChronoDuration;
use reqwest::StatusCode;
use serde_json::{Value, json};

use fastblog_apiserver::app::with_common_layers;
use fastblog_apiserver::pb::v1::{CreateUserRequest, ListUserRequest};
use fastblog_core::{Errorx, RequestContext};

use common::{JWT_KEY, PASSWORD, TestServer, mint_jwt, new_user, register};

async fn envelope(res: reqwest::Response) -> (StatusCode, String, String) {
    let status = res.status();
    let body: Value = res.json().await.unwrap();
    (
        status,
        body["reason"].as_str().unwrap_or_default().to_string(),
        body["message"].as_str().unwrap_or_default().to_string(),
    )
}

#[tokio::test]
async fn healthz_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/healthz")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn unknown_route_is_page_not_found() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/v1/nothing-here")).await.unwrap();

    let (status, reason, message) = envelope(res).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reason, "NotFound");
    assert_eq!(message, "Page not found");
}

#[tokio::test]
async fn login_round_trip_and_get_self() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (user_id, token) = register(&client, &srv.base_url, "colin").await;
    assert!(user_id.starts_with("user-"));

    let res = client
        .get(srv.url(&format!("/v1/users/{user_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["userID"], user_id.as_str());
    assert_eq!(body["user"]["username"], "colin");
    assert_eq!(body["user"]["postCount"], 0);
    assert!(body["user"].get("password").is_none());

    let res = client
        .post(srv.url("/refresh-token"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body["expireAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn login_failures_use_domain_reasons() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "colin").await;

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "username": "colin", "password": "Wrong-pass1" }))
        .send()
        .await
        .unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reason, "InvalidArgument.InvalidPassword");

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "username": "nobody", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reason, "NotFound.UserNotFound");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (user_id, _) = register(&client, &srv.base_url, "colin").await;

    let missing = client.get(srv.url("/v1/users?offset=0&limit=10")).send().await.unwrap();
    let expired = client
        .get(srv.url("/v1/users?offset=0&limit=10"))
        .bearer_auth(mint_jwt(&user_id, JWT_KEY, ChronoDuration::minutes(-1)))
        .send()
        .await
        .unwrap();
    let forged = client
        .get(srv.url("/v1/users?offset=0&limit=10"))
        .bearer_auth(mint_jwt(&user_id, "some-other-key", ChronoDuration::minutes(10)))
        .send()
        .await
        .unwrap();
    let malformed = client
        .get(srv.url("/v1/users?offset=0&limit=10"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();

    for res in [missing, expired, forged, malformed] {
        let (status, reason, message) = envelope(res).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(reason, "Unauthenticated.TokenInvalid");
        assert_eq!(message, "Invalid token");
    }

    // A freshly minted valid token passes the gate.
    let res = client
        .get(srv.url("/v1/users?offset=0&limit=10"))
        .bearer_auth(mint_jwt(&user_id, JWT_KEY, ChronoDuration::minutes(10)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn users_cannot_touch_each_other() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (_, token_a) = register(&client, &srv.base_url, "alice").await;
    let (user_b, token_b) = register(&client, &srv.base_url, "bobby").await;

    let res = client
        .get(srv.url(&format!("/v1/users/{user_b}")))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reason, "NotFound.UserNotFound");

    let res = client
        .put(srv.url(&format!("/v1/users/{user_b}")))
        .bearer_auth(&token_a)
        .json(&json!({ "nickname": "pwned" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(srv.url(&format!("/v1/users/{user_b}")))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // B's post is invisible to A.
    let res = client
        .post(srv.url("/v1/posts"))
        .bearer_auth(&token_b)
        .json(&json!({ "title": "mine", "content": "private" }))
        .send()
        .await
        .unwrap();
    let post_id = res.json::<Value>().await.unwrap()["postID"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url(&format!("/v1/posts/{post_id}")))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reason, "NotFound.PostNotFound");

    // Deleting someone else's post is a no-op.
    let res = client
        .delete(srv.url("/v1/posts"))
        .bearer_auth(&token_a)
        .json(&json!({ "postIDs": [post_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .get(srv.url(&format!("/v1/posts/{post_id}")))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_post_changes_only_present_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (_, token) = register(&client, &srv.base_url, "colin").await;

    let res = client
        .post(srv.url("/v1/posts"))
        .bearer_auth(&token)
        .json(&json!({ "title": "first", "content": "original body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let post_id = res.json::<Value>().await.unwrap()["postID"].as_str().unwrap().to_string();
    assert!(post_id.starts_with("post-"));

    let res = client
        .put(srv.url(&format!("/v1/posts/{post_id}")))
        .bearer_auth(&token)
        .json(&json!({ "title": "renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = client
        .get(srv.url(&format!("/v1/posts/{post_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["post"]["title"], "renamed");
    assert_eq!(body["post"]["content"], "original body");
}

#[tokio::test]
async fn list_users_pages_with_total_and_post_counts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut token = String::new();
    for name in ["user_a", "user_b", "user_c", "user_d", "user_e"] {
        token = register(&client, &srv.base_url, name).await.1;
    }
    for title in ["one", "two"] {
        let res = client
            .post(srv.url("/v1/posts"))
            .bearer_auth(&token)
            .json(&json!({ "title": title, "content": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let body: Value = client
        .get(srv.url("/v1/users?offset=0&limit=2"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 5);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    // Newest first; the last registered user owns both posts.
    assert_eq!(users[0]["username"], "user_e");
    assert_eq!(users[0]["postCount"], 2);
    assert_eq!(users[1]["username"], "user_d");
    assert_eq!(users[1]["postCount"], 0);
}

#[tokio::test]
async fn list_posts_filters_by_title() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (_, token) = register(&client, &srv.base_url, "colin").await;

    for title in ["rust tips", "go tips", "rust macros"] {
        client
            .post(srv.url("/v1/posts"))
            .bearer_auth(&token)
            .json(&json!({ "title": title, "content": "x" }))
            .send()
            .await
            .unwrap();
    }

    let body: Value = client
        .get(srv.url("/v1/posts?offset=0&limit=10&title=rust"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["posts"][0]["title"], "rust macros");
}

#[tokio::test]
async fn bind_and_validation_errors_are_400() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/v1/users"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reason, "BindError");

    let mut body = new_user("ab");
    let res = client.post(srv.url("/v1/users")).json(&body).send().await.unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reason, "InvalidArgument.InvalidUsername");

    body = new_user("colin");
    body["email"] = json!("not-an-email");
    let res = client.post(srv.url("/v1/users")).json(&body).send().await.unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reason, "InvalidArgument");

    let (_, token) = register(&client, &srv.base_url, "colin").await;
    let res = client
        .get(srv.url("/v1/users?offset=0&limit=0"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reason, "InvalidArgument");
}

#[tokio::test]
async fn duplicate_username_already_exists() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "colin").await;

    let res = client.post(srv.url("/v1/users")).json(&new_user("colin")).send().await.unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reason, "AlreadyExists.UserAlreadyExists");
}

#[tokio::test]
async fn change_password_then_login_with_new_one() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (user_id, token) = register(&client, &srv.base_url, "colin").await;

    let res = client
        .put(srv.url(&format!("/v1/users/{user_id}/change-password")))
        .bearer_auth(&token)
        .json(&json!({ "oldPassword": "Wrong-pass1", "newPassword": "N3w-Passw0rd" }))
        .send()
        .await
        .unwrap();
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reason, "InvalidArgument.InvalidPassword");

    let res = client
        .put(srv.url(&format!("/v1/users/{user_id}/change-password")))
        .bearer_auth(&token)
        .json(&json!({ "oldPassword": PASSWORD, "newPassword": "N3w-Passw0rd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "username": "colin", "password": "N3w-Passw0rd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_removes_their_posts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (user_id, token) = register(&client, &srv.base_url, "colin").await;
    let (_, other) = register(&client, &srv.base_url, "other_user").await;

    client
        .post(srv.url("/v1/posts"))
        .bearer_auth(&token)
        .json(&json!({ "title": "bye", "content": "x" }))
        .send()
        .await
        .unwrap();

    let res = client
        .delete(srv.url(&format!("/v1/users/{user_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = client
        .get(srv.url("/v1/posts?offset=0&limit=10"))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 0);

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "username": "colin", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn middleware_headers_are_applied() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/healthz"))
        .header("X-Request-ID", "req-abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-abc");
    assert_eq!(res.headers()["cache-control"], "no-cache, no-store, max-age=0, must-revalidate");

    let res = client.get(srv.url("/healthz")).send().await.unwrap();
    assert!(!res.headers()["x-request-id"].is_empty());

    let res = client
        .request(reqwest::Method::OPTIONS, srv.url("/v1/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

/// Serve `router` on an ephemeral port; returns the base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

#[tokio::test]
async fn handler_panic_is_internal_error_for_that_request_only() {
    let router = Router::new()
        .route("/boom", get(|| async { panic!("kaboom") as &'static str }))
        .route("/fine", get(|| async { "fine" }));
    let base = serve(with_common_layers(router, Duration::from_secs(30))).await;

    let res = reqwest::get(format!("{base}/boom")).await.unwrap();
    let (status, reason, message) = envelope(res).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reason, "InternalError");
    assert_eq!(message, "Internal server error");

    let res = reqwest::get(format!("{base}/fine")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "fine");
}

#[tokio::test]
async fn slow_handler_times_out_with_envelope() {
    let router = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "late"
        }),
    );
    let base = serve(with_common_layers(router, Duration::from_millis(100))).await;

    let res = reqwest::Client::new()
        .get(format!("{base}/slow"))
        .header("x-request-id", "req-slow")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-slow");
    assert_eq!(res.headers()["content-type"], "application/json");
    let (status, reason, _) = envelope(res).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(reason, "RequestTimeout");
}

#[tokio::test]
async fn user_list_fails_whole_when_a_post_count_fails() {
    let (biz, _) = common::deps().await;
    let ctx = RequestContext::new("list-abort");
    for name in ["anna_1", "anna_2", "anna_3"] {
        let rq: CreateUserRequest = serde_json::from_value(new_user(name)).unwrap();
        biz.user().create(&ctx, rq).await.unwrap();
    }

    let listed = biz
        .user()
        .list(&ctx, ListUserRequest { offset: 0, limit: 10 })
        .await
        .unwrap();
    assert_eq!(listed.users.len(), 3);

    sqlx::query("DROP TABLE post").execute(biz.store().pool()).await.unwrap();

    let err = biz
        .user()
        .list(&ctx, ListUserRequest { offset: 0, limit: 10 })
        .await
        .unwrap_err();
    assert_eq!(err, Errorx::DB_READ);
}
