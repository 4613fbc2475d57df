#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use fastblog_apiserver::biz::Biz;
use fastblog_auth::{PasswordHasher, TokenManager};
use fastblog_store::Store;
use fastblog_store::schema::sqlite_memory_pool;

pub const JWT_KEY: &str = "Rtg8BPKNEf2mB4mgvKONGPZZQSaJWNLijxR42qRgq0iBb5";
pub const PASSWORD: &str = "Passw0rd!";

/// Business services over a fresh in-memory database.
pub async fn deps() -> (Biz, Arc<TokenManager>) {
    let pool = sqlite_memory_pool().await.expect("in-memory sqlite");
    let tokens = Arc::new(TokenManager::new(JWT_KEY, Duration::from_secs(3600)));
    let biz = Biz::new(Store::new(pool), Arc::clone(&tokens)).with_hasher(PasswordHasher::with_cost(4));
    (biz, tokens)
}

pub struct TestServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// The production REST router on an ephemeral port.
    pub async fn spawn() -> Self {
        let (biz, tokens) = deps().await;
        let app = fastblog_apiserver::app::build_app(biz, tokens, Duration::from_secs(30));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A token signed with the server key but an arbitrary time window.
pub fn mint_jwt(user_id: &str, secret: &str, valid_for: ChronoDuration) -> String {
    let now = Utc::now();
    let exp = now + valid_for;
    let claims = json!({
        "x-user-id": user_id,
        "iat": (now - ChronoDuration::minutes(5)).timestamp(),
        "nbf": (now - ChronoDuration::minutes(5)).timestamp(),
        "exp": exp.timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

pub fn new_user(username: &str) -> Value {
    json!({
        "username": username,
        "password": PASSWORD,
        "nickname": "nick",
        "email": format!("{username}@example.com"),
        "phone": "18110000000",
    })
}

/// Register `username` and log in; returns `(user_id, token)`.
pub async fn register(client: &reqwest::Client, base_url: &str, username: &str) -> (String, String) {
    let res = client
        .post(format!("{base_url}/v1/users"))
        .json(&new_user(username))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK, "create {username}");
    let body: Value = res.json().await.unwrap();
    let user_id = body["userID"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{base_url}/login"))
        .json(&json!({ "username": username, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK, "login {username}");
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    (user_id, token)
}
